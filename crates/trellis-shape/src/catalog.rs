//! The shape catalog.
//!
//! Shapes are registered once at startup and immutable afterward. The
//! catalog interns every shape behind a dense [`ShapeId`] and precomputes
//! its ancestor chain at registration, so the dispatch engine's hierarchy
//! walk is a plain array scan with no name lookups on the hot path.
//!
//! # Registration order
//!
//! A parent must be registered before its children. That single rule makes
//! cycles unrepresentable and lets the chain for a new shape be built by
//! extending its parent's already-final chain.

use crate::{CatalogError, Param, ShapeDef};
use std::collections::HashMap;

/// Dense catalog index of a registered shape.
///
/// Cheap to copy and compare; resolves back to the definition through the
/// owning [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(u32);

impl ShapeId {
    /// Returns the raw catalog index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

struct ShapeInfo {
    def: ShapeDef,
    /// `chain[0]` is the shape itself, followed by its parent, up to the
    /// root. Built once at registration.
    chain: Vec<ShapeId>,
}

/// Static catalog of message shapes and their parent links.
///
/// # Example
///
/// ```
/// use trellis_shape::{Catalog, ParamKind, ShapeDef};
///
/// let mut catalog = Catalog::new();
/// let physics = catalog
///     .register(ShapeDef::new("PhysicsChanged").abstract_only())
///     .unwrap();
/// let mass = catalog
///     .register(
///         ShapeDef::new("MassChanged")
///             .with_parent("PhysicsChanged")
///             .with_param("mass", ParamKind::Float),
///     )
///     .unwrap();
///
/// let chain: Vec<_> = catalog.ancestors(mass).collect();
/// assert_eq!(chain, vec![mass, physics]);
/// assert!(catalog.is_abstract(physics));
/// assert_eq!(catalog.arity(mass), 1);
/// ```
#[derive(Default)]
pub struct Catalog {
    infos: Vec<ShapeInfo>,
    by_name: HashMap<String, ShapeId>,
}

impl Catalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shape definition.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::Duplicate`] if the name is taken
    /// - [`CatalogError::UnknownParent`] if the named parent is not
    ///   registered yet
    /// - [`CatalogError::ParamMismatch`] if the parent's parameter list is
    ///   not a kind-compatible prefix of this shape's
    pub fn register(&mut self, def: ShapeDef) -> Result<ShapeId, CatalogError> {
        if self.by_name.contains_key(&def.name) {
            return Err(CatalogError::Duplicate {
                name: def.name.clone(),
            });
        }

        let parent_id = match &def.parent {
            None => None,
            Some(parent) => {
                let id = self.by_name.get(parent).copied().ok_or_else(|| {
                    CatalogError::UnknownParent {
                        shape: def.name.clone(),
                        parent: parent.clone(),
                    }
                })?;
                self.check_extension(&def, id)?;
                Some(id)
            }
        };

        let id = ShapeId(self.infos.len() as u32);
        let mut chain = Vec::with_capacity(1 + parent_id.map_or(0, |p| self.chain(p).len()));
        chain.push(id);
        if let Some(parent_id) = parent_id {
            chain.extend_from_slice(self.chain(parent_id));
        }

        self.by_name.insert(def.name.clone(), id);
        self.infos.push(ShapeInfo { def, chain });
        Ok(id)
    }

    /// Truncating a child argument list must always produce a valid parent
    /// argument list: parent arity <= child arity, kinds compatible
    /// pairwise over the parent's prefix.
    fn check_extension(&self, def: &ShapeDef, parent_id: ShapeId) -> Result<(), CatalogError> {
        let parent = &self.infos[parent_id.index()].def;
        let mismatch = |detail: String| CatalogError::ParamMismatch {
            shape: def.name.clone(),
            parent: parent.name.clone(),
            detail,
        };

        if parent.params.len() > def.params.len() {
            return Err(mismatch(format!(
                "parent takes {} parameters, child takes {}",
                parent.params.len(),
                def.params.len()
            )));
        }
        for (i, (p, c)) in parent.params.iter().zip(&def.params).enumerate() {
            if !p.kind.accepts(c.kind) {
                return Err(mismatch(format!(
                    "parameter {i} is {:?} in the parent but {:?} in the child",
                    p.kind, c.kind
                )));
            }
        }
        Ok(())
    }

    /// Resolves a shape name to its id.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ShapeId> {
        self.by_name.get(name).copied()
    }

    /// Returns the definition of a registered shape.
    #[must_use]
    pub fn def(&self, id: ShapeId) -> &ShapeDef {
        &self.infos[id.index()].def
    }

    /// Returns the shape's name.
    #[must_use]
    pub fn name(&self, id: ShapeId) -> &str {
        &self.def(id).name
    }

    /// Returns the shape's parameters.
    #[must_use]
    pub fn params(&self, id: ShapeId) -> &[Param] {
        &self.def(id).params
    }

    /// Returns the shape's parameter count — the truncation arity for its
    /// listeners.
    #[must_use]
    pub fn arity(&self, id: ShapeId) -> usize {
        self.def(id).arity()
    }

    /// Returns `true` if the shape was registered abstract.
    #[must_use]
    pub fn is_abstract(&self, id: ShapeId) -> bool {
        self.def(id).is_abstract
    }

    /// Iterates the shape's ancestor chain, most specific first, starting
    /// at the shape itself and ending at its root.
    ///
    /// Each call yields a fresh iterator; re-enumeration is always valid.
    #[must_use]
    pub fn ancestors(&self, id: ShapeId) -> Ancestors<'_> {
        Ancestors {
            inner: self.chain(id).iter(),
        }
    }

    fn chain(&self, id: ShapeId) -> &[ShapeId] {
        &self.infos[id.index()].chain
    }

    /// Number of registered shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Returns `true` if no shapes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }
}

/// Iterator over a shape's precomputed ancestor chain.
///
/// Returned by [`Catalog::ancestors`].
pub struct Ancestors<'a> {
    inner: std::slice::Iter<'a, ShapeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ShapeId;

    fn next(&mut self) -> Option<ShapeId> {
        self.inner.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Ancestors<'_> {}
