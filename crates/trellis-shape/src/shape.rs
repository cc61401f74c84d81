//! Shape definitions.

use crate::{Param, ParamKind};
use serde::{Deserialize, Serialize};

/// Declaration of a message shape, prior to catalog registration.
///
/// Built with chained `with_*` methods and handed to
/// [`Catalog::register`](crate::Catalog::register), which validates the
/// parent link and interns the shape.
///
/// # Example
///
/// ```
/// use trellis_shape::{ParamKind, ShapeDef};
///
/// let physics = ShapeDef::new("PhysicsChanged").abstract_only();
///
/// let mass = ShapeDef::new("MassChanged")
///     .with_parent("PhysicsChanged")
///     .with_param("mass", ParamKind::Float);
///
/// assert!(physics.is_abstract);
/// assert_eq!(mass.parent.as_deref(), Some("PhysicsChanged"));
/// assert_eq!(mass.params.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeDef {
    /// Unique shape name; the subscription key.
    pub name: String,
    /// Parent shape name, if this shape specializes one.
    pub parent: Option<String>,
    /// Abstract shapes can only be inherited into, never sent.
    pub is_abstract: bool,
    /// Ordered parameter list.
    pub params: Vec<Param>,
}

impl ShapeDef {
    /// Creates a concrete, parentless, parameterless shape definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            is_abstract: false,
            params: Vec::new(),
        }
    }

    /// Sets the parent shape.
    ///
    /// The parent must already be registered when this definition reaches
    /// the catalog.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Appends a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(Param::new(name, kind));
        self
    }

    /// Marks the shape abstract: it anchors a hierarchy but is rejected as
    /// the shape of a `send`.
    #[must_use]
    pub fn abstract_only(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Number of parameters; the truncation arity for listeners of this
    /// shape.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
