//! The host topology seam.
//!
//! The bus does not own the assembly tree. Whenever dispatch needs to know
//! how two parts relate, or whether a listener's part is currently enabled,
//! it asks the host through this trait. Hosts implement it over whatever
//! structure they actually keep — a scene graph, an ECS, a plain map.

use trellis_types::{PartId, Relation};

/// Host-provided part topology and enablement.
///
/// # Example
///
/// ```
/// use trellis_bus::Topology;
/// use trellis_types::{PartId, Relation};
///
/// /// Fixed two-level assembly: one root, everything else its child.
/// struct Star {
///     root: PartId,
/// }
///
/// impl Topology for Star {
///     fn relation_of(&self, source: PartId, listener: PartId) -> Relation {
///         if source == listener {
///             Relation::Same
///         } else if source == self.root {
///             Relation::Parent
///         } else if listener == self.root {
///             Relation::Child
///         } else {
///             Relation::Sibling
///         }
///     }
/// }
/// ```
pub trait Topology {
    /// Resolves the relation of `source`'s part to `listener`'s part.
    ///
    /// Read as "the source is the listener's …". Return
    /// [`Relation::Unknown`] when either part has no position in the
    /// assembly.
    fn relation_of(&self, source: PartId, listener: PartId) -> Relation;

    /// Returns whether a listener's part is currently enabled.
    ///
    /// Disabled parts keep their registrations but are skipped during
    /// dispatch. Defaults to always-enabled.
    fn is_enabled(&self, part: PartId) -> bool {
        let _ = part;
        true
    }
}

/// Topology for hosts without an assembly: a part relates only to itself.
///
/// Every cross-part relation resolves to [`Relation::Unknown`], so only
/// blanket `RelationMask::ANY` listeners hear other parts.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatTopology;

impl Topology for FlatTopology {
    fn relation_of(&self, source: PartId, listener: PartId) -> Relation {
        if source == listener {
            Relation::Same
        } else {
            Relation::Unknown
        }
    }
}
