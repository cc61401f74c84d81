//! Topological relation between parts, and the declarative filter over it.
//!
//! When a message is dispatched, the engine asks the host how the sender's
//! part relates to each listener's part, then tests that [`Relation`]
//! against the listener's [`RelationMask`]. A listener for `CHILD | SIBLING`
//! only hears messages from its children and siblings.
//!
//! # Unknown relations
//!
//! The host answers [`Relation::Unknown`] when one side has no position in
//! the assembly (a detached tool, a UI panel). Only a blanket
//! [`RelationMask::ANY`] filter admits those — a listener that asked for
//! specific relations has asked for information the host cannot supply.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Relation of a message source's part to a listener's part, as resolved by
/// the host assembly.
///
/// Read as "the source is the listener's …": [`Relation::Parent`] means the
/// source part is the parent of the listener part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Source and listener live on the same part.
    Same,
    /// The source part is the listener part's parent.
    Parent,
    /// The source part is one of the listener part's children.
    Child,
    /// Source and listener parts share a parent.
    Sibling,
    /// No relation could be resolved (either side is outside the assembly).
    Unknown,
}

bitflags! {
    /// Declarative filter over [`Relation`], attached to a listener at
    /// registration.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_types::{Relation, RelationMask};
    ///
    /// let mask = RelationMask::SAME | RelationMask::CHILD;
    /// assert!(mask.permits(Relation::Same));
    /// assert!(mask.permits(Relation::Child));
    /// assert!(!mask.permits(Relation::Parent));
    /// assert!(!mask.permits(Relation::Unknown)); // only ANY admits Unknown
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RelationMask: u8 {
        /// Accept messages from the listener's own part.
        const SAME = 1 << 0;
        /// Accept messages from the listener part's parent.
        const PARENT = 1 << 1;
        /// Accept messages from the listener part's children.
        const CHILD = 1 << 2;
        /// Accept messages from the listener part's siblings.
        const SIBLING = 1 << 3;
        /// Accept everything, including unresolvable relations.
        const ANY = Self::SAME.bits()
            | Self::PARENT.bits()
            | Self::CHILD.bits()
            | Self::SIBLING.bits();
    }
}

impl RelationMask {
    /// Returns `true` if the mask admits the given relation.
    ///
    /// [`Relation::Unknown`] is admitted only by the full [`ANY`] mask.
    ///
    /// [`ANY`]: RelationMask::ANY
    #[must_use]
    pub fn permits(self, relation: Relation) -> bool {
        match relation {
            Relation::Same => self.contains(Self::SAME),
            Relation::Parent => self.contains(Self::PARENT),
            Relation::Child => self.contains(Self::CHILD),
            Relation::Sibling => self.contains(Self::SIBLING),
            Relation::Unknown => self == Self::ANY,
        }
    }
}

impl Default for RelationMask {
    /// Listeners default to hearing only their own part.
    fn default() -> Self {
        Self::SAME
    }
}
