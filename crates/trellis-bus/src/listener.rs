//! The listener registry.
//!
//! Registrations are keyed by shape and kept in insertion order, which is
//! the delivery order within one shape. Targets are weakly held: the
//! registry never keeps a listener's object alive, and entries whose target
//! has been dropped are spliced out lazily, the first time a dispatch walk
//! passes them. There is no sweep pass; a bucket only shrinks when
//! dispatched through.

use crate::context::Envelope;
use crate::InvokeError;
use std::any::Any;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use trellis_shape::ShapeId;
use trellis_types::{PartId, RelationMask, StageMask};

/// Declarative eligibility filters attached to a listener at registration.
///
/// Defaults: eligible in every stage, hears only its own part.
///
/// # Example
///
/// ```
/// use trellis_bus::ListenerOpts;
/// use trellis_types::{RelationMask, StageMask};
///
/// let opts = ListenerOpts::default()
///     .in_stages(StageMask::EDITOR)
///     .from_relations(RelationMask::SAME | RelationMask::CHILD);
/// assert_eq!(opts.stages, StageMask::EDITOR);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOpts {
    /// Stages in which this listener is eligible.
    pub stages: StageMask,
    /// Source relations this listener accepts.
    pub relations: RelationMask,
}

impl ListenerOpts {
    /// Restricts the listener to the given stages.
    #[must_use]
    pub fn in_stages(mut self, stages: StageMask) -> Self {
        self.stages = stages;
        self
    }

    /// Restricts the listener to the given source relations.
    #[must_use]
    pub fn from_relations(mut self, relations: RelationMask) -> Self {
        self.relations = relations;
        self
    }
}

pub(crate) type Handler = dyn Fn(&Envelope<'_>) -> Result<(), InvokeError>;

#[derive(Clone)]
pub(crate) struct ListenerEntry {
    pub seq: u64,
    pub target: Weak<dyn Any>,
    pub owner: PartId,
    pub stages: StageMask,
    pub relations: RelationMask,
    pub handler: Rc<Handler>,
}

impl ListenerEntry {
    /// A registration is void once its target has been dropped.
    pub(crate) fn is_dead(&self) -> bool {
        self.target.strong_count() == 0
    }
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    by_shape: HashMap<ShapeId, Vec<ListenerEntry>>,
    next_seq: u64,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, shape: ShapeId, mut entry: ListenerEntry) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        entry.seq = seq;
        self.by_shape.entry(shape).or_default().push(entry);
        seq
    }

    /// Clones the bucket for a shape so the dispatch walk can run without
    /// holding a registry borrow across listener invocations.
    pub(crate) fn snapshot(&self, shape: ShapeId) -> Option<Vec<ListenerEntry>> {
        self.by_shape.get(&shape).map(Vec::clone)
    }

    /// Splices one entry out by identity. No-op if a nested walk already
    /// removed it.
    pub(crate) fn remove(&mut self, shape: ShapeId, seq: u64) {
        if let Some(bucket) = self.by_shape.get_mut(&shape) {
            bucket.retain(|entry| entry.seq != seq);
            if bucket.is_empty() {
                self.by_shape.remove(&shape);
            }
        }
    }

    /// Removes every registration owned by a part.
    pub(crate) fn purge_owner(&mut self, owner: PartId) {
        self.by_shape
            .retain(|_, bucket| {
                bucket.retain(|entry| entry.owner != owner);
                !bucket.is_empty()
            });
    }

    pub(crate) fn count(&self, shape: ShapeId) -> usize {
        self.by_shape.get(&shape).map_or(0, Vec::len)
    }
}
