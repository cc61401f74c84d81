//! The filter stack.
//!
//! Filters intercept sends before any listener runs. They are scoped: a
//! caller acquires one, holds the returned [`FilterScope`], and the entry
//! lives exactly as long as the guard. Release happens on every exit path
//! because it rides `Drop`, and out-of-order release is fine — the entry is
//! removed from wherever it sits in the stack.
//!
//! Evaluation order is LIFO: the most recently acquired filter sees a send
//! first. The first filter to report "handled" stops that send outright.
//!
//! # Shape matching
//!
//! A filter acquired for named shapes also matches each name's ancestors,
//! so intercepting `MassChanged` also intercepts direct sends of its
//! generalizations. An empty shape list matches every shape.

use crate::context::Envelope;
use crate::MessageBus;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};
use trellis_shape::ShapeId;
use trellis_types::PartId;

pub(crate) type Predicate = dyn Fn(&Envelope<'_>) -> bool;

#[derive(Clone)]
pub(crate) enum FilterKind {
    /// Caller-supplied handled/not-handled logic.
    Predicate(Rc<Predicate>),
    /// Constant "handled": suppress matching sends for the scope's life.
    Ignore,
    /// Suppress and record; replay unique messages on release.
    Consolidate(Rc<RefCell<ConsolidateBuf>>),
}

pub(crate) struct FilterEntry {
    pub token: u64,
    pub source: Option<PartId>,
    /// Empty set matches all shapes.
    pub shapes: HashSet<ShapeId>,
    pub kind: FilterKind,
}

impl FilterEntry {
    pub(crate) fn matches(&self, source: PartId, shape: ShapeId) -> bool {
        self.source.map_or(true, |s| s == source)
            && (self.shapes.is_empty() || self.shapes.contains(&shape))
    }
}

/// One message captured by a consolidator.
#[derive(Clone, PartialEq)]
pub(crate) struct Recorded {
    pub source: PartId,
    pub shape: ShapeId,
    pub args: Vec<Value>,
}

/// Order-preserving, de-duplicating buffer behind a consolidator scope.
///
/// Equality is structural over (source, shape, args); a message equal to an
/// already-recorded one is swallowed without a trace.
#[derive(Default)]
pub(crate) struct ConsolidateBuf {
    recorded: Vec<Recorded>,
}

impl ConsolidateBuf {
    pub(crate) fn record(&mut self, message: Recorded) {
        if !self.recorded.contains(&message) {
            self.recorded.push(message);
        }
    }

    pub(crate) fn drain(&mut self) -> Vec<Recorded> {
        std::mem::take(&mut self.recorded)
    }
}

/// RAII guard for an acquired filter.
///
/// Dropping the guard removes the filter from the stack; for a
/// consolidator, it then replays every unique recorded message in
/// first-seen order, with the consolidator no longer intercepting.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use trellis_bus::{FlatTopology, MessageBus};
/// use trellis_shape::{Catalog, ShapeDef};
/// use trellis_types::PartId;
///
/// let mut catalog = Catalog::new();
/// catalog.register(ShapeDef::new("ModelChanged")).unwrap();
/// let bus = MessageBus::new(catalog, Rc::new(FlatTopology));
///
/// let scope = bus.acquire_ignore(None, &["ModelChanged"]).unwrap();
/// // ... sends of ModelChanged are suppressed here ...
/// scope.release(); // or just let it drop
/// ```
pub struct FilterScope {
    bus: Weak<MessageBus>,
    token: u64,
}

impl FilterScope {
    pub(crate) fn new(bus: Weak<MessageBus>, token: u64) -> Self {
        Self { bus, token }
    }

    /// Releases the filter now. Equivalent to dropping the guard; spelled
    /// out for call sites where the release is the point.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for FilterScope {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.release_filter(self.token);
        }
    }
}

impl std::fmt::Debug for FilterScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterScope")
            .field("token", &self.token)
            .finish()
    }
}
