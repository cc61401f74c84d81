//! The message bus.
//!
//! Owns the four structures dispatch runs over — shape catalog, listener
//! registry, filter stack, frame stack — and the injected host topology.
//! One instance per composition root; consumers hold `Rc<MessageBus>` (or a
//! `Weak` where a cycle threatens) rather than reaching for a global.
//!
//! # Re-entrancy discipline
//!
//! `send` may be called from inside a listener or filter predicate, so no
//! `RefCell` borrow is ever held across user code. The walk operates on
//! snapshots: matching filters are collected before the first predicate
//! runs, and each shape's listener bucket is cloned before its first
//! handler runs. Mutation — lazy pruning of dead entries — happens in
//! short exclusive borrows between invocations.
//!
//! One observable consequence: a listener or filter registered while a
//! send is in flight becomes eligible at the next send, not retroactively
//! for the current one.

use crate::bridge::Producer;
use crate::config::BusConfig;
use crate::context::{DispatchInfo, Envelope, Frame, FrameGuard};
use crate::filter::{ConsolidateBuf, FilterEntry, FilterKind, FilterScope, Predicate, Recorded};
use crate::listener::{Handler, ListenerEntry, ListenerOpts, ListenerRegistry};
use crate::topology::Topology;
use crate::{BusError, InvokeError};
use serde_json::Value;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};
use trellis_shape::{Catalog, ParamKind, ShapeId};
use trellis_types::{ErrorCode, PartId, Stage};

/// Typed, hierarchy-aware, in-process message bus.
///
/// Dispatch is synchronous and single-threaded: `send` runs every eligible
/// listener to completion (possibly recursively) before returning. The bus
/// is deliberately `!Send` — a multi-threaded host wraps it behind its own
/// exclusion.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use serde_json::json;
/// use trellis_bus::{FlatTopology, ListenerOpts, MessageBus};
/// use trellis_shape::{standard, ParamKind};
/// use trellis_types::PartId;
///
/// let bus = MessageBus::new(standard::standard_catalog(), Rc::new(FlatTopology));
/// let tank = PartId::named("tank");
///
/// let log: Rc<std::cell::RefCell<Vec<f64>>> = Rc::default();
/// let sink = log.clone();
/// bus.add_listener(
///     Rc::downgrade(&(log.clone() as Rc<dyn std::any::Any>)),
///     tank,
///     standard::MASS_CHANGED,
///     &[ParamKind::Float],
///     ListenerOpts::default(),
///     move |envelope| {
///         sink.borrow_mut().push(envelope.args[0].as_f64().unwrap());
///         Ok(())
///     },
/// )
/// .unwrap();
///
/// bus.send(tank, standard::MASS_CHANGED, &[json!(2.5)]).unwrap();
/// assert_eq!(*log.borrow(), vec![2.5]);
/// ```
pub struct MessageBus {
    catalog: Catalog,
    topology: Rc<dyn Topology>,
    config: BusConfig,
    stage: Cell<Stage>,
    listeners: RefCell<ListenerRegistry>,
    filters: RefCell<Vec<FilterEntry>>,
    frames: RefCell<Vec<Frame>>,
    producers: RefCell<HashMap<(PartId, ShapeId), Rc<Producer>>>,
    next_token: Cell<u64>,
}

impl MessageBus {
    /// Creates a bus over a finished catalog with default configuration.
    #[must_use]
    pub fn new(catalog: Catalog, topology: Rc<dyn Topology>) -> Rc<Self> {
        Self::with_config(catalog, topology, BusConfig::default())
    }

    /// Creates a bus with explicit configuration.
    #[must_use]
    pub fn with_config(catalog: Catalog, topology: Rc<dyn Topology>, config: BusConfig) -> Rc<Self> {
        Rc::new(Self {
            catalog,
            topology,
            config,
            stage: Cell::new(Stage::Loading),
            listeners: RefCell::default(),
            filters: RefCell::default(),
            frames: RefCell::default(),
            producers: RefCell::default(),
            next_token: Cell::new(0),
        })
    }

    /// The shape catalog this bus dispatches over.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The current host lifecycle stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage.get()
    }

    /// Updates the lifecycle stage; listener stage masks are evaluated
    /// against it at dispatch time. Hosts call this on transitions.
    pub fn set_stage(&self, stage: Stage) {
        self.stage.set(stage);
    }

    // === Listener registration ===

    /// Registers a listener for a shape.
    ///
    /// `target` is held weakly: the bus never keeps the listener's object
    /// alive, and once the target drops, the registration is void and gets
    /// spliced out by the next dispatch that walks past it.
    ///
    /// `declared` is the signature the handler claims to accept, checked
    /// against the shape's parameter list here rather than at first
    /// delivery. [`ParamKind::Any`] positions accept anything.
    ///
    /// # Errors
    ///
    /// - [`BusError::UnknownShape`] — `shape` is not in the catalog
    /// - [`BusError::SignatureMismatch`] — arity or kinds don't line up
    pub fn add_listener<F>(
        &self,
        target: Weak<dyn Any>,
        owner: PartId,
        shape: &str,
        declared: &[ParamKind],
        opts: ListenerOpts,
        handler: F,
    ) -> Result<(), BusError>
    where
        F: Fn(&Envelope<'_>) -> Result<(), InvokeError> + 'static,
    {
        let id = self.resolve(shape)?;
        self.check_signature(id, declared)?;

        self.listeners.borrow_mut().add(
            id,
            ListenerEntry {
                seq: 0,
                target,
                owner,
                stages: opts.stages,
                relations: opts.relations,
                handler: Rc::new(handler) as Rc<Handler>,
            },
        );
        Ok(())
    }

    fn check_signature(&self, shape: ShapeId, declared: &[ParamKind]) -> Result<(), BusError> {
        let params = self.catalog.params(shape);
        let mismatch = |detail: String| BusError::SignatureMismatch {
            shape: self.catalog.name(shape).to_string(),
            detail,
        };

        if declared.len() != params.len() {
            return Err(mismatch(format!(
                "shape takes {} parameters, listener declared {}",
                params.len(),
                declared.len()
            )));
        }
        for (i, (want, have)) in declared.iter().zip(params).enumerate() {
            if !want.accepts(have.kind) {
                return Err(mismatch(format!(
                    "parameter {i} ({}) is {:?}, listener declared {:?}",
                    have.name, have.kind, want
                )));
            }
        }
        Ok(())
    }

    /// Number of live-or-not-yet-pruned registrations for a shape. Zero for
    /// unknown shapes.
    #[must_use]
    pub fn listener_count(&self, shape: &str) -> usize {
        self.catalog
            .resolve(shape)
            .map_or(0, |id| self.listeners.borrow().count(id))
    }

    /// Removes every listener registration and producer owned by a part.
    ///
    /// Weak targets already make stale registrations harmless; this is the
    /// deterministic teardown path for hosts that destroy parts explicitly.
    pub fn purge_part(&self, part: PartId) {
        self.listeners.borrow_mut().purge_owner(part);
        self.producers
            .borrow_mut()
            .retain(|(owner, _), _| *owner != part);
    }

    // === Sending ===

    /// Sends a message: runs the filter stack, then delivers to every
    /// eligible listener of `shape` and each of its ancestors, most
    /// specific shape first, insertion order within a shape.
    ///
    /// # Errors
    ///
    /// - [`BusError::UnknownShape`] — `shape` is not in the catalog
    /// - [`BusError::AbstractSend`] — `shape` is abstract
    /// - [`BusError::DepthExceeded`] — re-entrant sends hit the limit
    /// - [`BusError::ListenerFailed`] — a handler failed; remaining
    ///   delivery was aborted
    pub fn send(&self, source: PartId, shape: &str, args: &[Value]) -> Result<(), BusError> {
        let id = self.resolve(shape)?;
        self.dispatch(source, id, args)
    }

    pub(crate) fn dispatch(
        &self,
        source: PartId,
        shape: ShapeId,
        args: &[Value],
    ) -> Result<(), BusError> {
        if self.catalog.is_abstract(shape) {
            return Err(BusError::AbstractSend(self.catalog.name(shape).to_string()));
        }
        if self.frames.borrow().len() >= self.config.max_depth {
            return Err(BusError::DepthExceeded {
                limit: self.config.max_depth,
            });
        }

        let _frame = FrameGuard::push(&self.frames, Frame { source, shape });

        if self.run_filters(source, shape, args) {
            return Ok(());
        }

        for ancestor in self.catalog.ancestors(shape) {
            self.deliver_shape(source, ancestor, args)?;
        }
        Ok(())
    }

    /// Runs matching filters newest-first. Returns `true` if one of them
    /// handled the message.
    fn run_filters(&self, source: PartId, shape: ShapeId, args: &[Value]) -> bool {
        // Snapshot before the first predicate runs: predicates may acquire,
        // release, or send re-entrantly.
        let matching: Vec<FilterKind> = self
            .filters
            .borrow()
            .iter()
            .rev()
            .filter(|entry| entry.matches(source, shape))
            .map(|entry| entry.kind.clone())
            .collect();

        let envelope = Envelope {
            source,
            shape: self.catalog.name(shape),
            args,
        };
        for kind in matching {
            let handled = match kind {
                FilterKind::Predicate(predicate) => predicate(&envelope),
                FilterKind::Ignore => true,
                FilterKind::Consolidate(buf) => {
                    buf.borrow_mut().record(Recorded {
                        source,
                        shape,
                        args: args.to_vec(),
                    });
                    true
                }
            };
            if handled {
                return true;
            }
        }
        false
    }

    /// Delivers to one shape's listener bucket, splicing out dead entries
    /// as it passes them.
    fn deliver_shape(
        &self,
        source: PartId,
        shape: ShapeId,
        args: &[Value],
    ) -> Result<(), BusError> {
        let snapshot = match self.listeners.borrow().snapshot(shape) {
            Some(snapshot) => snapshot,
            None => return Ok(()),
        };

        let shape_name = self.catalog.name(shape);
        let envelope = Envelope {
            source,
            shape: shape_name,
            args: &args[..args.len().min(self.catalog.arity(shape))],
        };

        for entry in snapshot {
            if entry.is_dead() {
                tracing::debug!(shape = shape_name, owner = %entry.owner, "pruning dead listener");
                self.listeners.borrow_mut().remove(shape, entry.seq);
                continue;
            }

            let eligible = self.topology.is_enabled(entry.owner)
                && entry.stages.permits(self.stage.get())
                && entry
                    .relations
                    .permits(self.topology.relation_of(source, entry.owner));
            if !eligible {
                continue;
            }

            if self.config.trace_delivery {
                tracing::trace!(shape = shape_name, owner = %entry.owner, "delivering");
            }
            match (entry.handler)(&envelope) {
                Ok(()) => {}
                Err(InvokeError::TargetGone) => {
                    tracing::warn!(
                        shape = shape_name,
                        owner = %entry.owner,
                        "listener target vanished mid-dispatch, skipping"
                    );
                }
                Err(InvokeError::Failed(detail)) => {
                    return Err(BusError::ListenerFailed {
                        shape: shape_name.to_string(),
                        detail,
                    });
                }
            }
        }
        Ok(())
    }

    // === Dispatch context ===

    /// The innermost in-flight send, if the caller is executing inside one.
    #[must_use]
    pub fn current_dispatch(&self) -> Option<DispatchInfo> {
        let frames = self.frames.borrow();
        let frame = frames.last()?;
        Some(DispatchInfo {
            source: frame.source,
            shape: self.catalog.name(frame.shape).to_string(),
            ancestors: self
                .catalog
                .ancestors(frame.shape)
                .map(|id| self.catalog.name(id).to_string())
                .collect(),
        })
    }

    /// Number of nested sends currently in flight.
    #[must_use]
    pub fn dispatch_depth(&self) -> usize {
        self.frames.borrow().len()
    }

    // === Filters ===

    /// Acquires a caller-scoped filter.
    ///
    /// The predicate sees every matching send (untruncated arguments) and
    /// returns `true` to mark it handled, which suppresses all delivery for
    /// that send. `source` of `None` matches every sender; an empty
    /// `shapes` list matches every shape; named shapes also match their
    /// ancestors.
    ///
    /// # Errors
    ///
    /// [`BusError::UnknownShape`] if a named shape is not in the catalog.
    pub fn acquire_filter<F>(
        self: &Rc<Self>,
        predicate: F,
        source: Option<PartId>,
        shapes: &[&str],
    ) -> Result<FilterScope, BusError>
    where
        F: Fn(&Envelope<'_>) -> bool + 'static,
    {
        let shapes = self.expand_shapes(shapes)?;
        Ok(self.push_filter(source, shapes, FilterKind::Predicate(Rc::new(predicate) as Rc<Predicate>)))
    }

    /// Acquires a blanket suppressor: every matching send is swallowed for
    /// the scope's lifetime.
    ///
    /// # Errors
    ///
    /// [`BusError::UnknownShape`] if a named shape is not in the catalog.
    pub fn acquire_ignore(
        self: &Rc<Self>,
        source: Option<PartId>,
        shapes: &[&str],
    ) -> Result<FilterScope, BusError> {
        let shapes = self.expand_shapes(shapes)?;
        Ok(self.push_filter(source, shapes, FilterKind::Ignore))
    }

    /// Acquires a consolidator: matching sends are suppressed and recorded,
    /// duplicates (structural equality over source, shape, and arguments)
    /// collapse to the first occurrence, and releasing the scope replays
    /// each unique message once, in first-seen order.
    ///
    /// # Errors
    ///
    /// [`BusError::UnknownShape`] if a named shape is not in the catalog.
    pub fn acquire_consolidator(
        self: &Rc<Self>,
        source: Option<PartId>,
        shapes: &[&str],
    ) -> Result<FilterScope, BusError> {
        let shapes = self.expand_shapes(shapes)?;
        Ok(self.push_filter(
            source,
            shapes,
            FilterKind::Consolidate(Rc::new(RefCell::new(ConsolidateBuf::default()))),
        ))
    }

    /// A filter named for a shape also intercepts that shape's
    /// generalizations sent directly.
    fn expand_shapes(&self, shapes: &[&str]) -> Result<HashSet<ShapeId>, BusError> {
        let mut expanded = HashSet::new();
        for name in shapes {
            let id = self.resolve(name)?;
            expanded.extend(self.catalog.ancestors(id));
        }
        Ok(expanded)
    }

    fn push_filter(
        self: &Rc<Self>,
        source: Option<PartId>,
        shapes: HashSet<ShapeId>,
        kind: FilterKind,
    ) -> FilterScope {
        let token = self.next_token.get();
        self.next_token.set(token + 1);
        self.filters.borrow_mut().push(FilterEntry {
            token,
            source,
            shapes,
            kind,
        });
        FilterScope::new(Rc::downgrade(self), token)
    }

    /// Removes a filter by token and, for a consolidator, replays its
    /// recorded messages with the entry already gone.
    pub(crate) fn release_filter(&self, token: u64) {
        let entry = {
            let mut filters = self.filters.borrow_mut();
            filters
                .iter()
                .position(|entry| entry.token == token)
                .map(|idx| filters.remove(idx))
        };
        let Some(entry) = entry else { return };

        if let FilterKind::Consolidate(buf) = entry.kind {
            let recorded = buf.borrow_mut().drain();
            for message in recorded {
                // A replay failure must not lose the rest of the batch, and
                // a drop path has no caller to report to.
                if let Err(err) = self.dispatch(message.source, message.shape, &message.args) {
                    tracing::error!(
                        shape = self.catalog.name(message.shape),
                        code = err.code(),
                        "consolidated replay failed: {err}"
                    );
                }
            }
        }
    }

    // === Bridging ===

    /// Installs (or retrieves) the producer for one `(owner, shape)` site.
    ///
    /// Idempotent: scanning the same object twice hands back the existing
    /// handle, never a duplicate registration.
    ///
    /// # Errors
    ///
    /// - [`BusError::UnknownShape`] — `shape` is not in the catalog
    /// - [`BusError::AbstractSend`] — a producing site for an abstract
    ///   shape could never legally raise
    pub fn producer(
        self: &Rc<Self>,
        owner: PartId,
        shape: &str,
    ) -> Result<Rc<Producer>, BusError> {
        let id = self.resolve(shape)?;
        if self.catalog.is_abstract(id) {
            return Err(BusError::AbstractSend(shape.to_string()));
        }

        let mut producers = self.producers.borrow_mut();
        if let Some(existing) = producers.get(&(owner, id)) {
            return Ok(existing.clone());
        }
        let producer = Rc::new(Producer::new(
            Rc::downgrade(self),
            owner,
            id,
            shape.to_string(),
        ));
        producers.insert((owner, id), producer.clone());
        Ok(producer)
    }

    fn resolve(&self, shape: &str) -> Result<ShapeId, BusError> {
        self.catalog
            .resolve(shape)
            .ok_or_else(|| BusError::UnknownShape(shape.to_string()))
    }
}
