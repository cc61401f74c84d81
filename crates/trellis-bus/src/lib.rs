//! Synchronous, hierarchy-aware, in-process message bus.
//!
//! Parts declare typed message shapes arranged in a generalization
//! hierarchy (trellis-shape); other parts register listeners; senders
//! broadcast a message and the bus delivers it to every live,
//! filter-approved, relationship-approved listener of the shape and of
//! every ancestor shape, truncating the argument list to each listener's
//! signature.
//!
//! # Dispatch pipeline
//!
//! ```text
//! send(source, shape, args)
//!     │
//!     ▼
//! ┌──────────────────────────────────────────────────────┐
//! │ reject abstract shape · push dispatch frame          │
//! ├──────────────────────────────────────────────────────┤
//! │ Filter Stack (LIFO)                                  │
//! │   predicate / ignore / consolidator                  │
//! │   first "handled" stops the send ──────────────► Ok  │
//! ├──────────────────────────────────────────────────────┤
//! │ for each shape in [sent, parent, …, root]:           │
//! │   for each listener (insertion order):               │
//! │     dead target?      → splice out, continue         │
//! │     enabled? stage? relation?  → else skip           │
//! │     invoke(handler, args truncated to shape arity)   │
//! │       TargetGone → warn, continue                    │
//! │       Failed     → abort walk, error to sender       │
//! ├──────────────────────────────────────────────────────┤
//! │ pop dispatch frame                                   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Ownership
//!
//! The bus holds listener targets weakly and never extends their lifetime;
//! dead registrations are spliced out lazily as dispatch walks past them.
//! Filters are owned by their [`FilterScope`] guard and released
//! deterministically on drop. The bus itself is an explicit instance
//! (`Rc<MessageBus>`) threaded through whoever needs it — there is no
//! process-wide singleton.
//!
//! # Concurrency
//!
//! Single-threaded and deliberately `!Send`. Re-entrancy is fully
//! supported: a listener may `send`, register listeners, or acquire and
//! release filters while being delivered to. Concurrent dispatch from
//! multiple threads is out of scope; a multi-threaded host wraps the bus
//! behind its own exclusion.
//!
//! # Main types
//!
//! - [`MessageBus`] — registration, sending, filters, bridging
//! - [`ListenerOpts`] — declarative stage/relation eligibility
//! - [`FilterScope`] — RAII guard for an acquired filter
//! - [`Producer`] — per-site bridge from native event firing to `send`
//! - [`Topology`] — injected host collaborator (relations, enablement)
//! - [`BusError`] / [`InvokeError`] — error surface (implements
//!   [`trellis_types::ErrorCode`])

mod bridge;
mod bus;
mod config;
mod context;
mod error;
mod filter;
mod listener;
mod topology;

pub use bridge::Producer;
pub use bus::MessageBus;
pub use config::BusConfig;
pub use context::{DispatchInfo, Envelope};
pub use error::{BusError, InvokeError};
pub use filter::FilterScope;
pub use listener::ListenerOpts;
pub use topology::{FlatTopology, Topology};

// Re-export the vocabulary the bus API speaks in, for convenience.
pub use trellis_shape::{Catalog, ParamKind, ShapeDef, ShapeId};
pub use trellis_types::{PartId, Relation, RelationMask, Stage, StageMask};
