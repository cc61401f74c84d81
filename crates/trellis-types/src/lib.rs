//! Core vocabulary for the trellis message bus.
//!
//! This crate is the bottom of the trellis stack: it holds the types every
//! other crate speaks in, and nothing else.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SDK Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  trellis-types : PartId, Relation, Stage, ErrorCode ◄─ HERE │
//! │  trellis-shape : ShapeDef, Catalog, ancestor chains         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  trellis-bus   : MessageBus, filters, dispatch engine       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Contents
//!
//! - [`PartId`] — identity of a part (the owning entity behind a message
//!   source or a listener)
//! - [`Relation`] / [`RelationMask`] — topological relation between two
//!   parts, and the declarative filter over it
//! - [`Stage`] / [`StageMask`] — host lifecycle stage, and the declarative
//!   filter over it
//! - [`ErrorCode`] — unified machine-readable error interface, with
//!   [`assert_error_code`] / [`assert_error_codes`] test helpers
//!
//! # Design
//!
//! Parts form an assembly tree owned by the host, not by trellis. The bus
//! only ever asks the host two questions about parts — "how do these two
//! relate?" and "is this one enabled?" — so this crate carries the
//! vocabulary for the answers and leaves the tree itself outside.

mod error;
mod id;
mod relation;
mod stage;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::PartId;
pub use relation::{Relation, RelationMask};
pub use stage::{Stage, StageMask};
