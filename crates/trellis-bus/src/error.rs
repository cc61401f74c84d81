//! Bus layer errors.
//!
//! Two enums with two audiences: [`BusError`] is what bus operations return
//! to callers, [`InvokeError`] is what listener handlers return to the bus.
//! All variants implement [`ErrorCode`] with the `BUS_` prefix.
//!
//! | Variant | Code |
//! |---------|------|
//! | [`BusError::UnknownShape`] | `BUS_UNKNOWN_SHAPE` |
//! | [`BusError::AbstractSend`] | `BUS_ABSTRACT_SEND` |
//! | [`BusError::SignatureMismatch`] | `BUS_SIGNATURE_MISMATCH` |
//! | [`BusError::ListenerFailed`] | `BUS_LISTENER_FAILED` |
//! | [`BusError::DepthExceeded`] | `BUS_DEPTH_EXCEEDED` |
//! | [`BusError::Detached`] | `BUS_DETACHED` |
//! | [`InvokeError::TargetGone`] | `BUS_TARGET_GONE` |
//! | [`InvokeError::Failed`] | `BUS_HANDLER_FAILED` |
//!
//! # The asymmetric failure contract
//!
//! A handler returning [`InvokeError::TargetGone`] reports a lifecycle
//! race: its target was torn down between the registry's liveness probe and
//! the call. The bus logs it and keeps delivering — the race is expected
//! and no other listener should suffer for it.
//!
//! A handler returning [`InvokeError::Failed`] reports a programming error.
//! The bus stops the walk and surfaces [`BusError::ListenerFailed`] to the
//! sender — half-delivering around a broken listener hides bugs.

use thiserror::Error;
use trellis_types::ErrorCode;

/// Dispatch and registration errors returned by bus operations.
///
/// # Example
///
/// ```
/// use trellis_bus::BusError;
/// use trellis_types::ErrorCode;
///
/// let err = BusError::AbstractSend("PhysicsChanged".into());
/// assert_eq!(err.code(), "BUS_ABSTRACT_SEND");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The named shape is not in the bus catalog.
    #[error("unknown shape: {0}")]
    UnknownShape(String),

    /// The shape is abstract; only its concrete children may be sent.
    #[error("shape {0} is abstract and cannot be sent")]
    AbstractSend(String),

    /// A listener's declared signature does not match the shape's
    /// parameter list.
    #[error("listener signature incompatible with shape {shape}: {detail}")]
    SignatureMismatch {
        /// The shape being subscribed to.
        shape: String,
        /// What failed to line up.
        detail: String,
    },

    /// A listener handler failed; remaining delivery for this send was
    /// aborted.
    #[error("listener for shape {shape} failed: {detail}")]
    ListenerFailed {
        /// The shape whose listener failed.
        shape: String,
        /// The handler's failure message.
        detail: String,
    },

    /// Re-entrant sends exceeded the configured depth limit.
    #[error("dispatch depth limit of {limit} exceeded")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// The bus behind this handle has been dropped.
    #[error("message bus no longer alive")]
    Detached,
}

impl ErrorCode for BusError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownShape(_) => "BUS_UNKNOWN_SHAPE",
            Self::AbstractSend(_) => "BUS_ABSTRACT_SEND",
            Self::SignatureMismatch { .. } => "BUS_SIGNATURE_MISMATCH",
            Self::ListenerFailed { .. } => "BUS_LISTENER_FAILED",
            Self::DepthExceeded { .. } => "BUS_DEPTH_EXCEEDED",
            Self::Detached => "BUS_DETACHED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Result of one listener invocation, returned by handlers to the bus.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The handler's target vanished between the liveness probe and the
    /// call. Logged and skipped; delivery continues.
    #[error("listener target no longer reachable")]
    TargetGone,

    /// The handler's body failed. Propagates out of `send` and aborts the
    /// remaining walk.
    #[error("{0}")]
    Failed(String),
}

impl InvokeError {
    /// Convenience for handlers bailing out with a message.
    #[must_use]
    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Failed(detail.into())
    }
}

impl ErrorCode for InvokeError {
    fn code(&self) -> &'static str {
        match self {
            Self::TargetGone => "BUS_TARGET_GONE",
            Self::Failed(_) => "BUS_HANDLER_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
