//! Catalog registration errors.
//!
//! All variants implement [`ErrorCode`] with the `SHAPE_` prefix. Catalog
//! errors are configuration mistakes surfaced at startup, so none are
//! recoverable.
//!
//! | Variant | Code |
//! |---------|------|
//! | [`CatalogError::Duplicate`] | `SHAPE_DUPLICATE` |
//! | [`CatalogError::UnknownParent`] | `SHAPE_UNKNOWN_PARENT` |
//! | [`CatalogError::ParamMismatch`] | `SHAPE_PARAM_MISMATCH` |

use thiserror::Error;
use trellis_types::ErrorCode;

/// Shape catalog registration error.
///
/// # Example
///
/// ```
/// use trellis_shape::CatalogError;
/// use trellis_types::ErrorCode;
///
/// let err = CatalogError::Duplicate {
///     name: "MassChanged".into(),
/// };
/// assert_eq!(err.code(), "SHAPE_DUPLICATE");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// A shape with this name is already registered.
    #[error("shape already registered: {name}")]
    Duplicate {
        /// The colliding shape name.
        name: String,
    },

    /// The named parent is not in the catalog.
    #[error("shape {shape} names unregistered parent {parent}")]
    UnknownParent {
        /// The shape being registered.
        shape: String,
        /// The missing parent name.
        parent: String,
    },

    /// The parent's parameter list is not a kind-compatible prefix of the
    /// child's, so truncation toward the parent would be meaningless.
    #[error("shape {shape} is not a parameter extension of parent {parent}: {detail}")]
    ParamMismatch {
        /// The shape being registered.
        shape: String,
        /// The incompatible parent.
        parent: String,
        /// What failed to line up.
        detail: String,
    },
}

impl ErrorCode for CatalogError {
    fn code(&self) -> &'static str {
        match self {
            Self::Duplicate { .. } => "SHAPE_DUPLICATE",
            Self::UnknownParent { .. } => "SHAPE_UNKNOWN_PARENT",
            Self::ParamMismatch { .. } => "SHAPE_PARAM_MISMATCH",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
