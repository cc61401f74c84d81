//! Shape parameters.
//!
//! Parameters exist for two jobs only: checking a listener's declared
//! signature at registration, and truncating argument lists during the
//! hierarchy walk. Dispatch itself is structural — arguments travel as
//! `serde_json::Value` and are never downcast by the bus.

use serde::{Deserialize, Serialize};

/// Kind of a shape parameter.
///
/// Kinds are deliberately coarse. They catch wiring mistakes (a listener
/// declared for the wrong signature) at registration time without dragging
/// a full type system into the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    /// Boolean flag.
    Bool,
    /// Integer quantity.
    Int,
    /// Floating-point quantity.
    Float,
    /// Text.
    Text,
    /// A part identifier.
    Id,
    /// Any JSON value; the structural wildcard.
    Any,
}

impl ParamKind {
    /// Returns `true` if a listener declaring `self` can accept an argument
    /// of kind `offered`.
    ///
    /// [`ParamKind::Any`] accepts everything on the declaring side; an
    /// exact kind only accepts itself (or an `Any` offered by the shape).
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_shape::ParamKind;
    ///
    /// assert!(ParamKind::Any.accepts(ParamKind::Float));
    /// assert!(ParamKind::Float.accepts(ParamKind::Float));
    /// assert!(!ParamKind::Float.accepts(ParamKind::Text));
    /// ```
    #[must_use]
    pub fn accepts(self, offered: ParamKind) -> bool {
        self == Self::Any || offered == Self::Any || self == offered
    }
}

/// A named, kinded shape parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name, for diagnostics only.
    pub name: String,
    /// Parameter kind, used for signature checks and nothing else.
    pub kind: ParamKind,
}

impl Param {
    /// Creates a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
