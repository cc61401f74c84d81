//! Unified error interface for trellis.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that hosts
//! can branch on a stable machine-readable code instead of matching display
//! strings.
//!
//! # Code Format
//!
//! - **UPPER_SNAKE_CASE**, prefixed per layer: `SHAPE_` for catalog errors,
//!   `BUS_` for dispatch errors
//! - **Stable**: a code is an API contract and never changes once published
//!
//! # Recoverability
//!
//! `is_recoverable()` answers "could retrying, or a corrective action by the
//! caller, make this succeed?" Catalog and dispatch errors are almost all
//! programming or configuration mistakes, so most answer `false`.
//!
//! # Example
//!
//! ```
//! use trellis_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum HostError {
//!     PartMissing,
//! }
//!
//! impl ErrorCode for HostError {
//!     fn code(&self) -> &'static str {
//!         "HOST_PART_MISSING"
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         false
//!     }
//! }
//!
//! assert_eq!(HostError::PartMissing.code(), "HOST_PART_MISSING");
//! ```

/// Unified error code interface.
///
/// Implemented by every trellis error type, and intended for host error
/// types that flow through listener handlers as well.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    ///
    /// UPPER_SNAKE_CASE, prefixed with the owning layer (`SHAPE_`, `BUS_`),
    /// stable across versions.
    fn code(&self) -> &'static str;

    /// Returns whether the error is recoverable.
    ///
    /// `true` when retrying or a corrective caller action may succeed,
    /// `false` when the error signals a configuration or programming
    /// mistake that will not change on retry.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows trellis conventions.
///
/// # Checks
///
/// 1. Code is not empty
/// 2. Code starts with the expected layer prefix
/// 3. Code is UPPER_SNAKE_CASE
///
/// # Panics
///
/// Panics with a descriptive message if validation fails. Intended for use
/// in tests that enumerate every variant of an error enum.
///
/// # Example
///
/// ```
/// use trellis_types::{assert_error_code, ErrorCode};
///
/// #[derive(Debug)]
/// struct Dead;
///
/// impl ErrorCode for Dead {
///     fn code(&self) -> &'static str { "BUS_TARGET_GONE" }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_code(&Dead, "BUS_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");

    assert!(
        code.starts_with(expected_prefix),
        "error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );

    assert!(
        is_upper_snake_case(code),
        "error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates every error in a slice at once.
///
/// Use with an `all_variants()` helper to keep the convention test exhaustive
/// when variants are added.
///
/// # Example
///
/// ```
/// use trellis_types::{assert_error_codes, ErrorCode};
///
/// #[derive(Debug)]
/// enum E { A, B }
///
/// impl ErrorCode for E {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::A => "BUS_A",
///             Self::B => "BUS_B",
///         }
///     }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_codes(&[E::A, E::B], "BUS_");
/// ```
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

/// Checks if a string is UPPER_SNAKE_CASE.
fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum ProbeError {
        Transient,
        Permanent,
    }

    impl ErrorCode for ProbeError {
        fn code(&self) -> &'static str {
            match self {
                Self::Transient => "PROBE_TRANSIENT",
                Self::Permanent => "PROBE_PERMANENT",
            }
        }

        fn is_recoverable(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    #[test]
    fn error_code_trait() {
        assert_eq!(ProbeError::Transient.code(), "PROBE_TRANSIENT");
        assert!(ProbeError::Transient.is_recoverable());
        assert!(!ProbeError::Permanent.is_recoverable());
    }

    #[test]
    fn assert_error_code_valid() {
        assert_error_code(&ProbeError::Transient, "PROBE_");
    }

    #[test]
    fn assert_error_codes_all_variants() {
        assert_error_codes(&[ProbeError::Transient, ProbeError::Permanent], "PROBE_");
    }

    #[test]
    #[should_panic(expected = "must start with prefix")]
    fn assert_error_code_wrong_prefix() {
        assert_error_code(&ProbeError::Transient, "BUS_");
    }

    #[test]
    fn upper_snake_case_accepts() {
        assert!(is_upper_snake_case("BUS_ABSTRACT_SEND"));
        assert!(is_upper_snake_case("SHAPE_DUPLICATE"));
        assert!(is_upper_snake_case("X_2"));
    }

    #[test]
    fn upper_snake_case_rejects() {
        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("bus_error"));
        assert!(!is_upper_snake_case("Bus_Error"));
        assert!(!is_upper_snake_case("_BUS"));
        assert!(!is_upper_snake_case("BUS_"));
        assert!(!is_upper_snake_case("BUS__ERROR"));
    }
}
