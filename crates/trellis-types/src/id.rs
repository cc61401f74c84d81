//! Part identifiers.
//!
//! A *part* is the owning entity behind a message source or a listener: one
//! node of the host's assembly tree. The bus never holds parts themselves —
//! only their ids, which it hands back to the host's
//! relationship/enablement callbacks.

use serde::{Deserialize, Serialize};
use uuid::{uuid, Uuid};

/// Trellis namespace UUID for deterministic UUID v5 generation.
///
/// Used as the namespace when deriving stable part ids from names via
/// [`PartId::named`].
const TRELLIS_NAMESPACE: Uuid = uuid!("6f0c2e2a-58d1-4b77-9c3e-1a4f8b0d2c91");

/// Identity of a part in the host assembly.
///
/// # UUID Strategy
///
/// - [`PartId::new`] — random UUID v4, for parts instantiated at runtime
/// - [`PartId::named`] — deterministic UUID v5 from a name, for parts whose
///   identity must be stable across processes (and for fixtures)
///
/// # Example
///
/// ```
/// use trellis_types::PartId;
///
/// let tank_a = PartId::named("fuel-tank-a");
/// let tank_b = PartId::named("fuel-tank-a");
/// assert_eq!(tank_a, tank_b); // same name, same identity
///
/// let fresh = PartId::new();
/// assert_ne!(fresh, tank_a);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartId(pub Uuid);

impl PartId {
    /// Creates a new [`PartId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic [`PartId`] from a name (UUID v5).
    ///
    /// The same name always yields the same id, across processes and
    /// machines.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis_types::PartId;
    ///
    /// assert_eq!(PartId::named("root"), PartId::named("root"));
    /// assert_ne!(PartId::named("root"), PartId::named("wing"));
    /// ```
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self(Uuid::new_v5(&TRELLIS_NAMESPACE, name.as_bytes()))
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PartId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "part:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_is_deterministic() {
        assert_eq!(PartId::named("engine"), PartId::named("engine"));
        assert_ne!(PartId::named("engine"), PartId::named("tank"));
    }

    #[test]
    fn new_is_unique() {
        assert_ne!(PartId::new(), PartId::new());
    }

    #[test]
    fn display_prefix() {
        let id = PartId::named("engine");
        assert!(id.to_string().starts_with("part:"));
    }

    #[test]
    fn serde_round_trip() {
        let id = PartId::named("engine");
        let json = serde_json::to_string(&id).unwrap();
        let back: PartId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
