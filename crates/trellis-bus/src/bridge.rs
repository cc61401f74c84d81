//! The bridging layer.
//!
//! A [`Producer`] adapts one message-producing site — a `(part, shape)`
//! pair — into bus sends. The host installs one while scanning an object's
//! declarations and calls [`Producer::raise`] wherever the native event
//! fires. Installation is idempotent: scanning the same object twice hands
//! back the already-installed producer instead of a duplicate.

use crate::{BusError, MessageBus};
use serde_json::Value;
use std::rc::Weak;
use trellis_shape::ShapeId;
use trellis_types::PartId;

/// Send handle for one message-producing site.
///
/// Holds the bus weakly; a producer that outlives its bus fails with
/// `BUS_DETACHED` instead of keeping the bus alive.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use serde_json::json;
/// use trellis_bus::{FlatTopology, MessageBus};
/// use trellis_shape::standard;
/// use trellis_types::PartId;
///
/// let bus = MessageBus::new(standard::standard_catalog(), Rc::new(FlatTopology));
/// let tank = PartId::named("tank");
///
/// let mass_changed = bus.producer(tank, standard::MASS_CHANGED).unwrap();
/// mass_changed.raise(&[json!(2.5)]).unwrap();
/// ```
pub struct Producer {
    bus: Weak<MessageBus>,
    owner: PartId,
    shape: ShapeId,
    shape_name: String,
}

impl Producer {
    pub(crate) fn new(
        bus: Weak<MessageBus>,
        owner: PartId,
        shape: ShapeId,
        shape_name: String,
    ) -> Self {
        Self {
            bus,
            owner,
            shape,
            shape_name,
        }
    }

    /// The part this producer raises messages for.
    #[must_use]
    pub fn owner(&self) -> PartId {
        self.owner
    }

    /// Name of the shape this producer raises.
    #[must_use]
    pub fn shape_name(&self) -> &str {
        &self.shape_name
    }

    /// Sends one message from this site.
    ///
    /// # Errors
    ///
    /// [`BusError::Detached`] if the bus has been dropped, otherwise
    /// whatever the underlying send returns.
    pub fn raise(&self, args: &[Value]) -> Result<(), BusError> {
        let bus = self.bus.upgrade().ok_or(BusError::Detached)?;
        bus.dispatch(self.owner, self.shape, args)
    }
}

impl std::fmt::Debug for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Producer")
            .field("owner", &self.owner)
            .field("shape", &self.shape_name)
            .finish()
    }
}
