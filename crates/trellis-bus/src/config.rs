//! Bus configuration.

/// Behavioral knobs for a [`MessageBus`](crate::MessageBus).
///
/// # Depth limit
///
/// Dispatch is re-entrant: a listener may send while being delivered to.
/// Two listeners that trigger each other would otherwise recurse until the
/// stack blows; `max_depth` turns that into a clean
/// `BUS_DEPTH_EXCEEDED` error at the offending `send`.
///
/// # Example
///
/// ```
/// use trellis_bus::BusConfig;
///
/// let config = BusConfig::default().with_max_depth(8);
/// assert_eq!(config.max_depth, 8);
/// assert!(!config.trace_delivery);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Maximum number of simultaneously in-flight (nested) sends.
    pub max_depth: usize,
    /// Emit a `trace!` line for every listener invocation.
    pub trace_delivery: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            trace_delivery: false,
        }
    }
}

impl BusConfig {
    /// Sets the re-entrancy depth limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables per-delivery trace logging.
    #[must_use]
    pub fn with_trace_delivery(mut self) -> Self {
        self.trace_delivery = true;
        self
    }
}
