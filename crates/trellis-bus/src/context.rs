//! The dispatch context stack.
//!
//! Every `send` pushes a frame before filters run and pops it when the send
//! returns, on every exit path — short-circuit, listener failure, panic
//! unwind. Nested sends stack frames, so code running inside a listener can
//! always see the innermost message being dispatched.

use serde_json::Value;
use std::cell::RefCell;
use trellis_shape::ShapeId;
use trellis_types::PartId;

/// The message currently crossing a listener or filter: source part, shape
/// name, and the argument slice as delivered (truncated for listeners,
/// untruncated for filters).
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    /// The part that sent the message.
    pub source: PartId,
    /// Name of the shape this delivery is for. For a listener on an
    /// ancestor shape, this is the ancestor's name, not the sent shape's.
    pub shape: &'a str,
    /// Arguments, truncated to the shape's arity for listener deliveries.
    pub args: &'a [Value],
}

/// Snapshot of the innermost in-flight send, from
/// [`MessageBus::current_dispatch`](crate::MessageBus::current_dispatch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchInfo {
    /// The part that sent the in-flight message.
    pub source: PartId,
    /// Name of the shape as sent.
    pub shape: String,
    /// Shape names the send delivers to, most specific first.
    pub ancestors: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Frame {
    pub source: PartId,
    pub shape: ShapeId,
}

/// Pops its frame on drop, so the stack stays balanced across early
/// returns and unwinds.
pub(crate) struct FrameGuard<'a> {
    frames: &'a RefCell<Vec<Frame>>,
}

impl<'a> FrameGuard<'a> {
    pub(crate) fn push(frames: &'a RefCell<Vec<Frame>>, frame: Frame) -> Self {
        frames.borrow_mut().push(frame);
        Self { frames }
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.frames.borrow_mut().pop();
    }
}
