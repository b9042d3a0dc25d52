//! Dispatch loop
//!
//! The single control loop of the firmware. Each iteration runs a short
//! uninterruptible phase with interrupts disabled, then at most one
//! cancellable render pass with interrupts enabled, then sleeps.

pub mod critical;
pub mod dispatcher;
pub mod request;

pub use critical::CriticalSection;
pub use dispatcher::{DispatchStats, Dispatcher, Iteration, PassOutcome};
pub use request::{DispatchRequest, RenderPass};
