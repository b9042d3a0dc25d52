//! Render coordination
//!
//! The flags shared between interrupt handlers and the dispatch loop, the
//! cancellation token handed to render passes, and the suspend/resume
//! handshake the protocol layer uses to pause rendering.

pub mod cancel;
pub mod coordinator;
pub mod effect;
pub mod flags;

pub use cancel::{CancelToken, Cancelled};
pub use coordinator::{ResumeOutcome, SuspendState};
pub use effect::Effect;
pub use flags::RenderState;
