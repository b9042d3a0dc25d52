//! Board-agnostic core logic for the Ember LED controller
//!
//! This crate contains everything between the hardware traits and the
//! firmware binary that does not depend on a specific chip:
//!
//! - Tick math and the one-shot precision timer driver
//! - Modbus RTU silence detection (1.5T / 3.5T) on top of that driver
//! - The cyclic render-cadence timer
//! - Render flags, cancellation tokens and the suspend/resume handshake
//! - The holding-register map exposed over Modbus
//! - The dispatch loop with its uninterruptible and interruptible phases
//!
//! # Event Flow
//!
//! ```text
//!  UART IRQ ──► SerialTransport ──► FrameTiming ──► RtuStack ──┐
//!  TIMER IRQ ─────────────────────► FrameTiming ──► RtuStack   │ suspend/resume
//!  CYCLIC IRQ ──► RenderState (updated → update)               ▼
//!                                                         RenderState
//!  main ──► Dispatcher::step ─┬─ critical section: advance, reconcile, apply
//!                             └─ interrupts on:  render pass (cancellable)
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod link;
pub mod registers;
pub mod render;
pub mod timing;
pub mod traits;
pub mod transport;

pub use dispatch::{Dispatcher, DispatchRequest, DispatchStats, Iteration, PassOutcome, RenderPass};
pub use link::RtuLink;
pub use registers::{ControlBlock, RegisterMap};
pub use render::{CancelToken, Cancelled, Effect, RenderState, ResumeOutcome, SuspendState};
pub use timing::{CyclicTimer, FrameTiming, PrecisionTimer, SilenceTicks, TimeoutKind};
pub use transport::{SerialTransport, TransportError, TransportEvent};
