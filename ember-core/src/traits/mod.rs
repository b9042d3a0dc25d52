//! Collaborator traits
//!
//! These traits define the interface between the dispatch loop and the
//! protocol stack and LED strip it drives.

pub mod protocol;
pub mod strip;

pub use protocol::Protocol;
pub use strip::{FireParams, LedStrip, RenderError, Rgb, StripError};
