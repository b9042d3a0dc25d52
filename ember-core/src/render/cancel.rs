//! Cooperative cancellation for render passes

use super::flags::RenderState;

/// A render pass stopped at a checkpoint because an abort was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cancelled;

/// Token checked by render routines at segment boundaries
///
/// A token bound to a [`RenderState`] turns a pending abort into
/// `Err(Cancelled)` at the next checkpoint and records that the pass
/// stopped. [`CancelToken::never`] is used for pushes that must complete,
/// such as a forced refresh with interrupts disabled.
#[derive(Debug, Clone, Copy)]
pub struct CancelToken<'a> {
    state: Option<&'a RenderState>,
}

impl<'a> CancelToken<'a> {
    /// Token honoring aborts requested on `state`
    pub fn new(state: &'a RenderState) -> Self {
        Self { state: Some(state) }
    }

    /// Token that never cancels
    pub const fn never() -> Self {
        Self { state: None }
    }

    /// Safe point: stop here if an abort is pending
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        match self.state {
            Some(state) if state.is_abort_requested() => {
                state.mark_aborted();
                Err(Cancelled)
            }
            _ => Ok(()),
        }
    }
}
