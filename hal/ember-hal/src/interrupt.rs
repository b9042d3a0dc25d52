//! Global interrupt mask and core sleep
//!
//! Only the dispatch loop talks to this trait. Drivers and interrupt
//! handlers set flags; they never toggle the global interrupt state.

/// Global interrupt control for a single-core MCU
pub trait Interrupts {
    /// Disable interrupts globally
    ///
    /// Returns whether interrupts were enabled before the call, so that
    /// nested sections can restore the outer state.
    fn disable(&mut self) -> bool;

    /// Restore the state returned by a matching [`Interrupts::disable`]
    fn restore(&mut self, was_enabled: bool);

    /// Sleep the core until the next interrupt
    ///
    /// Must be called with interrupts enabled; a pending interrupt wakes the
    /// core immediately.
    fn wait_for_interrupt(&mut self);
}
