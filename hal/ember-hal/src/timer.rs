//! Hardware timer abstractions
//!
//! Models a counter running from a prescaled clock with a single compare
//! register. When the counter reaches the compare value the pending flag is
//! raised, the compare interrupt fires (if enabled) and the counter restarts
//! from zero ("clear timer on compare match"). Drivers built on top decide
//! whether that behaves as a one-shot or a periodic timer.

/// Clock prescaler applied to the timer input clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Div1,
    Div8,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    /// Division factor applied to the input clock
    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }
}

/// Counter with a compare-match interrupt
///
/// Implementations only touch their own peripheral. None of these methods
/// may change the global interrupt mask.
pub trait CompareTimer {
    /// Write the compare threshold in ticks
    fn set_compare(&mut self, ticks: u32);

    /// Current compare threshold in ticks
    fn compare(&self) -> u32;

    /// Zero the counter
    fn clear_counter(&mut self);

    /// Current counter value in ticks
    fn counter(&self) -> u32;

    /// Start counting with the given prescaler
    fn enable_clock(&mut self, prescaler: Prescaler);

    /// Stop counting
    ///
    /// Returns the prescaler that was active, or `None` if the clock was
    /// already stopped.
    fn disable_clock(&mut self) -> Option<Prescaler>;

    /// Enable or disable the compare-match interrupt
    fn set_compare_interrupt(&mut self, enabled: bool);

    /// Check whether the compare-match interrupt is enabled
    fn compare_interrupt_enabled(&self) -> bool;

    /// Clear a pending compare-match flag
    fn clear_pending(&mut self);

    /// Check whether a compare match is pending
    fn is_pending(&self) -> bool;
}
