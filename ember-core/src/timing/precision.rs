//! One-shot precision timer driver
//!
//! Wraps a [`CompareTimer`] and gives it one-shot semantics with a single
//! registered slot. The slot is a plain tag (`K`) that the compare-match
//! handler hands back to its client, so the client dispatches with a
//! `match` instead of calling through a stored function pointer.
//!
//! Arming always stops the clock and zeroes the counter before the compare
//! interrupt is enabled, so a stale count never leaks into a new timeout.

use ember_hal::timer::{CompareTimer, Prescaler};

/// One-shot timer with a single tagged slot
#[derive(Debug)]
pub struct PrecisionTimer<T, K> {
    timer: T,
    prescaler: Prescaler,
    slot: Option<K>,
    /// Set by `start`, cleared by `reset`, `stop` and expiry
    fresh: bool,
}

impl<T: CompareTimer, K: Copy> PrecisionTimer<T, K> {
    /// Take ownership of `timer`, leaving it stopped
    pub fn new(mut timer: T, prescaler: Prescaler) -> Self {
        timer.disable_clock();
        timer.set_compare_interrupt(false);
        timer.clear_pending();
        Self {
            timer,
            prescaler,
            slot: None,
            fresh: false,
        }
    }

    /// Arm the timer to fire once after `ticks`, reporting `slot`
    ///
    /// Starting twice without an intervening [`reset`](Self::reset),
    /// [`stop`](Self::stop) or expiry is a programming error.
    pub fn start(&mut self, ticks: u32, slot: K) {
        debug_assert!(!self.fresh, "precision timer started twice without reset");

        self.timer.disable_clock();
        self.timer.set_compare(ticks);
        self.timer.clear_counter();
        self.timer.clear_pending();
        self.slot = Some(slot);
        self.timer.set_compare_interrupt(true);
        self.timer.enable_clock(self.prescaler);
        self.fresh = true;
    }

    /// Disarm the timer and deregister the slot
    pub fn stop(&mut self) {
        self.timer.disable_clock();
        self.timer.set_compare_interrupt(false);
        self.timer.clear_pending();
        self.slot = None;
        self.fresh = false;
    }

    /// Restart the armed timeout from zero
    ///
    /// Keeps the compare value and the slot. The compare interrupt is
    /// re-enabled if a slot is registered and the prescaler that was
    /// running is restored; a stopped timer stays stopped.
    pub fn reset(&mut self) {
        let prescaler = self.timer.disable_clock();
        self.timer.clear_counter();
        self.timer.clear_pending();
        self.timer.set_compare_interrupt(self.slot.is_some());
        if let Some(prescaler) = prescaler {
            self.timer.enable_clock(prescaler);
        }
        self.fresh = false;
    }

    /// Compare-match interrupt entry
    ///
    /// Clears the pending flag and returns the registered slot, or `None`
    /// for a spurious match on a stopped timer. The client is expected to
    /// re-arm or stop the timer before returning from the interrupt.
    pub fn on_compare_match(&mut self) -> Option<K> {
        self.timer.clear_pending();
        self.fresh = false;
        self.slot
    }

    /// Currently registered slot
    pub fn slot(&self) -> Option<K> {
        self.slot
    }

    /// Check whether a timeout is armed
    pub fn is_armed(&self) -> bool {
        self.slot.is_some()
    }

    /// Access the underlying timer
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Access the underlying timer mutably
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}
