//! Render cadence timer
//!
//! A free-running periodic timer. Each period it promotes `updated` to
//! `update` unless an abort is pending. It never stops while rendering is
//! suspended, so the cadence does not drift across Modbus transactions.

use ember_hal::timer::{CompareTimer, Prescaler};

use crate::render::RenderState;

/// Periodic compare timer feeding the render flags
#[derive(Debug)]
pub struct CyclicTimer<T> {
    timer: T,
    prescaler: Prescaler,
}

impl<T: CompareTimer> CyclicTimer<T> {
    /// Take ownership of `timer`, leaving it stopped
    pub fn new(mut timer: T, prescaler: Prescaler) -> Self {
        timer.disable_clock();
        timer.set_compare_interrupt(false);
        timer.clear_pending();
        Self { timer, prescaler }
    }

    /// Start firing every `period_ticks`
    pub fn start(&mut self, period_ticks: u32) {
        self.timer.disable_clock();
        self.timer.set_compare(period_ticks);
        self.timer.clear_counter();
        self.timer.clear_pending();
        self.timer.set_compare_interrupt(true);
        self.timer.enable_clock(self.prescaler);
    }

    /// Stop the timer
    pub fn stop(&mut self) {
        self.timer.disable_clock();
        self.timer.set_compare_interrupt(false);
        self.timer.clear_pending();
    }

    /// Check whether the timer is running
    pub fn is_running(&self) -> bool {
        self.timer.compare_interrupt_enabled()
    }

    /// Compare-match interrupt entry
    ///
    /// Returns true if a render pass was requested.
    pub fn on_compare_match(&mut self, render: &RenderState) -> bool {
        self.timer.clear_pending();
        render.promote_due()
    }

    /// Access the underlying timer mutably
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}
