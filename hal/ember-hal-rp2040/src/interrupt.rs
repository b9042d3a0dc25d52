//! Cortex-M0+ interrupt mask

use ember_hal::Interrupts;

/// PRIMASK-based global interrupt control
#[derive(Debug, Default)]
pub struct CortexM;

impl Interrupts for CortexM {
    fn disable(&mut self) -> bool {
        let was_enabled = cortex_m::register::primask::read().is_active();
        cortex_m::interrupt::disable();
        was_enabled
    }

    fn restore(&mut self, was_enabled: bool) {
        if was_enabled {
            // SAFETY: only re-enables what a matching `disable` turned off
            unsafe { cortex_m::interrupt::enable() };
        }
    }

    fn wait_for_interrupt(&mut self) {
        cortex_m::asm::wfi();
    }
}
