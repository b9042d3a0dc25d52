//! Hardware-timer based timing
//!
//! Two independent timers: one one-shot timer shared by the two Modbus
//! silence timeouts, and one periodic timer driving the render cadence.

pub mod cyclic;
pub mod frame;
pub mod precision;
pub mod ticks;

pub use cyclic::CyclicTimer;
pub use frame::{FrameTiming, TimeoutKind};
pub use precision::PrecisionTimer;
pub use ticks::SilenceTicks;

#[cfg(test)]
pub(crate) mod mock {
    use ember_hal::timer::{CompareTimer, Prescaler};

    /// Register-level model of a CTC compare timer
    #[derive(Debug, Default)]
    pub struct MockTimer {
        pub compare: u32,
        pub counter: u32,
        pub clock: Option<Prescaler>,
        pub interrupt: bool,
        pub pending: bool,
    }

    impl MockTimer {
        /// Advance the counter by `ticks` while the clock runs
        ///
        /// Returns true if the compare interrupt would fire.
        pub fn run(&mut self, ticks: u32) -> bool {
            if self.clock.is_none() {
                return false;
            }
            for _ in 0..ticks {
                self.counter += 1;
                if self.counter >= self.compare {
                    self.counter = 0;
                    self.pending = true;
                }
            }
            self.pending && self.interrupt
        }
    }

    impl CompareTimer for MockTimer {
        fn set_compare(&mut self, ticks: u32) {
            self.compare = ticks;
        }

        fn compare(&self) -> u32 {
            self.compare
        }

        fn clear_counter(&mut self) {
            self.counter = 0;
        }

        fn counter(&self) -> u32 {
            self.counter
        }

        fn enable_clock(&mut self, prescaler: Prescaler) {
            self.clock = Some(prescaler);
        }

        fn disable_clock(&mut self) -> Option<Prescaler> {
            self.clock.take()
        }

        fn set_compare_interrupt(&mut self, enabled: bool) {
            self.interrupt = enabled;
        }

        fn compare_interrupt_enabled(&self) -> bool {
            self.interrupt
        }

        fn clear_pending(&mut self) {
            self.pending = false;
        }

        fn is_pending(&self) -> bool {
            self.pending
        }
    }
}
