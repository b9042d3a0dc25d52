//! Compare timer on an RP2040 TIMER alarm
//!
//! The RP2040 TIMER is a free-running 1 MHz counter with four alarms that
//! match against its low 32 bits. [`AlarmTimer`] turns one alarm into the
//! clear-on-match counter [`CompareTimer`] describes: the counter is the
//! distance from a software origin, the prescaler divides that distance,
//! and [`AlarmTimer::on_alarm`] moves the origin forward by one period and
//! re-arms, which is the auto-reload.
//!
//! A compare value already behind the counter does not match until the
//! 32-bit counter wraps, as on a hardware CTC counter.

use embassy_rp::pac;
use ember_hal::timer::{CompareTimer, Prescaler};

fn now() -> u32 {
    pac::TIMER.timerawl().read()
}

/// One TIMER alarm
#[derive(Debug)]
pub struct AlarmTimer {
    alarm: usize,
    compare: u32,
    /// Raw time at which the counter read zero
    origin: u32,
    /// Counter value while the clock is stopped
    held: u32,
    prescaler: Option<Prescaler>,
    pending: bool,
}

impl AlarmTimer {
    /// Take alarm `alarm` (0-3), disarmed and with its interrupt masked
    ///
    /// The alarm must not be used by anything else; in particular
    /// `embassy-rp` must be built without its time driver.
    pub fn new(alarm: usize) -> Self {
        assert!(alarm < 4);
        let timer = Self {
            alarm,
            compare: 0,
            origin: 0,
            held: 0,
            prescaler: None,
            pending: false,
        };
        timer.disarm();
        pac::TIMER.inte().modify(|w| w.set_alarm(alarm, false));
        pac::TIMER.intr().write(|w| w.set_alarm(alarm, true));
        timer
    }

    /// Alarm interrupt entry, call first thing in the `TIMER_IRQ_n` handler
    ///
    /// Acknowledges the hardware, latches the pending flag and restarts
    /// the counter for the next period.
    pub fn on_alarm(&mut self) {
        pac::TIMER.intr().write(|w| w.set_alarm(self.alarm, true));
        self.pending = true;
        if let Some(p) = self.prescaler {
            self.origin = self
                .origin
                .wrapping_add(self.compare.wrapping_mul(p.divisor()));
            self.arm();
        }
    }

    fn arm(&self) {
        if let Some(p) = self.prescaler {
            let target = self
                .origin
                .wrapping_add(self.compare.wrapping_mul(p.divisor()));
            pac::TIMER.alarm(self.alarm).write_value(target);
        }
    }

    fn disarm(&self) {
        pac::TIMER.armed().write(|w| w.set_armed(1 << self.alarm));
    }
}

impl CompareTimer for AlarmTimer {
    fn set_compare(&mut self, ticks: u32) {
        self.compare = ticks;
        self.arm();
    }

    fn compare(&self) -> u32 {
        self.compare
    }

    fn clear_counter(&mut self) {
        self.held = 0;
        if self.prescaler.is_some() {
            self.origin = now();
            self.arm();
        }
    }

    fn counter(&self) -> u32 {
        match self.prescaler {
            Some(p) => now().wrapping_sub(self.origin) / p.divisor(),
            None => self.held,
        }
    }

    fn enable_clock(&mut self, prescaler: Prescaler) {
        if self.prescaler.is_none() {
            self.origin = now().wrapping_sub(self.held.wrapping_mul(prescaler.divisor()));
        }
        self.prescaler = Some(prescaler);
        self.arm();
    }

    fn disable_clock(&mut self) -> Option<Prescaler> {
        self.held = self.counter();
        self.disarm();
        self.prescaler.take()
    }

    fn set_compare_interrupt(&mut self, enabled: bool) {
        pac::TIMER.inte().modify(|w| w.set_alarm(self.alarm, enabled));
    }

    fn compare_interrupt_enabled(&self) -> bool {
        pac::TIMER.inte().read().alarm(self.alarm)
    }

    fn clear_pending(&mut self) {
        self.pending = false;
        pac::TIMER.intr().write(|w| w.set_alarm(self.alarm, true));
    }

    fn is_pending(&self) -> bool {
        self.pending || pac::TIMER.intr().read().alarm(self.alarm)
    }
}
