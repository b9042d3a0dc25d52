//! Modbus RTU frame timing
//!
//! Turns received bytes and compare matches into the four line events the
//! protocol layer understands. Every byte, including bytes with line errors,
//! restarts the 1.5T inter-character timeout. When that expires the
//! remaining 2T are armed so that the inter-frame timeout lands exactly 3.5T
//! after the last byte. The inter-frame timeout fires once and leaves the
//! timer stopped.
//!
//! Whether an error byte spoils the frame is the protocol layer's call; it
//! only sees [`LineEvent::ByteError`] instead of [`LineEvent::Byte`].

use ember_hal::timer::CompareTimer;
use ember_hal::uart::LineErrors;
use ember_rtu::{LineEvent, TimerRequest};

use super::precision::PrecisionTimer;
use super::ticks::SilenceTicks;

/// Timeout kinds sharing the frame timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeoutKind {
    /// 1.5T between two bytes of one frame
    InterChar,
    /// 3.5T of silence marking the end of a frame
    InterFrame,
}

/// Silence detector driving one precision timer
#[derive(Debug)]
pub struct FrameTiming<T> {
    timer: PrecisionTimer<T, TimeoutKind>,
    ticks: SilenceTicks,
}

impl<T: CompareTimer> FrameTiming<T> {
    /// Create a stopped silence detector
    pub fn new(timer: PrecisionTimer<T, TimeoutKind>, ticks: SilenceTicks) -> Self {
        Self { timer, ticks }
    }

    /// Timeout currently armed
    pub fn active(&self) -> Option<TimeoutKind> {
        self.timer.slot()
    }

    /// Configured timeouts
    pub fn ticks(&self) -> SilenceTicks {
        self.ticks
    }

    /// Byte received (UART interrupt)
    pub fn on_byte(&mut self, byte: u8, errors: LineErrors) -> LineEvent {
        if self.active() == Some(TimeoutKind::InterChar) {
            self.timer.reset();
        } else {
            self.arm(TimeoutKind::InterChar, self.ticks.inter_char);
        }

        if errors.any() {
            LineEvent::ByteError(byte)
        } else {
            LineEvent::Byte(byte)
        }
    }

    /// Compare match (timer interrupt)
    pub fn on_expired(&mut self) -> Option<LineEvent> {
        match self.timer.on_compare_match()? {
            TimeoutKind::InterChar => {
                self.arm(TimeoutKind::InterFrame, self.ticks.remainder());
                Some(LineEvent::InterCharTimeout)
            }
            TimeoutKind::InterFrame => {
                self.timer.stop();
                Some(LineEvent::InterFrameTimeout)
            }
        }
    }

    /// Apply a timer request from the protocol layer
    pub fn apply(&mut self, request: TimerRequest) {
        match request {
            TimerRequest::ArmInterChar => self.arm(TimeoutKind::InterChar, self.ticks.inter_char),
            TimerRequest::ArmInterFrame => {
                self.arm(TimeoutKind::InterFrame, self.ticks.inter_frame)
            }
            TimerRequest::Stop => self.timer.stop(),
            TimerRequest::Reset => self.timer.reset(),
        }
    }

    /// Access the precision timer
    pub fn timer(&self) -> &PrecisionTimer<T, TimeoutKind> {
        &self.timer
    }

    /// Access the precision timer mutably
    pub fn timer_mut(&mut self) -> &mut PrecisionTimer<T, TimeoutKind> {
        &mut self.timer
    }

    fn arm(&mut self, kind: TimeoutKind, ticks: u32) {
        // Replaces whatever was armed before
        self.timer.reset();
        self.timer.start(ticks, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::mock::MockTimer;
    use ember_hal::timer::Prescaler;

    const TICKS: SilenceTicks = SilenceTicks {
        inter_char: 47,
        inter_frame: 109,
    };

    fn timing() -> FrameTiming<MockTimer> {
        FrameTiming::new(
            PrecisionTimer::new(MockTimer::default(), Prescaler::Div256),
            TICKS,
        )
    }

    /// Run the timer and deliver the compare match if it fires
    fn run(t: &mut FrameTiming<MockTimer>, ticks: u32) -> Option<LineEvent> {
        if t.timer_mut().timer_mut().run(ticks) {
            t.on_expired()
        } else {
            None
        }
    }

    #[test]
    fn test_byte_arms_inter_char() {
        let mut t = timing();
        assert_eq!(t.on_byte(0x01, LineErrors::NONE), LineEvent::Byte(0x01));
        assert_eq!(t.active(), Some(TimeoutKind::InterChar));
        assert_eq!(t.timer().timer().compare, 47);
    }

    #[test]
    fn test_each_byte_restarts_inter_char() {
        let mut t = timing();
        t.on_byte(0x01, LineErrors::NONE);
        assert_eq!(run(&mut t, 40), None);
        t.on_byte(0x02, LineErrors::NONE);
        assert_eq!(run(&mut t, 40), None);
        assert_eq!(run(&mut t, 7), Some(LineEvent::InterCharTimeout));
    }

    #[test]
    fn test_inter_frame_lands_at_3t5() {
        let mut t = timing();
        t.on_byte(0x01, LineErrors::NONE);

        assert_eq!(run(&mut t, 47), Some(LineEvent::InterCharTimeout));
        assert_eq!(t.active(), Some(TimeoutKind::InterFrame));
        assert_eq!(run(&mut t, 61), None);
        assert_eq!(run(&mut t, 1), Some(LineEvent::InterFrameTimeout));
    }

    #[test]
    fn test_inter_frame_fires_once() {
        let mut t = timing();
        t.apply(TimerRequest::ArmInterFrame);
        assert_eq!(t.timer().timer().compare, 109);

        assert_eq!(run(&mut t, 109), Some(LineEvent::InterFrameTimeout));
        assert_eq!(t.active(), None);
        assert!(!t.timer().timer().interrupt);
        assert_eq!(run(&mut t, 1000), None);
    }

    #[test]
    fn test_parity_error_byte_is_tagged() {
        let mut t = timing();
        let errors = LineErrors {
            parity: true,
            ..LineErrors::NONE
        };
        assert_eq!(t.on_byte(0x55, errors), LineEvent::ByteError(0x55));
        // Error bytes still consume line time
        assert_eq!(t.active(), Some(TimeoutKind::InterChar));
    }

    #[test]
    fn test_arming_one_kind_disarms_the_other() {
        let mut t = timing();
        t.apply(TimerRequest::ArmInterFrame);
        run(&mut t, 30);
        t.apply(TimerRequest::ArmInterChar);
        assert_eq!(t.active(), Some(TimeoutKind::InterChar));
        assert_eq!(t.timer().timer().counter, 0);
        assert_eq!(run(&mut t, 47), Some(LineEvent::InterCharTimeout));

        t.apply(TimerRequest::ArmInterFrame);
        assert_eq!(t.active(), Some(TimeoutKind::InterFrame));
        assert_eq!(run(&mut t, 108), None);
        assert_eq!(run(&mut t, 1), Some(LineEvent::InterFrameTimeout));
    }

    #[test]
    fn test_byte_during_inter_frame_switches_to_inter_char() {
        let mut t = timing();
        t.on_byte(0x01, LineErrors::NONE);
        run(&mut t, 47);
        run(&mut t, 10);
        t.on_byte(0x02, LineErrors::NONE);

        assert_eq!(t.active(), Some(TimeoutKind::InterChar));
        assert_eq!(t.timer().timer().compare, 47);
    }

    #[test]
    fn test_stop_request() {
        let mut t = timing();
        t.on_byte(0x01, LineErrors::NONE);
        t.apply(TimerRequest::Stop);
        assert_eq!(t.active(), None);
        assert_eq!(run(&mut t, 100), None);
    }
}
