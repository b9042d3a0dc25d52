//! Configuration types
//!
//! Board-agnostic link and strip parameters. The firmware generates these
//! from `ember.toml` at build time, so everything here is usable in `const`
//! context.

use ember_hal::timer::Prescaler;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::timing::ticks::{self, SilenceTicks};

/// Clock feeding a compare timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickClock {
    /// Timer input clock in Hz, before the prescaler
    pub input_hz: u32,
    /// Prescaler applied to the input clock
    pub prescaler: Prescaler,
}

impl TickClock {
    /// Create a clock description
    pub const fn new(input_hz: u32, prescaler: Prescaler) -> Self {
        Self {
            input_hz,
            prescaler,
        }
    }

    /// Counter frequency after the prescaler
    pub const fn tick_hz(&self) -> u32 {
        self.input_hz / self.prescaler.divisor()
    }

    /// Convert a duration in microseconds into ticks, rounded to nearest
    pub const fn ticks_for_us(&self, us: u32) -> u32 {
        ticks::ticks_for_us(us, self.input_hz, self.prescaler.divisor())
    }
}

/// Modbus serial link parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Slave address (1-247)
    pub address: u8,
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Bits per character on the line, start and stop bits included
    pub bits_per_char: u32,
}

impl Default for LinkConfig {
    /// Slave 1 at 19200 8E1
    fn default() -> Self {
        Self {
            address: 1,
            baudrate: 19200,
            bits_per_char: 11,
        }
    }
}

impl LinkConfig {
    /// Check if the slave address is a valid unicast address
    pub const fn is_valid(&self) -> bool {
        self.address >= 1 && self.address <= 247 && self.baudrate > 0 && self.bits_per_char > 0
    }

    /// Silence timeouts for this link in ticks of `clock`
    pub const fn silence(&self, clock: TickClock) -> SilenceTicks {
        SilenceTicks::new(self.baudrate, self.bits_per_char, clock)
    }
}

/// LED strip and render cadence parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StripConfig {
    /// Render cadence in milliseconds (cyclic timer period)
    pub frame_period_ms: u32,
    /// Effect selected at boot (register value)
    pub effect: u16,
    /// Fire cooling rate
    pub cooling: u8,
    /// Fire sparking chance (out of 255)
    pub sparking: u8,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            frame_period_ms: 20,
            effect: 0,
            cooling: 55,
            sparking: 120,
        }
    }
}

impl StripConfig {
    /// Cyclic timer period in ticks of `clock`
    pub const fn period_ticks(&self, clock: TickClock) -> u32 {
        clock.ticks_for_us(self.frame_period_ms * 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_clock_avr_style() {
        let clock = TickClock::new(16_000_000, Prescaler::Div256);
        assert_eq!(clock.tick_hz(), 62_500);
        // 750 µs / 16 µs = 46.875
        assert_eq!(clock.ticks_for_us(750), 47);
    }

    #[test]
    fn test_default_link_is_valid() {
        assert!(LinkConfig::default().is_valid());
        let broadcast = LinkConfig {
            address: 0,
            ..Default::default()
        };
        assert!(!broadcast.is_valid());
    }

    #[test]
    fn test_strip_period_ticks() {
        let clock = TickClock::new(16_000_000, Prescaler::Div64);
        let strip = StripConfig::default();
        // 20 ms at 250 kHz
        assert_eq!(strip.period_ticks(clock), 5000);
    }
}
