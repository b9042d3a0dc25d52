//! Compile-time tick math for the Modbus silence timeouts
//!
//! From 19200 baud up, Modbus over serial line fixes the timeouts at
//! 750 µs and 1750 µs; below that they scale with the character time.

use crate::config::TickClock;

/// Baud rate from which the fixed timeouts apply
pub const FIXED_TIMEOUT_BAUD: u32 = 19200;

/// Inter-character timeout above [`FIXED_TIMEOUT_BAUD`]
pub const INTER_CHAR_FIXED_US: u32 = 750;

/// Inter-frame timeout above [`FIXED_TIMEOUT_BAUD`]
pub const INTER_FRAME_FIXED_US: u32 = 1750;

/// Round `num / den` to the nearest integer
const fn div_round(num: u64, den: u64) -> u64 {
    (num + den / 2) / den
}

/// Duration of `tenths` / 10 characters in microseconds
const fn chars_us(tenths: u32, baudrate: u32, bits_per_char: u32) -> u32 {
    div_round(
        tenths as u64 * bits_per_char as u64 * 100_000,
        baudrate as u64,
    ) as u32
}

/// 1.5 character timeout in microseconds
pub const fn inter_char_us(baudrate: u32, bits_per_char: u32) -> u32 {
    if baudrate >= FIXED_TIMEOUT_BAUD {
        INTER_CHAR_FIXED_US
    } else {
        chars_us(15, baudrate, bits_per_char)
    }
}

/// 3.5 character timeout in microseconds
pub const fn inter_frame_us(baudrate: u32, bits_per_char: u32) -> u32 {
    if baudrate >= FIXED_TIMEOUT_BAUD {
        INTER_FRAME_FIXED_US
    } else {
        chars_us(35, baudrate, bits_per_char)
    }
}

/// Convert microseconds to timer ticks, rounded to the nearest tick
///
/// `tick period = divisor / input_hz`, so
/// `ticks = us * input_hz / (divisor * 1e6)`.
pub const fn ticks_for_us(us: u32, input_hz: u32, divisor: u32) -> u32 {
    div_round(us as u64 * input_hz as u64, divisor as u64 * 1_000_000) as u32
}

/// Both silence timeouts expressed in timer ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SilenceTicks {
    /// 1.5T
    pub inter_char: u32,
    /// 3.5T
    pub inter_frame: u32,
}

impl SilenceTicks {
    /// Derive the timeouts for a link running at `baudrate`
    pub const fn new(baudrate: u32, bits_per_char: u32, clock: TickClock) -> Self {
        Self {
            inter_char: clock.ticks_for_us(inter_char_us(baudrate, bits_per_char)),
            inter_frame: clock.ticks_for_us(inter_frame_us(baudrate, bits_per_char)),
        }
    }

    /// Ticks between the 1.5T and the 3.5T deadline
    ///
    /// Armed after the inter-character timeout so that the inter-frame
    /// timeout still expires 3.5T after the last byte.
    pub const fn remainder(&self) -> u32 {
        self.inter_frame.saturating_sub(self.inter_char)
    }
}
