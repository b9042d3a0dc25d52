//! Compile-time configuration
//!
//! The raw values come from `ember.toml` through build.rs; everything
//! derived from them (tick counts, UART framing) is computed here in const
//! context so a bad combination fails the build rather than the board.

use ember_core::config::{LinkConfig, StripConfig, TickClock};
use ember_core::timing::SilenceTicks;
use ember_core::traits::FireParams;
use ember_hal::spi::{Mode, SpiConfig};
use ember_hal::timer::Prescaler;
use ember_hal::uart::{DataBits, UartConfig};
use ember_hal_rp2040::TIMER_HZ;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/ember_config.rs"));
}

pub use generated::PIXELS;

/// TIMER alarm used for the 1.5T / 3.5T silence timeouts
pub const FRAME_ALARM: usize = 1;

/// TIMER alarm used for the render cadence
pub const CYCLIC_ALARM: usize = 2;

/// Both timers count microseconds
pub const CLOCK: TickClock = TickClock::new(TIMER_HZ, Prescaler::Div1);

pub const UART: UartConfig = UartConfig {
    baudrate: generated::BAUDRATE,
    data_bits: DataBits::Eight,
    parity: generated::PARITY,
    stop_bits: generated::STOP_BITS,
};

pub const LINK: LinkConfig = LinkConfig {
    address: generated::SLAVE_ADDRESS,
    baudrate: generated::BAUDRATE,
    bits_per_char: UART.bits_per_char(),
};

pub const STRIP: StripConfig = StripConfig {
    frame_period_ms: generated::FRAME_PERIOD_MS,
    effect: generated::EFFECT,
    cooling: generated::COOLING,
    sparking: generated::SPARKING,
};

pub const FIRE: FireParams = FireParams {
    cooling: STRIP.cooling,
    sparking: STRIP.sparking,
};

pub const SILENCE: SilenceTicks = LINK.silence(CLOCK);

pub const FRAME_TICKS: u32 = STRIP.period_ticks(CLOCK);

/// 3.2 MHz mode 0, four SPI bits per strip bit
pub const SPI: SpiConfig = SpiConfig {
    frequency: 3_200_000,
    mode: Mode::Mode0,
};

const _: () = assert!(LINK.is_valid());
const _: () = assert!(SILENCE.inter_char > 0 && SILENCE.inter_char < SILENCE.inter_frame);
