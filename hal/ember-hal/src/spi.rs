//! SPI bus abstractions
//!
//! Only the transmit direction is needed: the LED strip data line is driven
//! from MOSI, with the SPI clock chosen so that a few SPI bits encode one
//! strip bit.

/// SPI bus master, transmit only
pub trait SpiBus {
    /// Error type for SPI operations
    type Error;

    /// Write data, blocking until it has been shifted out
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

/// Clock polarity and phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl Mode {
    /// Clock idles high
    pub const fn idle_high(self) -> bool {
        matches!(self, Mode::Mode2 | Mode::Mode3)
    }

    /// Data captured on the second clock edge
    pub const fn second_edge(self) -> bool {
        matches!(self, Mode::Mode1 | Mode::Mode3)
    }
}

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    pub mode: Mode,
}

impl SpiConfig {
    /// Duration of one SPI bit in nanoseconds, rounded down
    pub const fn bit_ns(&self) -> u32 {
        1_000_000_000 / self.frequency
    }
}

impl Default for SpiConfig {
    /// 3.2 MHz mode 0: four SPI bits per WS2812B bit (1.25 µs)
    fn default() -> Self {
        Self {
            frequency: 3_200_000,
            mode: Mode::Mode0,
        }
    }
}
