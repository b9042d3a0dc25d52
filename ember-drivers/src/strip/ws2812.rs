//! WS2812B strip driven from an SPI data line
//!
//! At 3.2 MHz each strip bit (1.25 µs) is four SPI bits: `1000` for a zero
//! and `1110` for a one. Pixels go out in GRB order, most significant bit
//! first, in segments of [`SEGMENT_PIXELS`]. The cancel token is checked
//! before every segment; a pass that stops early leaves the tail of the
//! strip showing the previous frame.

use ember_core::render::CancelToken;
use ember_core::traits::{FireParams, LedStrip, RenderError, Rgb, StripError};
use ember_hal::spi::SpiBus;
use rand_core::RngCore;

use super::fire::HeatMap;

/// Pixels pushed between two cancellation checkpoints
pub const SEGMENT_PIXELS: usize = 8;

/// SPI bytes per color byte
const SPI_PER_BYTE: usize = 4;

/// SPI bytes per pixel
const SPI_PER_PIXEL: usize = 3 * SPI_PER_BYTE;

/// Low time that latches the strip: 300 µs at 3.2 MHz
const LATCH_BYTES: usize = 120;

const LATCH: [u8; LATCH_BYTES] = [0; LATCH_BYTES];

const BIT_ZERO: u8 = 0b1000;
const BIT_ONE: u8 = 0b1110;

/// Expand one color byte into its SPI waveform
pub const fn encode_byte(value: u8) -> [u8; SPI_PER_BYTE] {
    let mut out = [0u8; SPI_PER_BYTE];
    let mut i = 0;
    while i < SPI_PER_BYTE {
        let hi = (value >> (7 - 2 * i)) & 1;
        let lo = (value >> (6 - 2 * i)) & 1;
        let hi = if hi == 1 { BIT_ONE } else { BIT_ZERO };
        let lo = if lo == 1 { BIT_ONE } else { BIT_ZERO };
        out[i] = (hi << 4) | lo;
        i += 1;
    }
    out
}

fn encode_pixel(color: Rgb, out: &mut [u8]) {
    for (chunk, value) in out
        .chunks_exact_mut(SPI_PER_BYTE)
        .zip([color.g, color.r, color.b])
    {
        chunk.copy_from_slice(&encode_byte(value));
    }
}

/// WS2812B strip of `N` pixels with a local frame buffer and fire state
pub struct Ws2812Strip<B, R, const N: usize> {
    bus: B,
    rng: R,
    pixels: [Rgb; N],
    heat: HeatMap<N>,
    fire: FireParams,
}

impl<B: SpiBus, R: RngCore, const N: usize> Ws2812Strip<B, R, N> {
    /// Create a dark strip; nothing is pushed until the first update
    pub fn new(bus: B, rng: R) -> Self {
        Self {
            bus,
            rng,
            pixels: [Rgb::BLACK; N],
            heat: HeatMap::new(),
            fire: FireParams::default(),
        }
    }

    /// Fire simulation state
    pub fn heat(&self) -> &HeatMap<N> {
        &self.heat
    }

    /// Access the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Access the bus mutably
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn push(&mut self, cancel: &CancelToken<'_>) -> Result<(), RenderError> {
        let mut segment = [0u8; SEGMENT_PIXELS * SPI_PER_PIXEL];

        for pixels in self.pixels.chunks(SEGMENT_PIXELS) {
            cancel.checkpoint()?;

            let len = pixels.len() * SPI_PER_PIXEL;
            for (px, out) in pixels.iter().zip(segment.chunks_exact_mut(SPI_PER_PIXEL)) {
                encode_pixel(*px, out);
            }
            self.bus
                .write(&segment[..len])
                .map_err(|_| StripError::Bus)?;
        }

        self.bus.write(&LATCH).map_err(|_| StripError::Bus)?;
        Ok(())
    }
}

impl<B: SpiBus, R: RngCore, const N: usize> LedStrip for Ws2812Strip<B, R, N> {
    fn len(&self) -> usize {
        N
    }

    fn pixel(&self, index: usize) -> Option<Rgb> {
        self.pixels.get(index).copied()
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), StripError> {
        let px = self.pixels.get_mut(index).ok_or(StripError::OutOfRange)?;
        *px = color;
        Ok(())
    }

    fn update(&mut self, cancel: &CancelToken<'_>) -> Result<(), RenderError> {
        self.push(cancel)
    }

    fn clear(&mut self) -> Result<(), StripError> {
        self.pixels = [Rgb::BLACK; N];
        self.push(&CancelToken::never()).map_err(|e| match e {
            RenderError::Strip(e) => e,
            RenderError::Cancelled => StripError::Bus,
        })
    }

    fn heat_map_update(&mut self) {
        self.heat.step(self.fire, &mut self.rng);
    }

    fn rgb_map_update(&mut self) {
        self.heat.render(&mut self.pixels);
    }

    fn fire_params(&self) -> FireParams {
        self.fire
    }

    fn set_fire_params(&mut self, params: FireParams) {
        self.fire = params;
    }
}
