//! Fire simulation
//!
//! One heat cell per pixel. Each frame the cells cool a little, heat drifts
//! up the strip and new sparks ignite near the bottom. Heat is mapped to a
//! black → red → yellow → white palette.

use ember_core::traits::{FireParams, Rgb};
use rand_core::RngCore;

/// Cells at the bottom of the strip where sparks may ignite
pub const SPARK_ZONE: usize = 7;

/// Minimum heat added by a spark
pub const SPARK_MIN_HEAT: u8 = 160;

/// Scale `value` by `scale / 256`
const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (1 + scale as u16)) >> 8) as u8
}

/// Uniform random value in `0..bound`, 0 for an empty range
fn random_below<R: RngCore>(rng: &mut R, bound: u32) -> u32 {
    if bound == 0 {
        0
    } else {
        rng.next_u32() % bound
    }
}

/// Per-pixel heat
#[derive(Debug, Clone)]
pub struct HeatMap<const N: usize> {
    cells: [u8; N],
}

impl<const N: usize> Default for HeatMap<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> HeatMap<N> {
    /// Cold map
    pub const fn new() -> Self {
        Self { cells: [0; N] }
    }

    /// Heat values, bottom of the strip first
    pub fn cells(&self) -> &[u8; N] {
        &self.cells
    }

    /// Advance the simulation by one frame
    pub fn step<R: RngCore>(&mut self, params: FireParams, rng: &mut R) {
        if N == 0 {
            return;
        }

        // Cool every cell
        let max_cooling = params.cooling as u32 * 10 / N as u32 + 2;
        for cell in self.cells.iter_mut() {
            let cooling = random_below(rng, max_cooling).min(u8::MAX as u32) as u8;
            *cell = cell.saturating_sub(cooling);
        }

        // Drift up and diffuse
        for k in (2..N).rev() {
            let sum = self.cells[k - 1] as u16 + 2 * self.cells[k - 2] as u16;
            self.cells[k] = (sum / 3) as u8;
        }

        // Ignite
        if random_below(rng, 256) < params.sparking as u32 {
            let y = random_below(rng, SPARK_ZONE.min(N) as u32) as usize;
            let spark = SPARK_MIN_HEAT + random_below(rng, (u8::MAX - SPARK_MIN_HEAT) as u32) as u8;
            self.cells[y] = self.cells[y].saturating_add(spark);
        }
    }

    /// Write the palette colors for the current heat into `pixels`
    pub fn render(&self, pixels: &mut [Rgb; N]) {
        for (px, &heat) in pixels.iter_mut().zip(self.cells.iter()) {
            *px = heat_color(heat);
        }
    }

    #[cfg(test)]
    pub(crate) fn cells_mut(&mut self) -> &mut [u8; N] {
        &mut self.cells
    }
}

/// Map heat to a black body color
pub fn heat_color(heat: u8) -> Rgb {
    // 0..=191 in three bands of 64
    let t = scale8(heat, 191);
    let ramp = (t & 0x3F) << 2;

    if t & 0x80 != 0 {
        Rgb::new(255, 255, ramp)
    } else if t & 0x40 != 0 {
        Rgb::new(255, ramp, 0)
    } else {
        Rgb::new(ramp, 0, 0)
    }
}
