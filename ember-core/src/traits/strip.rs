//! LED strip trait
//!
//! Abstracts over the pixel buffer, its push to hardware and the per-frame
//! effect math, so the dispatch loop can be tested without a bus.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::render::{CancelToken, Cancelled};

/// Pixel color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// All channels off
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create a color
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Fire effect parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FireParams {
    /// How much each cell cools per frame, scaled by strip length
    pub cooling: u8,
    /// Chance (out of 255) of a new spark per frame
    pub sparking: u8,
}

impl Default for FireParams {
    fn default() -> Self {
        Self {
            cooling: 55,
            sparking: 120,
        }
    }
}

/// Errors from strip operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StripError {
    /// The data bus reported an error
    Bus,
    /// Pixel index beyond the strip length
    OutOfRange,
}

/// Why a render pass did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderError {
    /// Stopped at a checkpoint
    Cancelled,
    /// Strip failure
    Strip(StripError),
}

impl From<Cancelled> for RenderError {
    fn from(_: Cancelled) -> Self {
        RenderError::Cancelled
    }
}

impl From<StripError> for RenderError {
    fn from(e: StripError) -> Self {
        RenderError::Strip(e)
    }
}

/// Addressable LED strip with a local pixel buffer
pub trait LedStrip {
    /// Number of pixels
    fn len(&self) -> usize;

    /// Check if the strip has no pixels
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read a pixel from the buffer
    fn pixel(&self, index: usize) -> Option<Rgb>;

    /// Write a pixel into the buffer (not pushed)
    fn set_pixel(&mut self, index: usize, color: Rgb) -> Result<(), StripError>;

    /// Push the buffer to the strip
    ///
    /// Checks `cancel` before every segment. A pass cancelled before the
    /// first segment performs no bus writes.
    fn update(&mut self, cancel: &CancelToken<'_>) -> Result<(), RenderError>;

    /// Blank the buffer and push it, uncancellable
    fn clear(&mut self) -> Result<(), StripError>;

    /// Advance the fire simulation by one frame
    fn heat_map_update(&mut self);

    /// Derive pixel colors from the fire simulation
    fn rgb_map_update(&mut self);

    /// Current fire parameters
    fn fire_params(&self) -> FireParams;

    /// Change the fire parameters
    fn set_fire_params(&mut self, params: FireParams);
}
