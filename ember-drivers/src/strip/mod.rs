//! Addressable LED strips

pub mod fire;
pub mod ws2812;

pub use fire::{heat_color, HeatMap};
pub use ws2812::{Ws2812Strip, SEGMENT_PIXELS};
