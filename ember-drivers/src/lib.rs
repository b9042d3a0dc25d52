//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in ember-core:
//!
//! - WS2812B strip driven from an SPI data line
//! - Fire2012-style heat simulation for the fire effect
//! - Adapter from `embedded-hal` SPI buses to the Ember SPI trait

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod strip;

pub use bus::HalSpi;
pub use strip::{Ws2812Strip, SEGMENT_PIXELS};
