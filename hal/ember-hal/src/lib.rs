//! Ember Hardware Abstraction Layer
//!
//! This crate defines the hardware traits that the board-agnostic logic in
//! `ember-core` is written against. Chip-specific HALs (currently the RP2040)
//! implement them on top of real peripherals; host tests implement them with
//! mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (ember-firmware)           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ember-core (timing, dispatch, render)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ember-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  ember-hal-   │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`timer::CompareTimer`] - Counter with a compare-match interrupt
//! - [`uart::SerialPort`] - Interrupt-driven serial line
//! - [`spi::SpiBus`] - SPI bus output (LED strip data line)
//! - [`interrupt::Interrupts`] - Global interrupt mask and core sleep

#![no_std]
#![deny(unsafe_code)]

pub mod interrupt;
pub mod spi;
pub mod timer;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use interrupt::Interrupts;
pub use spi::SpiBus;
pub use timer::{CompareTimer, Prescaler};
pub use uart::{LineErrors, SerialPort, TxState, UartConfig};
