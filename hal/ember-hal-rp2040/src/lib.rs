//! RP2040 implementation of the Ember hardware traits
//!
//! - [`timer::AlarmTimer`] - [`CompareTimer`](ember_hal::CompareTimer) on a
//!   TIMER alarm
//! - [`uart::PacUart`] - interrupt-driven [`SerialPort`](ember_hal::SerialPort)
//!   on a PL011 UART
//! - [`interrupt::CortexM`] - PRIMASK and WFI
//!
//! Peripherals are set up with `embassy-rp` (pins, clocks, baud rate);
//! the drivers here then work on the registers directly so that they can
//! run from interrupt handlers without an executor.

#![no_std]

pub mod interrupt;
pub mod timer;
pub mod uart;

pub use interrupt::CortexM;
pub use timer::AlarmTimer;
pub use uart::PacUart;

/// TIMER tick rate (fed from the 1 MHz watchdog tick)
pub const TIMER_HZ: u32 = 1_000_000;
