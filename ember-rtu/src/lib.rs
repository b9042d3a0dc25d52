//! Modbus RTU slave for the Ember LED controller
//!
//! This crate holds the serial-line Modbus protocol layer: the application
//! data unit codec, the PDU handlers for holding registers, and the slave
//! state machine that turns line events into requests and replies.
//!
//! # Frame Overview
//!
//! ```text
//! ┌─────────┬──────────┬─────────────┬──────────┐
//! │ ADDRESS │ FUNCTION │ DATA        │ CRC      │
//! │ 1B      │ 1B       │ 0–252B      │ 2B (LE)  │
//! └─────────┴──────────┴─────────────┴──────────┘
//! ```
//!
//! Frames are delimited by silence on the line, not by a start byte. The
//! slave never touches timers or the UART itself; it talks to the outside
//! world through the [`contract`] traits, which the firmware implements on
//! top of the frame-timing core in `ember-core`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod contract;
pub mod frame;
pub mod pdu;
pub mod slave;

pub use contract::{LineEvent, LinkHooks, RegisterBank, RtuStack, TimerRequest};
pub use frame::{crc16, Adu, FrameError, BROADCAST_ADDRESS, MAX_ADU_SIZE};
pub use pdu::{ExceptionCode, Request};
pub use slave::{RtuSlave, SlaveState, SlaveStats};
