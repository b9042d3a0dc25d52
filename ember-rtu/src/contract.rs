//! Contract between the RTU protocol layer and the link it runs on
//!
//! The protocol layer receives line events (bytes and silence timeouts) and
//! asks the link for timer changes, transmissions and render suspension.
//! Every request is a variant of a small closed set, so the link dispatches
//! them with a `match` instead of through stored function pointers.

use crate::pdu::ExceptionCode;

/// Timer changes the protocol layer may request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerRequest {
    /// Arm the 1.5 character inter-character timeout
    ArmInterChar,
    /// Arm the 3.5 character inter-frame timeout
    ArmInterFrame,
    /// Disarm the silence timer
    Stop,
    /// Restart the active timeout from zero
    Reset,
}

/// Events delivered from the line to the protocol layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineEvent {
    /// Byte received cleanly
    Byte(u8),
    /// Byte received with a framing, parity, overrun or break error
    ByteError(u8),
    /// 1.5 characters of silence after the last byte
    InterCharTimeout,
    /// 3.5 characters of silence, the line is idle
    InterFrameTimeout,
}

impl LineEvent {
    /// Check if this event carries a received byte
    pub fn is_byte(&self) -> bool {
        matches!(self, LineEvent::Byte(_) | LineEvent::ByteError(_))
    }
}

/// Services the link provides to the protocol layer
///
/// Called from interrupt context (line events, transmit complete) and from
/// the main loop (`advance`). Implementations only set flags and drive
/// their own peripherals.
pub trait LinkHooks {
    /// Apply a timer request
    fn timer(&mut self, request: TimerRequest);

    /// Start transmitting a complete frame
    ///
    /// The link must call [`RtuStack::on_sent`] once the last byte has
    /// left the line.
    fn send(&mut self, adu: &[u8]);

    /// Ask the background renderer to stop at its next checkpoint
    fn suspend(&mut self);

    /// Let the background renderer continue
    fn resume(&mut self);
}

/// Holding register storage addressed by Modbus requests
pub trait RegisterBank {
    /// Read one holding register
    fn read_holding(&mut self, address: u16) -> Result<u16, ExceptionCode>;

    /// Write one holding register
    fn write_holding(&mut self, address: u16, value: u16) -> Result<(), ExceptionCode>;

    /// Check that `value` would be accepted at `address`, without writing it
    ///
    /// Must return the error [`write_holding`](Self::write_holding) would
    /// return for the same arguments.
    fn check_write(&self, address: u16, value: u16) -> Result<(), ExceptionCode>;
}

/// A serial-line protocol stack driven by line events
pub trait RtuStack {
    /// Reset the state machine and wait for the line to go idle
    fn start<H: LinkHooks>(&mut self, hooks: &mut H);

    /// Handle a line event (interrupt context)
    fn on_event<H: LinkHooks>(&mut self, event: LineEvent, hooks: &mut H);

    /// Handle transmit completion (interrupt context)
    fn on_sent<H: LinkHooks>(&mut self, hooks: &mut H);

    /// Process one step of deferred work (main loop, interrupts disabled)
    fn advance<B: RegisterBank, H: LinkHooks>(&mut self, bank: &mut B, hooks: &mut H);

    /// Check whether no frame is in progress and no reply is pending
    fn is_idle(&self) -> bool;
}
