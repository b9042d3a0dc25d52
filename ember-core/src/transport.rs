//! Serial transport adapter
//!
//! Wraps a [`SerialPort`] into a single event stream for the UART interrupt
//! handler: received bytes (tagged with their line errors) and exactly one
//! `Sent` per transmission, reported once the last byte has left the line.
//! The adapter never drops or retries bytes.

use ember_hal::uart::{LineErrors, SerialPort, TxState};

/// Events produced by [`SerialTransport::service`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportEvent {
    /// Byte received without line errors
    Byte(u8),
    /// Byte received with line errors
    ByteError(u8, LineErrors),
    /// The transmission started by `send` has completed
    Sent,
}

/// Errors when starting a transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// A transmission is still in progress
    Busy,
    /// The port refused the data
    Port,
}

/// Interrupt-driven serial transport
#[derive(Debug)]
pub struct SerialTransport<P> {
    port: P,
    sending: bool,
}

impl<P: SerialPort> SerialTransport<P> {
    /// Wrap a configured port
    pub fn new(port: P) -> Self {
        Self {
            port,
            sending: false,
        }
    }

    /// Start transmitting `frame` in the background
    pub fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.sending {
            return Err(TransportError::Busy);
        }
        self.port
            .start_write(frame)
            .map_err(|_| TransportError::Port)?;
        self.sending = true;
        Ok(())
    }

    /// Check whether a transmission is in progress
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Next event, if any
    ///
    /// Call repeatedly from the UART interrupt until it returns `None`.
    pub fn service(&mut self) -> Option<TransportEvent> {
        if let Some((byte, errors)) = self.port.read() {
            return Some(if errors.any() {
                TransportEvent::ByteError(byte, errors)
            } else {
                TransportEvent::Byte(byte)
            });
        }

        if self.sending && self.port.poll_tx() == TxState::Idle {
            self.sending = false;
            return Some(TransportEvent::Sent);
        }

        None
    }

    /// Access the port
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Access the port mutably
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
