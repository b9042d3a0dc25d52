//! UART serial communication abstractions
//!
//! Provides an interrupt-driven serial port trait. Received bytes are handed
//! out one at a time together with the line errors the receiver flagged for
//! them; transmission is started with a whole buffer and completes in the
//! background.

/// Line errors flagged by the receiver for a single byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineErrors {
    /// Stop bit missing
    pub framing: bool,
    /// Parity bit mismatch
    pub parity: bool,
    /// Receiver overrun, at least one byte was lost before this one
    pub overrun: bool,
    /// Line held low for longer than a character
    pub brk: bool,
}

impl LineErrors {
    /// No errors
    pub const NONE: Self = Self {
        framing: false,
        parity: false,
        overrun: false,
        brk: false,
    };

    /// Check if any error bit is set
    pub fn any(&self) -> bool {
        self.framing || self.parity || self.overrun || self.brk
    }
}

/// Transmitter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxState {
    /// Nothing queued and the line is quiet
    Idle,
    /// Bytes still queued or being shifted out
    Busy,
}

/// Interrupt-driven serial port
pub trait SerialPort {
    /// Error type for transmit operations
    type Error;

    /// Take the next received byte, if any
    ///
    /// Bytes with line errors are returned as well, never dropped.
    ///
    /// Frame timing restarts on every byte read, so the receive interrupt
    /// must fire for each character as it arrives. Ports with a receive
    /// FIFO have to run it with a trigger level of one character or with
    /// the FIFO disabled.
    fn read(&mut self) -> Option<(u8, LineErrors)>;

    /// Start transmitting `data`
    ///
    /// The data is copied into the driver; the call returns before the
    /// bytes are on the line.
    fn start_write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Move the transmission forward and report its state
    ///
    /// Must report [`TxState::Busy`] until the last stop bit of the last
    /// byte has left the line, not merely until the FIFO is empty.
    fn poll_tx(&mut self) -> TxState;
}

/// UART configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl UartConfig {
    /// Bits on the line per character, start and stop bits included
    pub const fn bits_per_char(&self) -> u32 {
        let data = match self.data_bits {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        };
        let parity = match self.parity {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        1 + data + parity + stop
    }
}

impl Default for UartConfig {
    /// Modbus RTU default: 19200 8E1
    fn default() -> Self {
        Self {
            baudrate: 19200,
            data_bits: DataBits::Eight,
            parity: Parity::Even,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_eleven_bit_character() {
        assert_eq!(UartConfig::default().bits_per_char(), 11);
    }

    #[test]
    fn test_no_parity_two_stop_bits() {
        let config = UartConfig {
            parity: Parity::None,
            stop_bits: StopBits::Two,
            ..Default::default()
        };
        assert_eq!(config.bits_per_char(), 11);
    }

    #[test]
    fn test_line_errors_any() {
        assert!(!LineErrors::NONE.any());
        assert!(LineErrors {
            parity: true,
            ..LineErrors::NONE
        }
        .any());
    }
}
