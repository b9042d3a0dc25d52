//! Application data unit encoding and decoding.
//!
//! Frame format:
//! - ADDRESS (1 byte): slave address, 0 = broadcast
//! - PDU (1-253 bytes): function code followed by function data
//! - CRC (2 bytes): CRC-16/MODBUS over ADDRESS and PDU, low byte first

use crc_any::CRCu16;
use heapless::Vec;

/// Broadcast slave address; requests are executed but never answered
pub const BROADCAST_ADDRESS: u8 = 0;

/// Maximum ADU size on a serial line
pub const MAX_ADU_SIZE: usize = 256;

/// Maximum PDU size (ADU minus address and CRC)
pub const MAX_PDU_SIZE: usize = MAX_ADU_SIZE - 3;

/// Smallest well-formed ADU: address, function code and CRC
pub const MIN_ADU_SIZE: usize = 4;

/// Check if a frame carrying `address` must be executed by slave `own`
pub fn is_addressed_to(address: u8, own: u8) -> bool {
    address == own || address == BROADCAST_ADDRESS
}

/// Errors that can occur during ADU decoding or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Fewer bytes than the smallest possible frame
    TooShort,
    /// CRC mismatch
    InvalidCrc,
    /// PDU does not fit into one ADU
    PduTooLarge,
}

/// Calculate the CRC-16/MODBUS of `data`
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRCu16::crc16modbus();
    crc.digest(data);
    crc.get_crc()
}

/// A decoded frame borrowing from the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adu<'a> {
    /// Slave address
    pub address: u8,
    /// Function code and data
    pub pdu: &'a [u8],
}

impl<'a> Adu<'a> {
    /// Decode and CRC-check a complete frame
    pub fn decode(frame: &'a [u8]) -> Result<Self, FrameError> {
        if frame.len() < MIN_ADU_SIZE {
            return Err(FrameError::TooShort);
        }

        let (body, tail) = frame.split_at(frame.len() - 2);
        let received = u16::from_le_bytes([tail[0], tail[1]]);
        if crc16(body) != received {
            return Err(FrameError::InvalidCrc);
        }

        Ok(Self {
            address: body[0],
            pdu: &body[1..],
        })
    }

    /// Encode a frame from its parts
    pub fn encode(
        address: u8,
        pdu: &[u8],
        out: &mut Vec<u8, MAX_ADU_SIZE>,
    ) -> Result<(), FrameError> {
        if pdu.len() > MAX_PDU_SIZE {
            return Err(FrameError::PduTooLarge);
        }

        out.clear();
        out.push(address).map_err(|_| FrameError::PduTooLarge)?;
        out.extend_from_slice(pdu)
            .map_err(|_| FrameError::PduTooLarge)?;
        let crc = crc16(out.as_slice());
        out.extend_from_slice(&crc.to_le_bytes())
            .map_err(|_| FrameError::PduTooLarge)?;
        Ok(())
    }
}

/// Receive buffer for one frame in progress
///
/// Bytes are accumulated between silences. Anything that makes the frame
/// unusable (a line error, an overflow, a byte inside the 1.5T..3.5T
/// window) only marks it bad; the frame is discarded once the line goes
/// idle.
#[derive(Debug, Clone, Default)]
pub struct RxBuffer {
    bytes: Vec<u8, MAX_ADU_SIZE>,
    ok: bool,
}

impl RxBuffer {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            ok: false,
        }
    }

    /// Start a new frame
    pub fn begin(&mut self) {
        self.bytes.clear();
        self.ok = true;
    }

    /// Append a byte, marking the frame bad on overflow
    pub fn push(&mut self, byte: u8) {
        if self.bytes.push(byte).is_err() {
            self.ok = false;
        }
    }

    /// Mark the frame in progress as unusable
    pub fn invalidate(&mut self) {
        self.ok = false;
    }

    /// Check whether the frame is still usable
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Received bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of received bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check whether nothing has been received
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Read one holding register at 0x0000 from slave 1
    const READ_ONE: [u8; 8] = [0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A];

    #[test]
    fn test_crc_known_frame() {
        assert_eq!(crc16(&READ_ONE[..6]), 0x0A84);
    }

    #[test]
    fn test_decode_valid_frame() {
        let adu = Adu::decode(&READ_ONE).unwrap();
        assert_eq!(adu.address, 1);
        assert_eq!(adu.pdu, &[0x03, 0x00, 0x00, 0x00, 0x01]);
        assert!(is_addressed_to(adu.address, 1));
        assert!(!is_addressed_to(adu.address, 2));
    }

    #[test]
    fn test_decode_corrupt_crc() {
        let mut frame = READ_ONE;
        frame[7] ^= 0xFF;
        assert_eq!(Adu::decode(&frame), Err(FrameError::InvalidCrc));
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(Adu::decode(&[0x01, 0x03, 0x84]), Err(FrameError::TooShort));
    }

    #[test]
    fn test_encode_matches_known_frame() {
        let mut out = Vec::new();
        Adu::encode(0x01, &READ_ONE[1..6], &mut out).unwrap();
        assert_eq!(out.as_slice(), &READ_ONE);
    }

    #[test]
    fn test_broadcast_is_for_everyone() {
        let mut out = Vec::new();
        Adu::encode(BROADCAST_ADDRESS, &[0x06, 0x00, 0x00, 0x00, 0x02], &mut out).unwrap();
        let adu = Adu::decode(&out).unwrap();
        assert!(is_addressed_to(adu.address, 7));
    }

    #[test]
    fn test_encode_pdu_too_large() {
        let pdu = [0u8; MAX_PDU_SIZE + 1];
        let mut out = Vec::new();
        assert_eq!(
            Adu::encode(1, &pdu, &mut out),
            Err(FrameError::PduTooLarge)
        );
    }

    #[test]
    fn test_rx_buffer_overflow_marks_bad() {
        let mut rx = RxBuffer::new();
        rx.begin();
        for _ in 0..MAX_ADU_SIZE {
            rx.push(0x55);
        }
        assert!(rx.is_ok());
        rx.push(0x55);
        assert!(!rx.is_ok());
        assert_eq!(rx.len(), MAX_ADU_SIZE);
    }

    proptest! {
        #[test]
        fn prop_single_bit_flip_rejected(
            address in 1u8..=247,
            pdu in proptest::collection::vec(any::<u8>(), 1..32),
            bit in any::<proptest::sample::Index>(),
        ) {
            let mut frame = Vec::<u8, MAX_ADU_SIZE>::new();
            Adu::encode(address, &pdu, &mut frame).unwrap();

            let bit = bit.index(frame.len() * 8);
            frame[bit / 8] ^= 1 << (bit % 8);

            prop_assert_eq!(Adu::decode(&frame), Err(FrameError::InvalidCrc));
        }
    }
}
