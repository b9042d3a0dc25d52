//! Protocol data units for the holding-register functions
//!
//! Only the functions the LED controller exposes are implemented. Anything
//! else is answered with [`ExceptionCode::IllegalFunction`].

use heapless::Vec;

use crate::contract::RegisterBank;
use crate::frame::MAX_PDU_SIZE;

/// Read holding registers
pub const READ_HOLDING_REGISTERS: u8 = 0x03;
/// Write single register
pub const WRITE_SINGLE_REGISTER: u8 = 0x06;
/// Write multiple registers
pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Bit set in the function code of an exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Maximum registers in one read request
pub const MAX_READ_QUANTITY: u16 = 125;
/// Maximum registers in one write-multiple request
pub const MAX_WRITE_QUANTITY: u16 = 123;

/// Modbus exception codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ExceptionCode {
    /// Function code not supported
    IllegalFunction = 0x01,
    /// Register address not mapped
    IllegalDataAddress = 0x02,
    /// Value or quantity out of range, or malformed request
    IllegalDataValue = 0x03,
    /// Unrecoverable error while executing the request
    ServerDeviceFailure = 0x04,
}

/// A decoded request borrowing from the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request<'a> {
    /// Read `quantity` registers starting at `start`
    ReadHolding { start: u16, quantity: u16 },
    /// Write one register
    WriteSingle { address: u16, value: u16 },
    /// Write consecutive registers starting at `start`, big-endian payload
    WriteMultiple { start: u16, values: &'a [u8] },
}

fn be16(bytes: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([bytes[at], bytes[at + 1]])
}

impl<'a> Request<'a> {
    /// Parse a request PDU
    pub fn parse(pdu: &'a [u8]) -> Result<Self, ExceptionCode> {
        let (&function, data) = pdu.split_first().ok_or(ExceptionCode::IllegalDataValue)?;

        match function {
            READ_HOLDING_REGISTERS => {
                if data.len() != 4 {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                let quantity = be16(data, 2);
                if quantity == 0 || quantity > MAX_READ_QUANTITY {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                Ok(Request::ReadHolding {
                    start: be16(data, 0),
                    quantity,
                })
            }
            WRITE_SINGLE_REGISTER => {
                if data.len() != 4 {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                Ok(Request::WriteSingle {
                    address: be16(data, 0),
                    value: be16(data, 2),
                })
            }
            WRITE_MULTIPLE_REGISTERS => {
                if data.len() < 5 {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                let quantity = be16(data, 2);
                let byte_count = data[4] as usize;
                if quantity == 0
                    || quantity > MAX_WRITE_QUANTITY
                    || byte_count != quantity as usize * 2
                    || data.len() != 5 + byte_count
                {
                    return Err(ExceptionCode::IllegalDataValue);
                }
                Ok(Request::WriteMultiple {
                    start: be16(data, 0),
                    values: &data[5..],
                })
            }
            _ => Err(ExceptionCode::IllegalFunction),
        }
    }

    /// Function code of this request
    pub fn function(&self) -> u8 {
        match self {
            Request::ReadHolding { .. } => READ_HOLDING_REGISTERS,
            Request::WriteSingle { .. } => WRITE_SINGLE_REGISTER,
            Request::WriteMultiple { .. } => WRITE_MULTIPLE_REGISTERS,
        }
    }
}

/// Execute a request PDU against `bank` and build the response PDU
///
/// Always produces a response: either the normal reply or an exception
/// reply. Returns the exception code when one was produced.
pub fn process<B: RegisterBank>(
    pdu: &[u8],
    bank: &mut B,
    out: &mut Vec<u8, MAX_PDU_SIZE>,
) -> Option<ExceptionCode> {
    let function = pdu.first().copied().unwrap_or(0);
    out.clear();

    let result = Request::parse(pdu).and_then(|request| execute(request, bank, out));
    match result {
        Ok(()) => None,
        Err(code) => {
            out.clear();
            // Two bytes always fit
            let _ = out.push(function | EXCEPTION_FLAG);
            let _ = out.push(code as u8);
            Some(code)
        }
    }
}

fn execute<B: RegisterBank>(
    request: Request<'_>,
    bank: &mut B,
    out: &mut Vec<u8, MAX_PDU_SIZE>,
) -> Result<(), ExceptionCode> {
    let overflow = |_| ExceptionCode::ServerDeviceFailure;

    match request {
        Request::ReadHolding { start, quantity } => {
            let end = start
                .checked_add(quantity - 1)
                .ok_or(ExceptionCode::IllegalDataAddress)?;
            out.push(READ_HOLDING_REGISTERS).map_err(overflow)?;
            out.push((quantity * 2) as u8).map_err(overflow)?;
            for address in start..=end {
                let value = bank.read_holding(address)?;
                out.extend_from_slice(&value.to_be_bytes())
                    .map_err(|_| ExceptionCode::ServerDeviceFailure)?;
            }
        }
        Request::WriteSingle { address, value } => {
            bank.write_holding(address, value)?;
            out.push(WRITE_SINGLE_REGISTER).map_err(overflow)?;
            out.extend_from_slice(&address.to_be_bytes())
                .map_err(|_| ExceptionCode::ServerDeviceFailure)?;
            out.extend_from_slice(&value.to_be_bytes())
                .map_err(|_| ExceptionCode::ServerDeviceFailure)?;
        }
        Request::WriteMultiple { start, values } => {
            let quantity = (values.len() / 2) as u16;
            start
                .checked_add(quantity - 1)
                .ok_or(ExceptionCode::IllegalDataAddress)?;
            let writes = || {
                values
                    .chunks_exact(2)
                    .enumerate()
                    .map(move |(offset, pair)| {
                        (start + offset as u16, u16::from_be_bytes([pair[0], pair[1]]))
                    })
            };
            // All or nothing
            for (address, value) in writes() {
                bank.check_write(address, value)?;
            }
            for (address, value) in writes() {
                bank.write_holding(address, value)?;
            }
            out.push(WRITE_MULTIPLE_REGISTERS).map_err(overflow)?;
            out.extend_from_slice(&start.to_be_bytes())
                .map_err(|_| ExceptionCode::ServerDeviceFailure)?;
            out.extend_from_slice(&quantity.to_be_bytes())
                .map_err(|_| ExceptionCode::ServerDeviceFailure)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Eight registers, address 7 rejects writes
    struct MockBank {
        regs: [u16; 8],
    }

    impl RegisterBank for MockBank {
        fn read_holding(&mut self, address: u16) -> Result<u16, ExceptionCode> {
            self.regs
                .get(address as usize)
                .copied()
                .ok_or(ExceptionCode::IllegalDataAddress)
        }

        fn write_holding(&mut self, address: u16, value: u16) -> Result<(), ExceptionCode> {
            self.check_write(address, value)?;
            self.regs[address as usize] = value;
            Ok(())
        }

        fn check_write(&self, address: u16, _value: u16) -> Result<(), ExceptionCode> {
            if address == 7 {
                return Err(ExceptionCode::IllegalDataValue);
            }
            if address as usize >= self.regs.len() {
                return Err(ExceptionCode::IllegalDataAddress);
            }
            Ok(())
        }
    }

    fn bank() -> MockBank {
        MockBank {
            regs: [10, 11, 12, 13, 14, 15, 16, 17],
        }
    }

    #[test]
    fn test_read_holding() {
        let mut bank = bank();
        let mut out = Vec::new();
        let result = process(&[0x03, 0x00, 0x01, 0x00, 0x02], &mut bank, &mut out);

        assert_eq!(result, None);
        assert_eq!(out.as_slice(), &[0x03, 0x04, 0x00, 11, 0x00, 12]);
    }

    #[test]
    fn test_write_single_echoes_request() {
        let mut bank = bank();
        let mut out = Vec::new();
        let pdu = [0x06, 0x00, 0x02, 0x12, 0x34];
        let result = process(&pdu, &mut bank, &mut out);

        assert_eq!(result, None);
        assert_eq!(out.as_slice(), &pdu);
        assert_eq!(bank.regs[2], 0x1234);
    }

    #[test]
    fn test_write_multiple() {
        let mut bank = bank();
        let mut out = Vec::new();
        let pdu = [0x10, 0x00, 0x03, 0x00, 0x02, 0x04, 0x00, 0x2A, 0x01, 0x00];
        let result = process(&pdu, &mut bank, &mut out);

        assert_eq!(result, None);
        assert_eq!(out.as_slice(), &[0x10, 0x00, 0x03, 0x00, 0x02]);
        assert_eq!(bank.regs[3], 0x002A);
        assert_eq!(bank.regs[4], 0x0100);
    }

    #[test]
    fn test_write_multiple_past_end_writes_nothing() {
        let mut bank = bank();
        let mut out = Vec::new();
        // Registers 6..=9, the bank ends at 7
        let pdu = [
            0x10, 0x00, 0x06, 0x00, 0x04, 0x08, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04,
        ];
        let result = process(&pdu, &mut bank, &mut out);

        assert_eq!(result, Some(ExceptionCode::IllegalDataValue));
        assert_eq!(out.as_slice(), &[0x90, 0x03]);
        assert_eq!(bank.regs[6], 16);
    }

    #[test]
    fn test_write_multiple_rejected_value_writes_nothing() {
        let mut bank = bank();
        let mut out = Vec::new();
        let pdu = [0x10, 0x00, 0x06, 0x00, 0x02, 0x04, 0x00, 0x01, 0x00, 0x02];
        let result = process(&pdu, &mut bank, &mut out);

        assert_eq!(result, Some(ExceptionCode::IllegalDataValue));
        assert_eq!(bank.regs[6], 16);
        assert_eq!(bank.regs[7], 17);
    }

    #[test]
    fn test_unknown_function() {
        let mut bank = bank();
        let mut out = Vec::new();
        let result = process(&[0x2B, 0x0E, 0x01, 0x00], &mut bank, &mut out);

        assert_eq!(result, Some(ExceptionCode::IllegalFunction));
        assert_eq!(out.as_slice(), &[0xAB, 0x01]);
    }

    #[test]
    fn test_read_out_of_range() {
        let mut bank = bank();
        let mut out = Vec::new();
        let result = process(&[0x03, 0x00, 0x06, 0x00, 0x04], &mut bank, &mut out);

        assert_eq!(result, Some(ExceptionCode::IllegalDataAddress));
        assert_eq!(out.as_slice(), &[0x83, 0x02]);
    }

    #[test]
    fn test_read_zero_quantity() {
        let mut bank = bank();
        let mut out = Vec::new();
        let result = process(&[0x03, 0x00, 0x00, 0x00, 0x00], &mut bank, &mut out);
        assert_eq!(result, Some(ExceptionCode::IllegalDataValue));
    }

    #[test]
    fn test_write_multiple_byte_count_mismatch() {
        let mut bank = bank();
        let mut out = Vec::new();
        let pdu = [0x10, 0x00, 0x00, 0x00, 0x02, 0x02, 0x00, 0x01];
        let result = process(&pdu, &mut bank, &mut out);
        assert_eq!(result, Some(ExceptionCode::IllegalDataValue));
        assert_eq!(bank.regs[0], 10);
    }

    #[test]
    fn test_bank_rejection_becomes_exception() {
        let mut bank = bank();
        let mut out = Vec::new();
        let result = process(&[0x06, 0x00, 0x07, 0x00, 0x01], &mut bank, &mut out);
        assert_eq!(result, Some(ExceptionCode::IllegalDataValue));
        assert_eq!(out.as_slice(), &[0x86, 0x03]);
    }

    #[test]
    fn test_request_function_codes() {
        let request = Request::parse(&[0x06, 0x00, 0x01, 0x00, 0x02]).unwrap();
        assert_eq!(request.function(), WRITE_SINGLE_REGISTER);
        assert_eq!(
            request,
            Request::WriteSingle {
                address: 1,
                value: 2
            }
        );
    }
}
