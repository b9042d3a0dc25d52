//! Interrupt-driven PL011 UART
//!
//! Pins, baud rate and frame format are set up by `embassy-rp`
//! (`Uart::new_blocking`); [`PacUart`] then takes over the data path on the
//! registers. The receive interrupts stay enabled. The transmit interrupt
//! is only enabled while bytes are waiting for the holding register.
//!
//! The FIFOs are switched off. With them on, RXIM only fires once the RX
//! FIFO reaches its trigger level (at least four characters), which at
//! 19200 baud is longer than the 3.5T frame gap.
//!
//! The PL011 has no "transmission complete" interrupt. Once the holding
//! register has accepted the last byte the UART interrupt is pended by hand
//! and [`SerialPort::poll_tx`] spins on BUSY for at most one character.

use embassy_rp::interrupt::InterruptExt;
use embassy_rp::pac;
use ember_hal::uart::{LineErrors, SerialPort, TxState};
use heapless::Vec;

/// Largest frame that can be queued at once
pub const TX_CAPACITY: usize = 256;

/// Transmit errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Frame larger than [`TX_CAPACITY`]
    TooLong,
}

/// PL011 UART serial port
pub struct PacUart {
    regs: pac::uart::Uart,
    irq: pac::Interrupt,
    tx: Vec<u8, TX_CAPACITY>,
    tx_pos: usize,
}

impl PacUart {
    /// Take over an already configured UART, switch to character mode and
    /// enable its receive interrupts
    ///
    /// `irq` is the UART's NVIC line; the caller unmasks it.
    pub fn new(regs: pac::uart::Uart, irq: pac::Interrupt) -> Self {
        // LCR_H may only change while the UART is disabled
        regs.uartcr().modify(|w| w.set_uarten(false));
        regs.uartlcr_h().modify(|w| w.set_fen(false));
        regs.uartcr().modify(|w| w.set_uarten(true));
        regs.uartimsc().write(|w| {
            w.set_rxim(true);
            w.set_rtim(true);
        });
        Self {
            regs,
            irq,
            tx: Vec::new(),
            tx_pos: 0,
        }
    }

    /// Move queued bytes into the transmitter, returns true once all are in
    fn fill_fifo(&mut self) -> bool {
        while self.tx_pos < self.tx.len() && !self.regs.uartfr().read().txff() {
            let byte = self.tx[self.tx_pos];
            self.regs.uartdr().write(|w| w.set_data(byte));
            self.tx_pos += 1;
        }
        let waiting = self.tx_pos < self.tx.len();
        self.regs.uartimsc().modify(|w| w.set_txim(waiting));
        !waiting
    }
}

impl SerialPort for PacUart {
    type Error = UartError;

    fn read(&mut self) -> Option<(u8, LineErrors)> {
        if self.regs.uartfr().read().rxfe() {
            // Leftover receive timeout from before the switch to character mode
            self.regs.uarticr().write(|w| w.set_rtic(true));
            return None;
        }
        let dr = self.regs.uartdr().read();
        let errors = LineErrors {
            framing: dr.fe(),
            parity: dr.pe(),
            overrun: dr.oe(),
            brk: dr.be(),
        };
        Some((dr.data(), errors))
    }

    fn start_write(&mut self, data: &[u8]) -> Result<(), UartError> {
        self.tx.clear();
        self.tx
            .extend_from_slice(data)
            .map_err(|_| UartError::TooLong)?;
        self.tx_pos = 0;
        if self.fill_fifo() {
            self.irq.pend();
        }
        Ok(())
    }

    fn poll_tx(&mut self) -> TxState {
        if self.tx.is_empty() {
            return TxState::Idle;
        }
        if !self.fill_fifo() {
            return TxState::Busy;
        }
        while self.regs.uartfr().read().busy() {}
        self.tx.clear();
        self.tx_pos = 0;
        TxState::Idle
    }
}
