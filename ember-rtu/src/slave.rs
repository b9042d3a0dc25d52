//! Modbus RTU slave state machine
//!
//! Follows the serial-line state diagram: a frame starts with the first byte
//! after an idle line, ends after 1.5 characters of silence, and is only
//! accepted once the line has been silent for 3.5 characters. Any byte in
//! between spoils the frame.
//!
//! Line events arrive from interrupt context; decoding, register access and
//! reply construction are deferred to [`RtuStack::advance`], which the main
//! loop calls with interrupts disabled.

use heapless::Vec;

use crate::contract::{LineEvent, LinkHooks, RegisterBank, RtuStack, TimerRequest};
use crate::frame::{
    is_addressed_to, Adu, RxBuffer, BROADCAST_ADDRESS, MAX_ADU_SIZE, MAX_PDU_SIZE,
};
use crate::pdu;

/// Slave states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlaveState {
    /// After power-up, waiting for the first 3.5T of silence
    Initial,
    /// Line idle, ready for a frame
    Idle,
    /// Receiving bytes of a frame
    Reception,
    /// 1.5T elapsed, waiting for 3.5T to confirm the end of frame
    ControlAndWaiting,
    /// Complete frame waiting for the main loop
    FrameReady,
    /// Reply being transmitted
    Emission,
    /// Reply sent, waiting 3.5T before accepting the next frame
    Turnaround,
}

/// Frame counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlaveStats {
    /// Frames addressed to us that passed the CRC check
    pub frames: u32,
    /// Frames dropped for a bad CRC or length
    pub crc_errors: u32,
    /// Bytes received with a line error
    pub line_errors: u32,
    /// Frames dropped for timing violations or overflow
    pub discarded: u32,
    /// Exception replies sent
    pub exceptions: u32,
}

/// Modbus RTU slave
#[derive(Debug)]
pub struct RtuSlave {
    address: u8,
    state: SlaveState,
    rx: RxBuffer,
    tx: Vec<u8, MAX_ADU_SIZE>,
    suspended: bool,
    stats: SlaveStats,
}

impl RtuSlave {
    /// Create a slave answering at `address` (1-247)
    pub fn new(address: u8) -> Self {
        debug_assert!(address != BROADCAST_ADDRESS && address <= 247);
        Self {
            address,
            state: SlaveState::Initial,
            rx: RxBuffer::new(),
            tx: Vec::new(),
            suspended: false,
            stats: SlaveStats::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> SlaveState {
        self.state
    }

    /// Own slave address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Frame counters
    pub fn stats(&self) -> SlaveStats {
        self.stats
    }

    fn frame_complete<H: LinkHooks>(&mut self, hooks: &mut H) {
        let addressed = self
            .rx
            .as_slice()
            .first()
            .is_some_and(|&a| is_addressed_to(a, self.address));

        if !addressed {
            // Not ours: nothing to do, nothing to suspend for
            self.state = SlaveState::Idle;
            return;
        }

        if !self.rx.is_ok() {
            self.stats.discarded += 1;
            self.state = SlaveState::Idle;
            return;
        }

        self.state = SlaveState::FrameReady;
        hooks.timer(TimerRequest::Stop);
        self.suspend(hooks);
    }

    fn suspend<H: LinkHooks>(&mut self, hooks: &mut H) {
        if !self.suspended {
            self.suspended = true;
            hooks.suspend();
        }
    }

    fn resume<H: LinkHooks>(&mut self, hooks: &mut H) {
        if self.suspended {
            self.suspended = false;
            hooks.resume();
        }
    }

    /// Drop the pending frame without replying
    fn finish_silently<H: LinkHooks>(&mut self, hooks: &mut H) {
        self.state = SlaveState::Idle;
        self.resume(hooks);
    }
}

impl RtuStack for RtuSlave {
    fn start<H: LinkHooks>(&mut self, hooks: &mut H) {
        // The line must be silent for 3.5T before the first frame
        self.state = SlaveState::Initial;
        self.suspended = false;
        hooks.timer(TimerRequest::ArmInterFrame);
    }

    fn on_event<H: LinkHooks>(&mut self, event: LineEvent, hooks: &mut H) {
        if let LineEvent::ByteError(_) = event {
            self.stats.line_errors += 1;
        }

        match (self.state, event) {
            (SlaveState::Initial | SlaveState::Turnaround, LineEvent::InterFrameTimeout) => {
                self.state = SlaveState::Idle;
            }
            // Bytes before the line settled just restart the wait
            (SlaveState::Turnaround, e) if e.is_byte() => {
                self.state = SlaveState::Initial;
            }

            (SlaveState::Idle, LineEvent::Byte(b)) => {
                self.rx.begin();
                self.rx.push(b);
                self.state = SlaveState::Reception;
            }
            (SlaveState::Idle, LineEvent::ByteError(b)) => {
                self.rx.begin();
                self.rx.push(b);
                self.rx.invalidate();
                self.state = SlaveState::Reception;
            }

            (SlaveState::Reception, LineEvent::Byte(b)) => self.rx.push(b),
            (SlaveState::Reception, LineEvent::ByteError(b)) => {
                self.rx.push(b);
                self.rx.invalidate();
            }
            (SlaveState::Reception, LineEvent::InterCharTimeout) => {
                self.state = SlaveState::ControlAndWaiting;
            }
            (SlaveState::Reception, LineEvent::InterFrameTimeout) => {
                self.frame_complete(hooks);
            }

            (SlaveState::ControlAndWaiting, e) if e.is_byte() => {
                // Byte inside the 1.5T..3.5T window
                self.rx.invalidate();
            }
            (SlaveState::ControlAndWaiting, LineEvent::InterFrameTimeout) => {
                self.frame_complete(hooks);
            }

            _ => {}
        }
    }

    fn on_sent<H: LinkHooks>(&mut self, hooks: &mut H) {
        if self.state != SlaveState::Emission {
            return;
        }
        self.state = SlaveState::Turnaround;
        hooks.timer(TimerRequest::ArmInterFrame);
        self.resume(hooks);
    }

    fn advance<B: RegisterBank, H: LinkHooks>(&mut self, bank: &mut B, hooks: &mut H) {
        if self.state != SlaveState::FrameReady {
            return;
        }

        let adu = match Adu::decode(self.rx.as_slice()) {
            Ok(adu) => adu,
            Err(_) => {
                self.stats.crc_errors += 1;
                self.finish_silently(hooks);
                return;
            }
        };
        self.stats.frames += 1;

        let mut reply: Vec<u8, MAX_PDU_SIZE> = Vec::new();
        if pdu::process(adu.pdu, bank, &mut reply).is_some() {
            self.stats.exceptions += 1;
        }

        if adu.address == BROADCAST_ADDRESS {
            self.finish_silently(hooks);
            return;
        }

        if Adu::encode(self.address, &reply, &mut self.tx).is_err() {
            self.finish_silently(hooks);
            return;
        }

        self.state = SlaveState::Emission;
        hooks.send(&self.tx);
    }

    fn is_idle(&self) -> bool {
        self.state == SlaveState::Idle
    }
}
