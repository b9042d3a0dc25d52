//! RTU link
//!
//! Binds a protocol stack to the frame timer, the serial transport and the
//! render flags. The firmware keeps one `RtuLink` in a critical-section
//! mutex and calls into it from three places:
//!
//! - the UART interrupt: [`RtuLink::on_uart_interrupt`]
//! - the frame timer interrupt: [`RtuLink::on_timer_interrupt`]
//! - the dispatch loop, through the [`Protocol`] impl

use ember_hal::timer::CompareTimer;
use ember_hal::uart::{LineErrors, SerialPort};
use ember_rtu::{LineEvent, LinkHooks, RegisterBank, RtuSlave, RtuStack, TimerRequest};

use crate::render::RenderState;
use crate::timing::FrameTiming;
use crate::traits::Protocol;
use crate::transport::{SerialTransport, TransportEvent};

/// Link counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStats {
    /// Bytes received
    pub rx_bytes: u32,
    /// Bytes received with line errors
    pub rx_errors: u32,
    /// Replies handed to the transport
    pub replies: u32,
    /// Replies the transport refused
    pub tx_failures: u32,
}

/// Protocol stack wired to its timer, transport and render flags
pub struct RtuLink<'r, T, P, S = RtuSlave> {
    timing: FrameTiming<T>,
    transport: SerialTransport<P>,
    stack: S,
    render: &'r RenderState,
    stats: LinkStats,
}

/// [`LinkHooks`] view over the parts of the link the stack may drive
struct Hooks<'a, 'r, T, P> {
    timing: &'a mut FrameTiming<T>,
    transport: &'a mut SerialTransport<P>,
    render: &'r RenderState,
    stats: &'a mut LinkStats,
    send_failed: bool,
}

impl<T: CompareTimer, P: SerialPort> LinkHooks for Hooks<'_, '_, T, P> {
    fn timer(&mut self, request: TimerRequest) {
        self.timing.apply(request);
    }

    fn send(&mut self, adu: &[u8]) {
        match self.transport.send(adu) {
            Ok(()) => self.stats.replies += 1,
            Err(_) => {
                self.stats.tx_failures += 1;
                self.send_failed = true;
            }
        }
    }

    fn suspend(&mut self) {
        self.render.suspend();
    }

    fn resume(&mut self) {
        self.render.resume();
    }
}

impl<'r, T: CompareTimer, P: SerialPort, S: RtuStack> RtuLink<'r, T, P, S> {
    /// Wire up a link; nothing runs until [`start`](Self::start)
    pub fn new(
        timing: FrameTiming<T>,
        transport: SerialTransport<P>,
        stack: S,
        render: &'r RenderState,
    ) -> Self {
        Self {
            timing,
            transport,
            stack,
            render,
            stats: LinkStats::default(),
        }
    }

    /// Start the stack (waits for the first 3.5T of silence)
    pub fn start(&mut self) {
        let (stack, mut hooks) = self.split();
        stack.start(&mut hooks);
    }

    /// UART interrupt: drain received bytes and transmit completion
    pub fn on_uart_interrupt(&mut self) {
        while let Some(event) = self.transport.service() {
            match event {
                TransportEvent::Byte(byte) => {
                    self.stats.rx_bytes += 1;
                    let line = self.timing.on_byte(byte, LineErrors::NONE);
                    self.deliver(line);
                }
                TransportEvent::ByteError(byte, errors) => {
                    self.stats.rx_bytes += 1;
                    self.stats.rx_errors += 1;
                    let line = self.timing.on_byte(byte, errors);
                    self.deliver(line);
                }
                TransportEvent::Sent => {
                    let (stack, mut hooks) = self.split();
                    stack.on_sent(&mut hooks);
                }
            }
        }
    }

    /// Frame timer interrupt
    pub fn on_timer_interrupt(&mut self) {
        if let Some(line) = self.timing.on_expired() {
            self.deliver(line);
        }
    }

    /// Protocol stack
    pub fn stack(&self) -> &S {
        &self.stack
    }

    /// Frame timing
    pub fn timing(&self) -> &FrameTiming<T> {
        &self.timing
    }

    /// Link counters
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// Access the transport
    pub fn transport_mut(&mut self) -> &mut SerialTransport<P> {
        &mut self.transport
    }

    /// Access the frame timing
    pub fn timing_mut(&mut self) -> &mut FrameTiming<T> {
        &mut self.timing
    }

    fn deliver(&mut self, event: LineEvent) {
        let (stack, mut hooks) = self.split();
        stack.on_event(event, &mut hooks);
    }

    fn split(&mut self) -> (&mut S, Hooks<'_, 'r, T, P>) {
        (
            &mut self.stack,
            Hooks {
                timing: &mut self.timing,
                transport: &mut self.transport,
                render: self.render,
                stats: &mut self.stats,
                send_failed: false,
            },
        )
    }
}

impl<T: CompareTimer, P: SerialPort, S: RtuStack> Protocol for RtuLink<'_, T, P, S> {
    fn advance<B: RegisterBank>(&mut self, bank: &mut B) {
        let (stack, mut hooks) = self.split();
        stack.advance(bank, &mut hooks);
        if hooks.send_failed {
            // Nothing will complete; let the stack finish the transaction
            stack.on_sent(&mut hooks);
        }
    }

    fn is_idle(&self) -> bool {
        self.stack.is_idle()
    }
}
