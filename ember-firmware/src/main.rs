//! Ember - Modbus RTU LED strip controller
//!
//! Firmware binary for RP2040 boards. A WS2812B strip on SPI0 is driven by
//! a single dispatch loop; a Modbus RTU slave on UART0 reads and writes the
//! strip's holding registers. Three interrupts feed the loop:
//!
//! - `UART0_IRQ`: received bytes and transmit completion
//! - `TIMER_IRQ_1`: 1.5T / 3.5T silence timeouts
//! - `TIMER_IRQ_2`: render cadence
//!
//! There is no executor. The RTU link is shared between the interrupt
//! handlers and the loop through a critical-section mutex; the render
//! flags are atomics.

#![no_std]
#![no_main]

use core::cell::RefCell;

use cortex_m_rt::entry;
use defmt::*;
use embassy_rp::interrupt::{self, InterruptExt};
use embassy_rp::pac;
use embassy_rp::spi::{self, Spi};
use embassy_rp::uart::{self, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use {defmt_rtt as _, panic_probe as _};

use ember_core::timing::{CyclicTimer, FrameTiming, PrecisionTimer};
use ember_core::traits::{LedStrip, Protocol};
use ember_core::{Dispatcher, Effect, PassOutcome, RenderState, RtuLink, SerialTransport};
use ember_drivers::{HalSpi, Ws2812Strip};
use ember_hal::uart::{Parity, StopBits};
use ember_hal_rp2040::{AlarmTimer, CortexM, PacUart};
use ember_rtu::{RegisterBank, RtuSlave};

mod config;

type Link = RtuLink<'static, AlarmTimer, PacUart>;

/// Iterations between two stats dumps (about 10 s at the default cadence)
const STATS_EVERY: u32 = 500;

static RENDER: RenderState = RenderState::new();

static LINK: Mutex<CriticalSectionRawMutex, RefCell<Option<Link>>> =
    Mutex::new(RefCell::new(None));

static CYCLIC: Mutex<CriticalSectionRawMutex, RefCell<Option<CyclicTimer<AlarmTimer>>>> =
    Mutex::new(RefCell::new(None));

/// The RTU link as seen from the dispatch loop
struct SharedLink;

impl Protocol for SharedLink {
    fn advance<B: RegisterBank>(&mut self, bank: &mut B) {
        LINK.lock(|cell| {
            if let Some(link) = cell.borrow_mut().as_mut() {
                link.advance(bank);
            }
        });
    }

    fn is_idle(&self) -> bool {
        LINK.lock(|cell| cell.borrow().as_ref().map_or(true, |link| link.is_idle()))
    }
}

fn with_link(f: impl FnOnce(&mut Link)) {
    LINK.lock(|cell| {
        if let Some(link) = cell.borrow_mut().as_mut() {
            f(link);
        }
    });
}

#[interrupt]
fn UART0_IRQ() {
    with_link(|link| link.on_uart_interrupt());
}

#[interrupt]
fn TIMER_IRQ_1() {
    with_link(|link| {
        link.timing_mut().timer_mut().timer_mut().on_alarm();
        link.on_timer_interrupt();
    });
}

#[interrupt]
fn TIMER_IRQ_2() {
    CYCLIC.lock(|cell| {
        if let Some(cyclic) = cell.borrow_mut().as_mut() {
            cyclic.timer_mut().on_alarm();
            cyclic.on_compare_match(&RENDER);
        }
    });
}

/// Seed for the fire effect from the ring oscillator's random bit
fn seed() -> u64 {
    (0..64).fold(0u64, |acc, _| {
        (acc << 1) | pac::ROSC.randombit().read().randombit() as u64
    })
}

fn uart_config() -> uart::Config {
    let mut cfg = uart::Config::default();
    cfg.baudrate = config::UART.baudrate;
    cfg.data_bits = uart::DataBits::DataBits8;
    cfg.parity = match config::UART.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match config::UART.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    cfg
}

fn spi_config() -> spi::Config {
    let mut cfg = spi::Config::default();
    cfg.frequency = config::SPI.frequency;
    cfg.phase = if config::SPI.mode.second_edge() {
        spi::Phase::CaptureOnSecondTransition
    } else {
        spi::Phase::CaptureOnFirstTransition
    };
    cfg.polarity = if config::SPI.mode.idle_high() {
        spi::Polarity::IdleHigh
    } else {
        spi::Polarity::IdleLow
    };
    cfg
}

/// Main entry point
#[entry]
fn main() -> ! {
    info!("Ember firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    info!(
        "Link: slave {} at {} baud, silence 1.5T={}us 3.5T={}us",
        config::LINK.address,
        config::LINK.baudrate,
        config::SILENCE.inter_char,
        config::SILENCE.inter_frame
    );

    // UART0 on GPIO0/1. Embassy sets up pins, baud rate and framing; the
    // data path then runs from UART0_IRQ on the registers.
    let _uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config());
    let port = PacUart::new(pac::UART0, interrupt::UART0_IRQ);

    let timing = FrameTiming::new(
        PrecisionTimer::new(AlarmTimer::new(config::FRAME_ALARM), config::CLOCK.prescaler),
        config::SILENCE,
    );
    let mut link = RtuLink::new(
        timing,
        SerialTransport::new(port),
        RtuSlave::new(config::LINK.address),
        &RENDER,
    );
    link.start();
    LINK.lock(|cell| cell.replace(Some(link)));

    let mut cyclic = CyclicTimer::new(AlarmTimer::new(config::CYCLIC_ALARM), config::CLOCK.prescaler);
    cyclic.start(config::FRAME_TICKS);
    CYCLIC.lock(|cell| cell.replace(Some(cyclic)));

    // Strip data on SPI0 TX (GPIO19); the clock pin is unused by the strip
    let spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, spi_config());
    let mut strip: Ws2812Strip<_, _, { config::PIXELS }> =
        Ws2812Strip::new(HalSpi(spi), SmallRng::seed_from_u64(seed()));
    strip.set_fire_params(config::FIRE);
    info!(
        "Strip: {} pixels, frame every {}ms",
        strip.len(),
        config::STRIP.frame_period_ms
    );

    let effect = match Effect::from_register(config::STRIP.effect) {
        Some(effect) => effect,
        None => {
            warn!("Unknown boot effect {}, using none", config::STRIP.effect);
            Effect::None
        }
    };

    for irq in [interrupt::UART0_IRQ, interrupt::TIMER_IRQ_1, interrupt::TIMER_IRQ_2] {
        irq.unpend();
        // SAFETY: handlers only touch the statics above, through their locks
        unsafe { irq.enable() };
    }

    let mut dispatcher = Dispatcher::new(SharedLink, strip, CortexM, &RENDER, effect);
    info!("Dispatch loop running, effect {}", effect);

    loop {
        let iteration = dispatcher.step();

        if let Some(PassOutcome::Failed(pass, error)) = iteration.pass {
            warn!("Render pass {} failed: {}", pass, error);
        }
        if iteration.request.effect.is_some() {
            info!("Effect changed to {}", dispatcher.effect());
        }

        let stats = dispatcher.stats();
        if stats.iterations % STATS_EVERY == 0 {
            debug!("Dispatch: {}", stats);
            LINK.lock(|cell| {
                if let Some(link) = cell.borrow().as_ref() {
                    debug!("Link: {} Slave: {}", link.stats(), link.stack().stats());
                }
            });
        }
    }
}
