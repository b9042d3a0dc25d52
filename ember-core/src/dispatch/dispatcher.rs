//! The dispatch loop proper
//!
//! One iteration:
//!
//! 1. Disable interrupts.
//! 2. Let the protocol stack process whatever the interrupts queued.
//! 3. If the stack is idle, run the uninterruptible phase: reconcile the
//!    abort flags, apply a new effect selector (clearing the strip once
//!    when switching to [`Effect::None`]) and a forced refresh.
//! 4. Re-enable interrupts.
//! 5. If the stack was idle, run at most one cancellable render pass.
//! 6. Sleep until the next interrupt.
//!
//! Selector and refresh changes mutate state the protocol handlers read, so
//! they run under the critical section. A render pass is far too slow for
//! that and runs with interrupts enabled, accepting that the protocol stack
//! may abort it.

use ember_hal::Interrupts;

use super::critical::CriticalSection;
use super::request::{DispatchRequest, RenderPass};
use crate::registers::{ControlBlock, RegisterMap};
use crate::render::{CancelToken, Effect, RenderState};
use crate::traits::{LedStrip, Protocol, RenderError, StripError};

/// Result of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PassOutcome {
    /// The whole buffer was pushed
    Completed(RenderPass),
    /// Stopped at a checkpoint; a repaint follows the resume
    Cancelled(RenderPass),
    /// The strip reported an error
    Failed(RenderPass, StripError),
}

/// What one iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Iteration {
    /// Protocol stack was idle, both phases ran
    pub idle: bool,
    /// Requests taken in the uninterruptible phase
    pub request: DispatchRequest,
    /// Render pass outcome, if a pass ran
    pub pass: Option<PassOutcome>,
}

/// Dispatch counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchStats {
    /// Loop iterations
    pub iterations: u32,
    /// Completed render passes
    pub passes: u32,
    /// Render passes stopped at a checkpoint
    pub cancelled: u32,
    /// Strip errors
    pub bus_errors: u32,
    /// Forced refreshes
    pub refreshes: u32,
    /// Effect selector changes
    pub effect_changes: u32,
}

/// State touched by the two phases; split from the interrupt controller so
/// the critical-section guard can borrow it independently
struct Stage<'r, P, S> {
    protocol: P,
    strip: S,
    render: &'r RenderState,
    control: ControlBlock,
    effect: Effect,
    stats: DispatchStats,
}

/// Main loop driver
pub struct Dispatcher<'r, P, S, I> {
    stage: Stage<'r, P, S>,
    interrupts: I,
}

impl<'r, P: Protocol, S: LedStrip, I: Interrupts> Dispatcher<'r, P, S, I> {
    /// Create a dispatcher running `effect`
    ///
    /// An animated effect is kicked off by raising `updated`.
    pub fn new(protocol: P, strip: S, interrupts: I, render: &'r RenderState, effect: Effect) -> Self {
        if effect.is_animated() {
            render.mark_updated();
        }
        Self {
            stage: Stage {
                protocol,
                strip,
                render,
                control: ControlBlock::new(effect),
                effect,
                stats: DispatchStats::default(),
            },
            interrupts,
        }
    }

    /// Run one iteration, ending with the core asleep until an interrupt
    pub fn step(&mut self) -> Iteration {
        let stage = &mut self.stage;
        stage.stats.iterations = stage.stats.iterations.wrapping_add(1);

        let cs = CriticalSection::enter(&mut self.interrupts);
        stage.advance_protocol();
        let idle = stage.protocol.is_idle();
        let request = if idle {
            stage.uninterruptible()
        } else {
            DispatchRequest::default()
        };
        drop(cs);

        let pass = match request.pass {
            Some(pass) if idle => Some(stage.render_pass(pass)),
            _ => None,
        };

        self.interrupts.wait_for_interrupt();

        Iteration {
            idle,
            request,
            pass,
        }
    }

    /// Run forever
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    /// Active effect
    pub fn effect(&self) -> Effect {
        self.stage.effect
    }

    /// Dispatch counters
    pub fn stats(&self) -> DispatchStats {
        self.stage.stats
    }

    /// Access the strip
    pub fn strip(&self) -> &S {
        &self.stage.strip
    }

    /// Access the protocol stack
    pub fn protocol_mut(&mut self) -> &mut P {
        &mut self.stage.protocol
    }

    /// Access the interrupt controller
    pub fn interrupts(&self) -> &I {
        &self.interrupts
    }
}

impl<P: Protocol, S: LedStrip> Stage<'_, P, S> {
    fn advance_protocol(&mut self) {
        let mut bank = RegisterMap::new(&mut self.strip, &mut self.control, self.render);
        self.protocol.advance(&mut bank);
    }

    fn uninterruptible(&mut self) -> DispatchRequest {
        self.render.reconcile();

        let request = DispatchRequest::take(&mut self.control, self.effect, self.render);

        if let Some(effect) = request.effect {
            self.effect = effect;
            self.stats.effect_changes += 1;
            if effect == Effect::None {
                if self.strip.clear().is_err() {
                    self.stats.bus_errors += 1;
                }
            } else {
                // Show the new effect on the next tick
                self.render.mark_updated();
            }
        }

        if request.refresh {
            self.stats.refreshes += 1;
            if self.strip.update(&CancelToken::never()).is_err() {
                self.stats.bus_errors += 1;
            }
        }

        request
    }

    fn render_pass(&mut self, pass: RenderPass) -> PassOutcome {
        let cancel = CancelToken::new(self.render);
        let result = match pass {
            RenderPass::Repaint => self.strip.update(&cancel),
            RenderPass::Effect => self.run_effect(&cancel),
        };

        let outcome = match result {
            Ok(()) => {
                self.stats.passes += 1;
                PassOutcome::Completed(pass)
            }
            Err(RenderError::Cancelled) => {
                self.stats.cancelled += 1;
                return PassOutcome::Cancelled(pass);
            }
            Err(RenderError::Strip(e)) => {
                self.stats.bus_errors += 1;
                PassOutcome::Failed(pass, e)
            }
        };

        // Animated effects schedule their own next frame
        if self.effect.is_animated() {
            self.render.mark_updated();
        }
        outcome
    }

    fn run_effect(&mut self, cancel: &CancelToken<'_>) -> Result<(), RenderError> {
        match self.effect {
            Effect::None | Effect::Static => self.strip.update(cancel),
            Effect::Fire => {
                cancel.checkpoint()?;
                self.strip.heat_map_update();
                self.strip.rgb_map_update();
                self.strip.update(cancel)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::critical::mock::MockInterrupts;
    use crate::registers::mock::MockStrip;
    use crate::registers::{REG_EFFECT, REG_PIXEL_BASE, REG_REFRESH};
    use ember_rtu::RegisterBank;
    use heapless::Vec;

    /// Protocol stack applying scripted register writes on `advance`
    #[derive(Default)]
    struct MockProtocol {
        busy: bool,
        writes: Vec<(u16, u16), 8>,
        advances: u32,
    }

    impl MockProtocol {
        fn write(&mut self, address: u16, value: u16) {
            self.writes.push((address, value)).unwrap();
        }
    }

    impl Protocol for MockProtocol {
        fn advance<B: RegisterBank>(&mut self, bank: &mut B) {
            self.advances += 1;
            for (address, value) in self.writes.iter() {
                bank.write_holding(*address, *value).unwrap();
            }
            self.writes.clear();
        }

        fn is_idle(&self) -> bool {
            !self.busy
        }
    }

    /// Interrupt controller where a suspend lands as soon as interrupts
    /// are re-enabled
    struct SuspendOnEnable<'a> {
        render: &'a RenderState,
        armed: bool,
        enabled: bool,
    }

    impl Interrupts for SuspendOnEnable<'_> {
        fn disable(&mut self) -> bool {
            core::mem::replace(&mut self.enabled, false)
        }

        fn restore(&mut self, was_enabled: bool) {
            self.enabled = was_enabled;
            if was_enabled && core::mem::take(&mut self.armed) {
                self.render.suspend();
            }
        }

        fn wait_for_interrupt(&mut self) {}
    }

    type TestDispatcher<'r> = Dispatcher<'r, MockProtocol, MockStrip, MockInterrupts>;

    fn dispatcher(render: &RenderState, effect: Effect) -> TestDispatcher<'_> {
        Dispatcher::new(
            MockProtocol::default(),
            MockStrip::default(),
            MockInterrupts::default(),
            render,
            effect,
        )
    }

    /// Cyclic tick
    fn tick(render: &RenderState) {
        render.promote_due();
    }

    /// New data followed by a cyclic tick
    fn due(render: &RenderState) {
        render.mark_updated();
        render.promote_due();
    }

    #[test]
    fn test_sleeps_with_interrupts_enabled() {
        let render = RenderState::new();
        let mut d = dispatcher(&render, Effect::None);
        d.step();
        d.step();

        assert_eq!(d.interrupts().sleeps, 2);
        assert_eq!(d.interrupts().masked_sleeps, 0);
        assert!(d.interrupts().enabled);
        assert_eq!(d.stats().iterations, 2);
    }

    #[test]
    fn test_busy_protocol_skips_both_phases() {
        let render = RenderState::new();
        let mut d = dispatcher(&render, Effect::Static);
        d.protocol_mut().busy = true;
        d.protocol_mut().write(REG_EFFECT, 0);
        tick(&render);

        let it = d.step();
        assert!(!it.idle);
        assert_eq!(it.pass, None);
        assert_eq!(d.effect(), Effect::Static);
        assert_eq!(d.strip().clears, 0);
        assert_eq!(d.strip().pushes, 0);
        assert_eq!(d.protocol_mut().advances, 1);

        d.protocol_mut().busy = false;
        let it = d.step();
        assert!(it.idle);
        assert_eq!(d.effect(), Effect::None);
        assert_eq!(d.strip().clears, 1);
    }

    #[test]
    fn test_fire_to_none_clears_once_and_stops_fire() {
        let render = RenderState::new();
        let mut d = dispatcher(&render, Effect::Fire);

        tick(&render);
        let it = d.step();
        assert_eq!(it.pass, Some(PassOutcome::Completed(RenderPass::Effect)));
        assert_eq!(d.strip().heat_updates, 1);
        assert!(render.is_updated());

        d.protocol_mut().write(REG_EFFECT, 0);
        tick(&render);
        d.step();
        assert_eq!(d.strip().clears, 1);

        for _ in 0..5 {
            tick(&render);
            d.step();
        }
        assert_eq!(d.strip().clears, 1);
        assert_eq!(d.strip().heat_updates, 1);
        assert_eq!(d.strip().rgb_updates, 1);
    }

    #[test]
    fn test_fire_keeps_animating() {
        let render = RenderState::new();
        let mut d = dispatcher(&render, Effect::Fire);
        for _ in 0..3 {
            tick(&render);
            d.step();
        }
        assert_eq!(d.strip().heat_updates, 3);
        assert_eq!(d.stats().passes, 3);
    }

    #[test]
    fn test_abort_before_pass_writes_nothing() {
        let render = RenderState::new();
        let mut d = Dispatcher::new(
            MockProtocol::default(),
            MockStrip::default(),
            SuspendOnEnable {
                render: &render,
                armed: true,
                enabled: true,
            },
            &render,
            Effect::Static,
        );
        due(&render);

        let it = d.step();
        assert_eq!(it.pass, Some(PassOutcome::Cancelled(RenderPass::Effect)));
        assert_eq!(d.strip().bus_writes, 0);
        assert!(render.is_aborted());
        assert_eq!(d.stats().cancelled, 1);
    }

    #[test]
    fn test_resume_after_abort_runs_exactly_one_pass() {
        let render = RenderState::new();
        let mut d = Dispatcher::new(
            MockProtocol::default(),
            MockStrip::default(),
            SuspendOnEnable {
                render: &render,
                armed: true,
                enabled: true,
            },
            &render,
            Effect::Static,
        );
        due(&render);
        d.step();

        // Stale cadence flags must not add passes
        render.mark_updated();
        render.resume();
        tick(&render);

        let it = d.step();
        assert_eq!(it.pass, Some(PassOutcome::Completed(RenderPass::Repaint)));
        assert_eq!(d.strip().pushes, 1);
        assert_eq!(d.strip().bus_writes, 4);

        let it = d.step();
        assert_eq!(it.pass, None);
        assert_eq!(d.strip().pushes, 1);
    }

    #[test]
    fn test_no_pass_while_suspended() {
        let render = RenderState::new();
        let mut d = dispatcher(&render, Effect::Static);
        due(&render);
        render.suspend();

        let it = d.step();
        assert_eq!(it.pass, None);
        assert_eq!(d.strip().pushes, 0);

        render.resume();
        let it = d.step();
        assert_eq!(it.pass, Some(PassOutcome::Completed(RenderPass::Effect)));
    }

    #[test]
    fn test_reconcile_recovers_lost_repaint() {
        let render = RenderState::new();
        let mut d = dispatcher(&render, Effect::Static);

        // Resume raced the checkpoint: aborted with no abort pending
        render.suspend();
        render.resume();
        render.mark_aborted();

        let it = d.step();
        assert_eq!(it.pass, Some(PassOutcome::Completed(RenderPass::Repaint)));
        assert!(!render.is_aborted());
    }

    #[test]
    fn test_refresh_is_uncancellable() {
        let render = RenderState::new();
        let mut d = dispatcher(&render, Effect::Static);
        d.protocol_mut().write(REG_PIXEL_BASE, 0xFF00);
        d.protocol_mut().write(REG_REFRESH, 1);
        render.suspend();

        let it = d.step();
        assert!(it.request.refresh);
        assert_eq!(d.strip().pushes, 1);
        assert_eq!(d.strip().shown[0].r, 0xFF);
        assert!(!render.is_aborted());
    }

    #[test]
    fn test_bus_error_counted() {
        let render = RenderState::new();
        let mut strip = MockStrip::default();
        strip.broken = true;
        let mut d = Dispatcher::new(
            MockProtocol::default(),
            strip,
            MockInterrupts::default(),
            &render,
            Effect::Static,
        );
        due(&render);

        let it = d.step();
        assert_eq!(
            it.pass,
            Some(PassOutcome::Failed(RenderPass::Effect, StripError::Bus))
        );
        assert_eq!(d.stats().bus_errors, 1);
    }

    #[test]
    fn test_pixel_write_reaches_strip_on_next_tick() {
        let render = RenderState::new();
        let mut d = dispatcher(&render, Effect::Static);
        d.step();

        d.protocol_mut().write(REG_PIXEL_BASE + 6, 0x0102);
        d.step();
        assert_eq!(d.strip().pushes, 0);

        tick(&render);
        d.step();
        assert_eq!(d.strip().pushes, 1);
        assert_eq!(d.strip().shown[3].g, 0x02);
    }
}
