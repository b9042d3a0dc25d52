//! Per-iteration request snapshot

use crate::registers::ControlBlock;
use crate::render::{Effect, RenderState};

/// Kind of render pass to run in the interruptible phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderPass {
    /// Regular pass for the selected effect
    Effect,
    /// Push the buffer as is, owed after an aborted pass
    Repaint,
}

/// Deferred actions pending in one iteration
///
/// Taken with interrupts disabled and consumed within the same iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchRequest {
    /// New effect selector, if it differs from the active one
    pub effect: Option<Effect>,
    /// Forced refresh requested
    pub refresh: bool,
    /// Render pass to run once interrupts are enabled again
    pub pass: Option<RenderPass>,
}

impl DispatchRequest {
    /// Consume the pending requests
    ///
    /// No pass is taken while an abort is pending; the flags stay set for a
    /// later iteration.
    pub fn take(control: &mut ControlBlock, active: Effect, render: &RenderState) -> Self {
        let mut request = Self::default();

        if control.take_dirty() {
            let requested = control.effect();
            if requested != active {
                request.effect = Some(requested);
            }
            request.refresh = control.take_refresh();
        }

        if !render.is_abort_requested() {
            request.pass = if render.take_repaint() {
                // A repaint covers any regular pass that was also due
                render.take_update();
                Some(RenderPass::Repaint)
            } else if render.take_update() {
                Some(RenderPass::Effect)
            } else {
                None
            };
        }

        request
    }

    /// Check whether there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.effect.is_none() && !self.refresh && self.pass.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_when_nothing_pending() {
        let mut control = ControlBlock::default();
        let render = RenderState::new();
        assert!(DispatchRequest::take(&mut control, Effect::None, &render).is_empty());
    }

    #[test]
    fn test_same_effect_is_not_a_change() {
        let mut control = ControlBlock::default();
        control.request_effect(Effect::Fire);
        let render = RenderState::new();

        let request = DispatchRequest::take(&mut control, Effect::Fire, &render);
        assert_eq!(request.effect, None);
        assert!(!control.is_dirty());
    }

    #[test]
    fn test_repaint_takes_precedence() {
        let mut control = ControlBlock::default();
        let render = RenderState::new();
        render.mark_updated();
        render.promote_due();
        render.suspend();
        let _ = crate::render::CancelToken::new(&render).checkpoint();
        render.resume();

        let request = DispatchRequest::take(&mut control, Effect::None, &render);
        assert_eq!(request.pass, Some(RenderPass::Repaint));
        assert!(!render.is_update_pending());
    }

    #[test]
    fn test_no_pass_while_aborting() {
        let mut control = ControlBlock::default();
        let render = RenderState::new();
        render.mark_updated();
        render.promote_due();
        render.suspend();

        let request = DispatchRequest::take(&mut control, Effect::None, &render);
        assert_eq!(request.pass, None);
        assert!(render.is_update_pending());
    }
}
