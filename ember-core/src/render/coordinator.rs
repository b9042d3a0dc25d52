//! Suspend/resume handshake
//!
//! The protocol layer suspends rendering when a frame for this slave
//! arrives and resumes it once the reply is out. A pass that was running
//! stops at its next checkpoint; on resume it is owed one full repaint.
//!
//! ```text
//!        suspend            checkpoint
//!  Idle ────────► AbortRequested ────────► Aborted
//!   ▲                  │ resume               │ resume
//!   │◄─────────────────┘                      ▼
//!   └────────────── repaint pass ◄──────── Resuming
//! ```

use super::flags::RenderState;

/// Position in the suspend/resume handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SuspendState {
    /// Rendering allowed
    Idle,
    /// Abort requested, no checkpoint reached yet
    AbortRequested,
    /// A pass stopped at a checkpoint
    Aborted,
    /// Resumed after an abort, repaint not yet done
    Resuming,
}

/// What a resume did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResumeOutcome {
    /// A pass had stopped; one repaint is scheduled
    Repaint,
    /// No pass had stopped; the abort request was withdrawn
    Withdrawn,
    /// Nothing was suspended
    NotSuspended,
}

impl RenderState {
    /// Ask the running pass to stop at its next checkpoint
    ///
    /// Safe to call from interrupt context. No new pass starts until
    /// [`resume`](Self::resume).
    pub fn suspend(&self) {
        self.request_abort();
    }

    /// Let rendering continue
    ///
    /// Safe to call from interrupt context.
    pub fn resume(&self) -> ResumeOutcome {
        if self.is_aborted() {
            self.clear_abort();
            self.clear_aborted();
            self.raise_repaint();
            ResumeOutcome::Repaint
        } else if self.is_abort_requested() {
            self.clear_abort();
            ResumeOutcome::Withdrawn
        } else {
            ResumeOutcome::NotSuspended
        }
    }

    /// Finish a resume that raced a checkpoint
    ///
    /// If a resume ran between a checkpoint seeing `abort` and setting
    /// `aborted`, the pass ends up aborted with no abort pending and no
    /// repaint scheduled. Called by the dispatch loop with interrupts
    /// disabled.
    pub fn reconcile(&self) -> Option<ResumeOutcome> {
        if self.is_aborted() && !self.is_abort_requested() {
            Some(self.resume())
        } else {
            None
        }
    }

    /// Current handshake state
    pub fn suspend_state(&self) -> SuspendState {
        match (self.is_abort_requested(), self.is_aborted()) {
            (true, true) => SuspendState::Aborted,
            (true, false) => SuspendState::AbortRequested,
            (false, true) => SuspendState::Resuming,
            (false, false) if self.is_repaint_pending() => SuspendState::Resuming,
            (false, false) => SuspendState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::CancelToken;

    #[test]
    fn test_suspend_then_resume_without_pass() {
        let state = RenderState::new();
        state.suspend();
        assert_eq!(state.suspend_state(), SuspendState::AbortRequested);

        assert_eq!(state.resume(), ResumeOutcome::Withdrawn);
        assert_eq!(state.suspend_state(), SuspendState::Idle);
        assert!(!state.is_repaint_pending());
    }

    #[test]
    fn test_resume_after_abort_schedules_repaint() {
        let state = RenderState::new();
        state.suspend();
        let _ = CancelToken::new(&state).checkpoint();
        assert_eq!(state.suspend_state(), SuspendState::Aborted);

        assert_eq!(state.resume(), ResumeOutcome::Repaint);
        assert_eq!(state.suspend_state(), SuspendState::Resuming);
        assert!(state.take_repaint());
        assert_eq!(state.suspend_state(), SuspendState::Idle);
    }

    #[test]
    fn test_resume_when_idle() {
        let state = RenderState::new();
        assert_eq!(state.resume(), ResumeOutcome::NotSuspended);
    }

    #[test]
    fn test_reconcile_resume_checkpoint_race() {
        let state = RenderState::new();
        state.suspend();
        // Resume lands after the checkpoint read `abort`, before it set `aborted`
        assert_eq!(state.resume(), ResumeOutcome::Withdrawn);
        state.mark_aborted();
        assert_eq!(state.suspend_state(), SuspendState::Resuming);

        assert_eq!(state.reconcile(), Some(ResumeOutcome::Repaint));
        assert!(state.is_repaint_pending());
        assert!(!state.is_aborted());
    }

    #[test]
    fn test_reconcile_leaves_pending_abort_alone() {
        let state = RenderState::new();
        state.suspend();
        let _ = CancelToken::new(&state).checkpoint();
        assert_eq!(state.reconcile(), None);
        assert_eq!(state.suspend_state(), SuspendState::Aborted);
    }
}
