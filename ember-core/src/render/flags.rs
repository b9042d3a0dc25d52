//! Render flags
//!
//! Every flag is a single atomic bit with one raise side and one consume
//! side. The accessor names say which side a caller is on:
//!
//! | flag      | raised by                               | consumed by           |
//! |-----------|-----------------------------------------|-----------------------|
//! | `updated` | register writes, completed fire pass    | cyclic timer          |
//! | `update`  | cyclic timer                            | dispatch loop         |
//! | `abort`   | `suspend` (any context)                 | `resume`, dispatch loop |
//! | `aborted` | render pass at a checkpoint             | `resume`, dispatch loop |
//! | `repaint` | `resume` after an aborted pass          | dispatch loop         |

use portable_atomic::{AtomicBool, Ordering};

/// Flags shared between interrupt context and the dispatch loop
#[derive(Debug)]
pub struct RenderState {
    updated: AtomicBool,
    update: AtomicBool,
    abort: AtomicBool,
    aborted: AtomicBool,
    repaint: AtomicBool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderState {
    /// All flags clear
    pub const fn new() -> Self {
        Self {
            updated: AtomicBool::new(false),
            update: AtomicBool::new(false),
            abort: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            repaint: AtomicBool::new(false),
        }
    }

    /// New frame data is ready
    pub fn mark_updated(&self) {
        self.updated.store(true, Ordering::Release);
    }

    /// Check whether frame data is waiting for the next tick
    pub fn is_updated(&self) -> bool {
        self.updated.load(Ordering::Acquire)
    }

    /// Cyclic tick: turn `updated` into `update` unless aborting
    ///
    /// Returns true if a pass was requested.
    pub fn promote_due(&self) -> bool {
        if self.is_abort_requested() {
            return false;
        }
        if self.updated.swap(false, Ordering::AcqRel) {
            self.update.store(true, Ordering::Release);
            true
        } else {
            false
        }
    }

    /// Consume a pending render pass request
    pub fn take_update(&self) -> bool {
        self.update.swap(false, Ordering::AcqRel)
    }

    /// Check whether a render pass is requested
    pub fn is_update_pending(&self) -> bool {
        self.update.load(Ordering::Acquire)
    }

    /// Check whether an abort is requested
    pub fn is_abort_requested(&self) -> bool {
        self.abort.load(Ordering::Acquire)
    }

    /// Check whether a render pass stopped at a checkpoint
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Consume a pending forced repaint
    pub fn take_repaint(&self) -> bool {
        self.repaint.swap(false, Ordering::AcqRel)
    }

    /// Check whether a forced repaint is owed
    pub fn is_repaint_pending(&self) -> bool {
        self.repaint.load(Ordering::Acquire)
    }

    pub(crate) fn request_abort(&self) {
        self.abort.store(true, Ordering::Release);
    }

    pub(crate) fn clear_abort(&self) {
        self.abort.store(false, Ordering::Release);
    }

    pub(crate) fn mark_aborted(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub(crate) fn clear_aborted(&self) {
        self.aborted.store(false, Ordering::Release);
    }

    pub(crate) fn raise_repaint(&self) {
        self.repaint.store(true, Ordering::Release);
    }
}
