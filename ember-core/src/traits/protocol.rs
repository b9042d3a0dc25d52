//! Protocol stack as seen by the dispatch loop

use ember_rtu::RegisterBank;

/// Deferred protocol work driven from the main loop
///
/// Both methods are called with interrupts disabled.
pub trait Protocol {
    /// Run one step of deferred processing against the register bank
    fn advance<B: RegisterBank>(&mut self, bank: &mut B);

    /// Check whether no frame is in progress and no reply is pending
    fn is_idle(&self) -> bool;
}
