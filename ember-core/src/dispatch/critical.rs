//! Scoped critical section

use ember_hal::Interrupts;

/// Interrupts stay disabled while this guard lives
///
/// Dropping the guard restores the state found on entry, on every exit
/// path.
pub struct CriticalSection<'a, I: Interrupts> {
    interrupts: &'a mut I,
    was_enabled: bool,
}

impl<'a, I: Interrupts> CriticalSection<'a, I> {
    /// Disable interrupts until the guard is dropped
    pub fn enter(interrupts: &'a mut I) -> Self {
        let was_enabled = interrupts.disable();
        Self {
            interrupts,
            was_enabled,
        }
    }
}

impl<I: Interrupts> Drop for CriticalSection<'_, I> {
    fn drop(&mut self) {
        self.interrupts.restore(self.was_enabled);
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockInterrupts;
    use super::*;

    #[test]
    fn test_guard_restores_on_drop() {
        let mut irq = MockInterrupts::default();
        {
            let _cs = CriticalSection::enter(&mut irq);
        }
        assert!(irq.enabled);
    }

    #[test]
    fn test_nested_sections_keep_outer_state() {
        let mut irq = MockInterrupts::default();
        let outer = irq.disable();
        {
            let _cs = CriticalSection::enter(&mut irq);
        }
        assert!(!irq.enabled);
        irq.restore(outer);
        assert!(irq.enabled);
    }

    #[test]
    fn test_guard_restores_on_early_return() {
        fn early(irq: &mut MockInterrupts) -> Option<()> {
            let _cs = CriticalSection::enter(irq);
            None::<()>?;
            Some(())
        }

        let mut irq = MockInterrupts::default();
        assert_eq!(early(&mut irq), None);
        assert!(irq.enabled);
    }
}
