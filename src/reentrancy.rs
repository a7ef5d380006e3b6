//! Debug-only reentrancy guard.
//!
//! The containers call user `Hash`/`Eq` code while the buffer can be in a
//! transient state: during growth, and while erase lifts elements out of
//! their slots to re-place them. User code reaching back into the same
//! container at that point would observe a half-repaired probe run. In debug
//! builds such nested entry panics; in release builds the guard is a no-op.

use core::cell::Cell;
#[cfg(not(debug_assertions))]
use core::marker::PhantomData;

/// Per-container entry tracker. Public entry points open a section with
/// `let _g = self.reentrancy.enter();`.
#[derive(Debug, Default)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    entered: Cell<bool>,
    #[cfg(not(debug_assertions))]
    _unsync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            entered: Cell::new(false),
            #[cfg(not(debug_assertions))]
            _unsync: PhantomData,
        }
    }

    /// Opens a guarded section. Panics in debug builds if one is already open.
    #[inline]
    pub(crate) fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.entered.replace(true),
                "reentrancy detected: container entered from its own Hash/Eq callback"
            );
            ReentrancyGuard { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            ReentrancyGuard { _owner: PhantomData }
        }
    }
}

/// Closes the section on drop.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a DebugReentrancy>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.entered.get());
            self.owner.entered.set(false);
        }
    }
}
