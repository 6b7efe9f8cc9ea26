use core::fmt;

use crate::{Function, config::FINALIZER_FOOTPRINT};

/// Runs an action when dropped, unless disarmed.
///
/// The action is stored inline like any [`Function`]. Moving a finalizer moves
/// the action with it, so it runs exactly once, when the last owner goes away.
/// Assigning over a finalizer runs the overwritten one first.
///
/// ```rust
/// use core::cell::Cell;
/// use ramen::Finalizer;
///
/// let released = Cell::new(false);
/// {
///     let _guard: Finalizer = Finalizer::new(|| released.set(true));
/// }
/// assert!(released.get());
/// ```
pub struct Finalizer<'a, const FOOTPRINT: usize = FINALIZER_FOOTPRINT> {
    action: Function<'a, fn(), FOOTPRINT>,
}

impl<'a, const FOOTPRINT: usize> Finalizer<'a, FOOTPRINT> {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn() + 'a,
    {
        Self {
            action: Function::<fn(), FOOTPRINT>::new(action),
        }
    }

    /// Drops the action without running it.
    pub fn disarm(&mut self) {
        self.action.clear();
    }

    pub fn is_armed(&self) -> bool {
        self.action.has_target()
    }
}

impl<const FOOTPRINT: usize> Default for Finalizer<'_, FOOTPRINT> {
    /// A finalizer with nothing to run.
    fn default() -> Self {
        Self {
            action: Function::default(),
        }
    }
}

impl<const FOOTPRINT: usize> Drop for Finalizer<'_, FOOTPRINT> {
    fn drop(&mut self) {
        if self.action.has_target() {
            self.action.call()
        }
    }
}

impl<const FOOTPRINT: usize> fmt::Debug for Finalizer<'_, FOOTPRINT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Finalizer")
            .field("armed", &self.is_armed())
            .finish()
    }
}
