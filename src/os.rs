//! Scoped access to the state shared with interrupt handlers

use crate::state::SharedState;
use core::cell::RefCell;

/// Runs a closure with exclusive access to the shared state.
///
/// Interrupt handlers already own the state for their whole run, so this is
/// only needed by the foreground loop. Keep the closure short: on the target it
/// runs with interrupts masked.
pub trait Shared {
    fn with<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R;
}

/// Single-context access, for code that never races a handler.
impl Shared for RefCell<SharedState> {
    #[inline]
    fn with<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        f(&mut *self.borrow_mut())
    }
}

#[cfg(target_arch = "avr")]
impl Shared for avr_device::interrupt::Mutex<RefCell<SharedState>> {
    #[inline]
    fn with<R>(&self, f: impl FnOnce(&mut SharedState) -> R) -> R {
        avr_device::interrupt::free(|cs| f(&mut *self.borrow(cs).borrow_mut()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Digit;

    #[test]
    fn refcell_access_is_visible_to_later_calls() {
        let shared = RefCell::new(SharedState::new());
        let entered = shared.with(|s| s.enter_digit(Digit::new(5).unwrap()));
        assert!(entered);
        assert_eq!(shared.with(|s| s.digits().value()), 15);
    }
}
