//! Pausing on focus loss.

use std::{cell::Cell, rc::Rc};

use crate::{
    signals::{Signal, SignalHub, Subscription},
    store::{SessionStore, SharedStore},
};

/// Pauses the session when the view loses focus.
///
/// Focus loss is ignored once the puzzle is solved. While a solve request is
/// outstanding the pause is deferred until the request resolves. Registering
/// again replaces the previous subscription, so at most one blur handler is
/// live per guard.
///
/// A focus loss that arrives while the store is borrowed elsewhere is kept
/// and applied by the next [`flush`](Self::flush).
#[derive(Debug, Default)]
pub struct BlurPauseGuard {
    subscription: Option<Subscription>,
    missed: Rc<Cell<bool>>,
}

impl BlurPauseGuard {
    /// Creates a guard already listening on `hub`.
    #[must_use]
    pub fn mount(hub: &SignalHub, store: &SharedStore) -> Self {
        let mut guard = Self::default();
        guard.register(hub, store);
        guard
    }

    /// Listens for focus loss on `hub`, dropping any earlier registration first.
    pub fn register(&mut self, hub: &SignalHub, store: &SharedStore) {
        self.subscription = None;
        let store = Rc::clone(store);
        let missed = Rc::clone(&self.missed);
        self.subscription = Some(hub.subscribe(Signal::Blur, move || {
            if let Ok(mut store) = store.try_borrow_mut() {
                store.focus_lost();
            } else {
                log::debug!("store busy on focus loss; pause queued");
                missed.set(true);
            }
        }));
    }

    /// Applies a focus loss that could not reach the store when it happened.
    pub fn flush(&self, store: &mut SessionStore) {
        if self.missed.take() {
            store.focus_lost();
        }
    }

    /// Stops listening.
    pub fn unregister(&mut self) {
        self.subscription = None;
    }

    /// Returns `true` while a handler is registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.subscription.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Lifecycle;

    #[test]
    fn test_blur_pauses_active_session() {
        let hub = SignalHub::new(true);
        let store = SessionStore::shared();
        let _guard = BlurPauseGuard::mount(&hub, &store);

        hub.emit(Signal::Blur);
        assert_eq!(store.borrow().lifecycle(), Lifecycle::Paused);
        assert!(!store.borrow_mut().tick());
    }

    #[test]
    fn test_blur_ignored_while_solved() {
        let hub = SignalHub::new(true);
        let store = SessionStore::shared();
        let _guard = BlurPauseGuard::mount(&hub, &store);

        store.borrow_mut().mark_solved();
        hub.emit(Signal::Blur);
        assert_eq!(store.borrow().lifecycle(), Lifecycle::Solved);
    }

    #[test]
    fn test_blur_while_pending_pauses_on_resolution() {
        let hub = SignalHub::new(true);
        let store = SessionStore::shared();
        let _guard = BlurPauseGuard::mount(&hub, &store);

        store.borrow_mut().set_computation_pending(true);
        hub.emit(Signal::Blur);
        assert!(!store.borrow().is_paused());

        store.borrow_mut().set_computation_pending(false);
        assert_eq!(store.borrow().lifecycle(), Lifecycle::Paused);
    }

    #[test]
    fn test_blur_during_borrow_is_applied_on_flush() {
        let hub = SignalHub::new(true);
        let store = SessionStore::shared();
        let guard = BlurPauseGuard::mount(&hub, &store);

        {
            let _reader = store.borrow();
            hub.emit(Signal::Blur);
        }
        assert!(!store.borrow().is_paused());

        guard.flush(&mut store.borrow_mut());
        assert_eq!(store.borrow().lifecycle(), Lifecycle::Paused);
        guard.flush(&mut store.borrow_mut());
        assert!(store.borrow_mut().resume());
    }

    #[test]
    fn test_reregister_keeps_one_handler() {
        let hub = SignalHub::new(true);
        let store = SessionStore::shared();
        let mut guard = BlurPauseGuard::mount(&hub, &store);
        guard.register(&hub, &store);
        guard.register(&hub, &store);
        assert_eq!(hub.handler_count(Signal::Blur), 1);

        guard.unregister();
        assert!(!guard.is_registered());
        assert_eq!(hub.handler_count(Signal::Blur), 0);
    }

    #[test]
    fn test_drop_unregisters() {
        let hub = SignalHub::new(true);
        let store = SessionStore::shared();
        drop(BlurPauseGuard::mount(&hub, &store));

        hub.emit(Signal::Blur);
        assert!(!store.borrow().is_paused());
    }
}
