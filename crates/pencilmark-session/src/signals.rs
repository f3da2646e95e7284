//! Platform signals delivered to the session components.
//!
//! A [`SignalHub`] stands in for the host platform: the embedding view calls
//! [`SignalHub::emit`] when focus is lost or connectivity changes, and
//! components listen with [`SignalHub::subscribe`]. Handlers run synchronously
//! on the emitting thread, so a state change made by a handler is visible
//! before `emit` returns.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

/// A platform event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum Signal {
    /// Connectivity was restored.
    #[display("online")]
    Online,
    /// Connectivity was lost.
    #[display("offline")]
    Offline,
    /// The view lost focus.
    #[display("blur")]
    Blur,
}

type Handler = Rc<RefCell<dyn FnMut()>>;

struct Registration {
    id: u64,
    signal: Signal,
    handler: Handler,
}

struct HubState {
    next_id: u64,
    online: bool,
    registrations: Vec<Registration>,
}

/// Dispatches platform signals to subscribed handlers.
///
/// Cloning yields another handle to the same hub.
#[derive(Clone)]
pub struct SignalHub {
    state: Rc<RefCell<HubState>>,
}

impl fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("SignalHub")
            .field("online", &state.online)
            .field("handlers", &state.registrations.len())
            .finish()
    }
}

impl SignalHub {
    /// Creates a hub whose platform starts with the given connectivity.
    #[must_use]
    pub fn new(online: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(HubState {
                next_id: 0,
                online,
                registrations: Vec::new(),
            })),
        }
    }

    /// Queries the platform's current connectivity.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.state.borrow().online
    }

    /// Registers `handler` for `signal`.
    ///
    /// The handler stays registered until the returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unregisters the handler"]
    pub fn subscribe(&self, signal: Signal, handler: impl FnMut() + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.registrations.push(Registration {
            id,
            signal,
            handler: Rc::new(RefCell::new(handler)),
        });
        log::trace!("subscribed handler {id} to {signal}");
        Subscription {
            hub: Rc::downgrade(&self.state),
            id,
        }
    }

    /// Delivers `signal` to every handler registered for it.
    ///
    /// `Online` and `Offline` also update the connectivity reported by
    /// [`is_online`](Self::is_online) before any handler runs. A handler
    /// unsubscribed by an earlier handler of the same emission is skipped.
    pub fn emit(&self, signal: Signal) {
        let targets = {
            let mut state = self.state.borrow_mut();
            match signal {
                Signal::Online => state.online = true,
                Signal::Offline => state.online = false,
                Signal::Blur => {}
            }
            state
                .registrations
                .iter()
                .filter(|r| r.signal == signal)
                .map(|r| (r.id, Rc::clone(&r.handler)))
                .collect::<Vec<_>>()
        };
        log::trace!("emitting {signal} to {} handlers", targets.len());

        for (id, handler) in targets {
            let registered = self.state.borrow().registrations.iter().any(|r| r.id == id);
            if !registered {
                continue;
            }
            let Ok(mut handler) = handler.try_borrow_mut() else {
                log::warn!("handler {id} re-entered while handling {signal}; skipped");
                continue;
            };
            handler();
        }
    }

    /// Returns the number of handlers registered for `signal`.
    #[must_use]
    pub fn handler_count(&self, signal: Signal) -> usize {
        self.state
            .borrow()
            .registrations
            .iter()
            .filter(|r| r.signal == signal)
            .count()
    }
}

/// Keeps a handler registered with a [`SignalHub`].
///
/// Dropping it unregisters the handler. Dropping after the hub is gone is a no-op.
pub struct Subscription {
    hub: Weak<RefCell<HubState>>,
    id: u64,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(state) = self.hub.upgrade() else {
            return;
        };
        // A handler may drop its own subscription while it runs; the hub is not
        // borrowed at that point, so this cannot conflict with `emit`.
        if let Ok(mut state) = state.try_borrow_mut() {
            state.registrations.retain(|r| r.id != self.id);
            log::trace!("unsubscribed handler {}", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn counter(hub: &SignalHub, signal: Signal) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0));
        let subscription = hub.subscribe(signal, {
            let count = Rc::clone(&count);
            move || count.set(count.get() + 1)
        });
        (count, subscription)
    }

    #[test]
    fn test_emit_reaches_matching_handlers_only() {
        let hub = SignalHub::new(true);
        let (blurs, _blur) = counter(&hub, Signal::Blur);
        let (offlines, _offline) = counter(&hub, Signal::Offline);

        hub.emit(Signal::Blur);
        hub.emit(Signal::Blur);
        assert_eq!(blurs.get(), 2);
        assert_eq!(offlines.get(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let hub = SignalHub::new(true);
        let (count, subscription) = counter(&hub, Signal::Blur);
        assert_eq!(hub.handler_count(Signal::Blur), 1);

        drop(subscription);
        assert_eq!(hub.handler_count(Signal::Blur), 0);
        hub.emit(Signal::Blur);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_connectivity_follows_signals() {
        let hub = SignalHub::new(true);
        hub.emit(Signal::Offline);
        assert!(!hub.is_online());
        hub.emit(Signal::Online);
        assert!(hub.is_online());
    }

    #[test]
    fn test_handler_removed_mid_emit_is_skipped() {
        let hub = SignalHub::new(true);
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let _first = hub.subscribe(Signal::Blur, {
            let victim = Rc::clone(&victim);
            move || drop(victim.borrow_mut().take())
        });
        let (count, second) = counter(&hub, Signal::Blur);
        *victim.borrow_mut() = Some(second);

        hub.emit(Signal::Blur);
        assert_eq!(count.get(), 0);
        assert_eq!(hub.handler_count(Signal::Blur), 1);
    }

    #[test]
    fn test_subscription_outlives_hub() {
        let hub = SignalHub::new(false);
        let (_count, subscription) = counter(&hub, Signal::Online);
        drop(hub);
        drop(subscription);
    }
}
