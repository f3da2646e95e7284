//! Connectivity tracking.

use std::{cell::Cell, rc::Rc};

use crate::signals::{Signal, SignalHub, Subscription};

/// Tracks connectivity for the view.
///
/// Seeded from the platform on mount and updated by `Online`/`Offline`
/// signals. Both subscriptions are released together when the monitor drops.
#[derive(Debug)]
pub struct OnlineStatusMonitor {
    online: Rc<Cell<bool>>,
    _subscriptions: [Subscription; 2],
}

impl OnlineStatusMonitor {
    /// Starts monitoring `hub`.
    #[must_use]
    pub fn mount(hub: &SignalHub) -> Self {
        let online = Rc::new(Cell::new(hub.is_online()));
        let listen = |signal, value| {
            let online = Rc::clone(&online);
            hub.subscribe(signal, move || {
                log::debug!("connectivity changed: online = {value}");
                online.set(value);
            })
        };
        let subscriptions = [listen(Signal::Online, true), listen(Signal::Offline, false)];
        Self {
            online,
            _subscriptions: subscriptions,
        }
    }

    /// Returns the last observed connectivity.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.get()
    }
}
