//! Session controller for interactive constraint-puzzle solving.
//!
//! A session tracks whether the player is solving, paused or done, counts
//! elapsed time while it runs, and offloads solving to an engine on a
//! background worker. All session state lives in one [`SessionStore`] owned
//! by the interactive thread; the other components mutate it only through
//! its methods.
//!
//! # Components
//!
//! - [`TimerTicker`] advances the elapsed time while the session runs.
//! - [`BlurPauseGuard`] pauses the session when the view loses focus.
//! - [`OnlineStatusMonitor`] tracks connectivity.
//! - [`SolverDispatcher`] sends solve and check requests to the engine and
//!   merges the matching replies.
//! - [`MemoizedValidator`] caches the set of cells that break a rule.
//!
//! [`SessionController`] mounts all of them for one view.
//!
//! # Example
//!
//! ```
//! use std::{rc::Rc, time::{Duration, Instant}};
//!
//! use pencilmark_core::Constraints;
//! use pencilmark_engine::ReferenceEngine;
//! use pencilmark_session::{Lifecycle, SessionController, SessionSettings, Signal, SignalHub};
//!
//! let hub = SignalHub::new(true);
//! let start = Instant::now();
//! let mut session = SessionController::mount(
//!     &hub,
//!     Rc::new(Constraints::classic(4)),
//!     SessionSettings::default(),
//!     ReferenceEngine::new(),
//!     start,
//! );
//!
//! session.update(start + Duration::from_secs(3));
//! assert_eq!(session.elapsed_seconds(), 3);
//!
//! hub.emit(Signal::Blur);
//! assert_eq!(session.lifecycle(), Lifecycle::Paused);
//! ```

pub mod blur_guard;
pub mod controller;
pub mod dispatcher;
pub mod online;
pub mod settings;
pub mod signals;
pub mod store;
pub mod ticker;
pub mod validator;

pub use self::{
    blur_guard::BlurPauseGuard,
    controller::SessionController,
    dispatcher::{
        SolveError, SolveEvent, SolveKind, SolveResult, SolveTicket, SolverDispatcher, WorkError,
    },
    online::OnlineStatusMonitor,
    settings::{SessionSettings, SettingsError},
    signals::{Signal, SignalHub, Subscription},
    store::{Lifecycle, SessionControls, SessionStore, SharedStore},
    ticker::TimerTicker,
    validator::MemoizedValidator,
};
