//! The authoritative record of session lifecycle and elapsed time.

use std::{cell::RefCell, rc::Rc};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a session.
///
/// A pending computation is tracked separately; it overlays `Active` or `Paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum Lifecycle {
    /// The player is solving and the timer runs.
    #[display("active")]
    Active,
    /// The session is paused.
    #[display("paused")]
    Paused,
    /// The puzzle is solved. Terminal.
    #[display("solved")]
    Solved,
}

/// Lifecycle flags of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionControls {
    /// The player or a focus loss paused the session.
    pub paused: bool,
    /// The puzzle is solved.
    pub solved: bool,
    /// A solve request is outstanding.
    pub solved_loading_pending: bool,
}

impl SessionControls {
    /// Returns `true` if the timer may advance.
    #[must_use]
    pub const fn timer_runs(self) -> bool {
        !(self.paused || self.solved || self.solved_loading_pending)
    }
}

/// Shared handle to a [`SessionStore`], used by the components of one mounted view.
pub type SharedStore = Rc<RefCell<SessionStore>>;

/// Single source of truth for lifecycle flags and elapsed time.
///
/// Every mutation goes through the methods below. Each returns `true` if it
/// changed state, and `false` if the current state rejected it.
#[derive(Debug, Default)]
pub struct SessionStore {
    controls: SessionControls,
    pause_deferred: bool,
    elapsed_seconds: u64,
    epoch: u64,
}

impl SessionStore {
    /// Creates an active session with no elapsed time.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store wrapped for sharing.
    #[must_use]
    pub fn shared() -> SharedStore {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Returns the current lifecycle flags.
    #[must_use]
    pub fn controls(&self) -> SessionControls {
        self.controls
    }

    /// Returns whole seconds counted while the timer ran.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Returns the session generation, bumped by every [`reset`](Self::reset).
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns the lifecycle state derived from the flags.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        if self.controls.solved {
            Lifecycle::Solved
        } else if self.controls.paused {
            Lifecycle::Paused
        } else {
            Lifecycle::Active
        }
    }

    /// Returns `true` once the puzzle is solved.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.controls.solved
    }

    /// Returns `true` while paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.controls.paused
    }

    /// Returns `true` while a solve request is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.controls.solved_loading_pending
    }

    /// Returns `true` if a focus loss arrived while a solve request was outstanding.
    ///
    /// The pause is applied once the request resolves.
    #[must_use]
    pub fn is_pause_deferred(&self) -> bool {
        self.pause_deferred
    }

    /// Reacts to the view losing focus.
    ///
    /// Pauses an active session. While a solve request is outstanding the
    /// pause is deferred until [`set_computation_pending`](Self::set_computation_pending)
    /// clears the flag. Ignored once solved.
    pub fn focus_lost(&mut self) -> bool {
        if self.controls.solved {
            return false;
        }
        if self.controls.solved_loading_pending {
            log::debug!("focus lost while a solve is pending; pause deferred");
            self.pause_deferred = true;
            return false;
        }
        self.pause()
    }

    /// Pauses the session. Ignored once solved.
    pub fn pause(&mut self) -> bool {
        if self.controls.solved || self.controls.paused {
            return false;
        }
        self.controls.paused = true;
        log::debug!("session paused at {}s", self.elapsed_seconds);
        true
    }

    /// Resumes the session and drops any deferred pause. Ignored once solved.
    pub fn resume(&mut self) -> bool {
        if self.controls.solved {
            return false;
        }
        let deferred = std::mem::take(&mut self.pause_deferred);
        if !self.controls.paused {
            return deferred;
        }
        self.controls.paused = false;
        log::debug!("session resumed at {}s", self.elapsed_seconds);
        true
    }

    /// Marks the puzzle solved. Terminal and idempotent.
    pub fn mark_solved(&mut self) -> bool {
        if self.controls.solved {
            return false;
        }
        self.controls.solved = true;
        log::info!("session solved in {}s", self.elapsed_seconds);
        true
    }

    /// Advances the timer by one second if the session is running.
    pub fn tick(&mut self) -> bool {
        if !self.controls.timer_runs() {
            return false;
        }
        self.elapsed_seconds += 1;
        true
    }

    /// Flags whether a solve request is outstanding.
    ///
    /// Clearing the flag applies a pause deferred by [`focus_lost`](Self::focus_lost).
    pub fn set_computation_pending(&mut self, pending: bool) {
        if self.controls.solved_loading_pending != pending {
            log::debug!("computation pending: {pending}");
        }
        self.controls.solved_loading_pending = pending;
        if !pending && std::mem::take(&mut self.pause_deferred) {
            self.pause();
        }
    }

    /// Starts a fresh session.
    ///
    /// Replies to requests issued before the reset are discarded by the
    /// dispatcher, since they carry the previous epoch.
    pub fn reset(&mut self) {
        self.controls = SessionControls::default();
        self.pause_deferred = false;
        self.elapsed_seconds = 0;
        self.epoch += 1;
        log::debug!("session reset, epoch {}", self.epoch);
    }
}
