//! User-tunable session settings.

use std::{fs, path::Path, time::Duration};

use pencilmark_core::SolverType;
use serde::{Deserialize, Serialize};

/// Errors that can occur while loading settings.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[display("failed to read settings: {_0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON for [`SessionSettings`].
    #[display("failed to parse settings: {_0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for one puzzle session.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionSettings {
    /// Elapsed-time ticking.
    pub timer: TimerSettings,
    /// Solve requests.
    pub solver: SolverSettings,
    /// Error highlighting.
    pub assist: AssistSettings,
}

impl SessionSettings {
    /// Reads settings from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&text)?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }
}

/// Timer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimerSettings {
    /// Milliseconds between ticks.
    pub tick_interval_ms: u64,
}

impl TimerSettings {
    /// Tick period, never shorter than one millisecond.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

/// Solver dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverSettings {
    /// Strategy used when a solve request names none.
    pub solver_type: SolverType,
    /// How long to wait for a reply. `None` waits forever.
    pub timeout_ms: Option<u64>,
}

impl SolverSettings {
    /// Reply deadline, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            solver_type: SolverType::Logical,
            timeout_ms: Some(30_000),
        }
    }
}

/// Player assistance settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssistSettings {
    /// Highlight cells that break a rule.
    pub check_errors: bool,
}

impl Default for AssistSettings {
    fn default() -> Self {
        Self { check_errors: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: SessionSettings =
            serde_json::from_str(r#"{"solver": {"solverType": "brute"}}"#).unwrap();
        assert_eq!(settings.solver.solver_type, SolverType::Brute);
        assert_eq!(settings.solver.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.timer.tick_interval(), Duration::from_secs(1));
        assert!(settings.assist.check_errors);
    }

    #[test]
    fn test_null_timeout_waits_forever() {
        let settings: SessionSettings =
            serde_json::from_str(r#"{"solver": {"timeoutMs": null}}"#).unwrap();
        assert_eq!(settings.solver.timeout(), None);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let timer = TimerSettings {
            tick_interval_ms: 0,
        };
        assert_eq!(timer.tick_interval(), Duration::from_millis(1));
    }
}
