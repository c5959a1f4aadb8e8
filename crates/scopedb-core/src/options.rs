//! Execution options and the process-wide default.

use serde::{Deserialize, Serialize};
use std::sync::{OnceLock, RwLock};
use thiserror::Error;

pub const ENV_COMMIT_ON_PRIMARY_SUCCESS: &str = "SCOPEDB_COMMIT_ON_PRIMARY_SUCCESS";
pub const ENV_COMMIT_ON_RECOVERY_SUCCESS: &str = "SCOPEDB_COMMIT_ON_RECOVERY_SUCCESS";

/// Commit policy for one execution.
///
/// Both switches default to `false`: nothing is committed unless the caller
/// opts in. A transaction that is not committed is rolled back on release.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionOptions {
    /// Commit after the primary operation succeeds, before returning its value.
    pub commit_on_primary_success: bool,

    /// Commit after the recovery operation succeeds.
    pub commit_on_recovery_success: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid execution options: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {var}: {value:?} (expected true/false)")]
    InvalidEnv { var: &'static str, value: String },
}

fn global_slot() -> &'static RwLock<ExecutionOptions> {
    static GLOBAL: OnceLock<RwLock<ExecutionOptions>> = OnceLock::new();
    GLOBAL.get_or_init(|| RwLock::new(ExecutionOptions::default()))
}

impl ExecutionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that commit after either operation succeeds.
    pub fn commit_on_success() -> Self {
        Self {
            commit_on_primary_success: true,
            commit_on_recovery_success: true,
        }
    }

    pub fn with_commit_on_primary_success(mut self, enabled: bool) -> Self {
        self.commit_on_primary_success = enabled;
        self
    }

    pub fn with_commit_on_recovery_success(mut self, enabled: bool) -> Self {
        self.commit_on_recovery_success = enabled;
        self
    }

    /// Parse options from YAML. Missing keys keep their defaults.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Overlay `SCOPEDB_COMMIT_ON_*` environment variables onto `self`.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_flag(ENV_COMMIT_ON_PRIMARY_SUCCESS)? {
            self.commit_on_primary_success = v;
        }
        if let Some(v) = env_flag(ENV_COMMIT_ON_RECOVERY_SUCCESS)? {
            self.commit_on_recovery_success = v;
        }
        Ok(self)
    }

    /// Snapshot of the process-wide default.
    pub fn global() -> Self {
        match global_slot().read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Replace the process-wide default. Last write wins; executions that
    /// already started keep the snapshot they took.
    pub fn set_global(options: ExecutionOptions) {
        let mut slot = match global_slot().write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        tracing::debug!(?options, "process-wide execution options replaced");
        *slot = options;
    }

    /// Initialise the process-wide default from the environment.
    pub fn init_global_from_env() -> Result<Self, ConfigError> {
        let options = Self::default().with_env_overrides()?;
        Self::set_global(options);
        Ok(options)
    }

    /// Per-call options win; otherwise the process-wide default applies.
    pub fn resolve(per_call: Option<ExecutionOptions>) -> Self {
        per_call.unwrap_or_else(Self::global)
    }
}

fn env_flag(var: &'static str) -> Result<Option<bool>, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidEnv { var, value: raw }),
    }
}

/// Scoped override of the process-wide default; restores the previous value
/// on drop.
pub struct GlobalOptionsGuard {
    previous: ExecutionOptions,
}

impl GlobalOptionsGuard {
    pub fn set(options: ExecutionOptions) -> Self {
        let previous = ExecutionOptions::global();
        ExecutionOptions::set_global(options);
        Self { previous }
    }
}

impl Drop for GlobalOptionsGuard {
    fn drop(&mut self) {
        ExecutionOptions::set_global(self.previous);
    }
}
