// rmx-common/src/config.rs
use std::env;
use std::path::PathBuf;

use tracing::debug;

use super::error::{Result, RmxError};

const DEFAULT_BREW_BIN: &str = "brew";

/// Everything the runner-matrix decision needs from the surrounding CI
/// environment, resolved once at startup. The decision logic itself never
/// reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub linux_runner: String,
    pub linux_cleanup: bool,
    pub github_run_id: String,
    pub github_run_attempt: String,
    pub github_output: PathBuf,
    pub brew_bin: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. `load` passes
    /// `env::var`; tests pass a map so they never mutate process state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!("Loading rmx configuration");

        let linux_runner = require(&lookup, "HOMEBREW_LINUX_RUNNER")?;
        let linux_cleanup = require(&lookup, "HOMEBREW_LINUX_CLEANUP")? == "true";
        let github_run_id = require(&lookup, "GITHUB_RUN_ID")?;
        let github_run_attempt = require(&lookup, "GITHUB_RUN_ATTEMPT")?;
        let github_output = PathBuf::from(require(&lookup, "GITHUB_OUTPUT")?);

        let brew_bin = lookup("RMX_BREW_BIN")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BREW_BIN));

        debug!("Configuration loaded successfully.");
        Ok(Self {
            linux_runner,
            linux_cleanup,
            github_run_id,
            github_run_attempt,
            github_output,
            brew_bin,
        })
    }

    /// Suffix appended to ephemeral runner names so concurrent CI runs
    /// never collide on the same hardware label.
    pub fn ephemeral_suffix(&self) -> String {
        format!("-{}-{}", self.github_run_id, self.github_run_attempt)
    }
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RmxError::Config(format!("required environment variable {key} is not set")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn full_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("HOMEBREW_LINUX_RUNNER", "linux-self-hosted-1"),
            ("HOMEBREW_LINUX_CLEANUP", "false"),
            ("GITHUB_RUN_ID", "12345"),
            ("GITHUB_RUN_ATTEMPT", "2"),
            ("GITHUB_OUTPUT", "/tmp/github_output"),
        ])
    }

    #[test]
    fn loads_from_complete_environment() {
        let env = full_env();
        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.linux_runner, "linux-self-hosted-1");
        assert!(!config.linux_cleanup);
        assert_eq!(config.ephemeral_suffix(), "-12345-2");
        assert_eq!(config.brew_bin, PathBuf::from("brew"));
    }

    #[test]
    fn missing_required_key_is_fatal() {
        let mut env = full_env();
        env.remove("GITHUB_RUN_ID");
        let err = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, RmxError::Config(_)));
        assert!(err.to_string().contains("GITHUB_RUN_ID"));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut env = full_env();
        env.insert("HOMEBREW_LINUX_RUNNER", "");
        let err = Config::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap_err();
        assert!(matches!(err, RmxError::Config(_)));
    }
}
