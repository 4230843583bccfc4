// rmx-core/src/dependents.rs
//! The external dependent query: which formulae transitively depend on a
//! given formula, as answered by `brew uses`.
use std::path::PathBuf;
use std::process::{Command, Stdio};

use rmx_common::error::{Result, RmxError};
use tracing::{debug, error};

/// Answers "which formulae transitively depend on this one", including
/// build-only and test-only edges. The simulation flag makes the answer
/// reflect macOS build conditionals even when the query host is Linux.
pub trait DependentQuery {
    fn dependents_of(&self, formula: &str, simulate_macos_on_linux: bool) -> Result<Vec<String>>;
}

/// Production implementation shelling out to `brew uses`. One line of
/// stdout per dependent formula name.
pub struct BrewDependentQuery {
    pub brew_bin: PathBuf,
    pub eval_all: bool,
}

impl DependentQuery for BrewDependentQuery {
    fn dependents_of(&self, formula: &str, simulate_macos_on_linux: bool) -> Result<Vec<String>> {
        let mut cmd = Command::new(&self.brew_bin);
        cmd.args(["uses", "--include-build", "--include-test"]);
        if self.eval_all {
            cmd.arg("--eval-all");
        }
        cmd.arg(formula);

        if simulate_macos_on_linux {
            cmd.env("HOMEBREW_SIMULATE_MACOS_ON_LINUX", "1");
        }

        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.stdin(Stdio::null());

        debug!(
            "Running dependent query: {} uses --include-build --include-test{} {} (simulate={})",
            self.brew_bin.display(),
            if self.eval_all { " --eval-all" } else { "" },
            formula,
            simulate_macos_on_linux
        );

        let output = cmd.output().map_err(|e| {
            error!("Failed to execute dependent query: {}", e);
            RmxError::CommandExec(format!("{}: {e}", self.brew_bin.display()))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("Dependent query failed with status: {}", output.status);
            if !stderr.trim().is_empty() {
                debug!("Stderr:\n{}", stderr.trim());
            }
            return Err(RmxError::DependentQuery(
                formula.to_string(),
                format!("{} ({})", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            RmxError::DependentQuery(formula.to_string(), format!("non-UTF-8 output: {e}"))
        })?;

        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }
}
