// rmx/src/output.rs
//! Writes the runner list to the CI output channel and to the terminal.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use colored::Colorize;
use rmx_common::error::{Result, RmxError};
use rmx_core::matrix::RunnerSpec;
use tracing::debug;

pub fn print_summary(runners: &[RunnerSpec]) {
    println!("{}{}", "==> ".bold().blue(), "Runners".bold());
    for runner in runners {
        if runner.no_op {
            println!("  {} (nothing to test)", runner.name);
        } else {
            println!("  {} ({})", runner.name, runner.runner);
        }
    }
}

/// Appends the matrix to the CI output file in `key=value` form.
pub fn write_runners(path: &Path, runners: &[RunnerSpec]) -> Result<()> {
    let json = serde_json::to_string(runners)?;
    debug!("Writing {} runners to {}", runners.len(), path.display());

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| RmxError::Output(format!("Failed to open {}: {e}", path.display())))?;
    writeln!(file, "runners={json}")
        .and_then(|()| writeln!(file, "runners_present={}", !runners.is_empty()))
        .map_err(|e| RmxError::Output(format!("Failed to write {}: {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, runner: &str) -> RunnerSpec {
        RunnerSpec {
            name: name.to_string(),
            runner: runner.to_string(),
            container: None,
            workdir: None,
            timeout: None,
            cleanup: false,
            no_op: false,
        }
    }

    #[test]
    fn appends_runners_and_presence_flag() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write_runners(file.path(), &[spec("Linux", "linux-self-hosted-1")]).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = contents.lines();
        let runners_line = lines.next().unwrap();
        assert!(runners_line.starts_with("runners=["));
        assert!(runners_line.contains("\"runner\":\"linux-self-hosted-1\""));
        assert_eq!(lines.next().unwrap(), "runners_present=true");
    }

    #[test]
    fn empty_matrix_reports_absent_runners() {
        let file = tempfile::NamedTempFile::new().unwrap();
        write_runners(file.path(), &[]).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.contains("runners=[]"));
        assert!(contents.contains("runners_present=false"));
    }

    #[test]
    fn appends_rather_than_truncates() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "existing=1\n").unwrap();
        write_runners(file.path(), &[]).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        assert!(contents.starts_with("existing=1\n"));
    }
}
