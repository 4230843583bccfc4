// rmx/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use rmx_common::config::Config;
use rmx_common::error::Result;
use rmx_common::formulary::Formulary;
use rmx_common::model::MacOsCatalog;
use rmx_core::compat::FormulaCompat;
use rmx_core::coverage::CoverageEngine;
use rmx_core::dependents::BrewDependentQuery;
use rmx_core::matrix::MatrixBuilder;
use tracing::debug;

use crate::output;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "rmx", bin_name = "rmx")]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Decide runners for the dependents of the changed formulae instead
    /// of the changed formulae themselves
    #[arg(long)]
    pub dependents: bool,

    /// Evaluate dependents across the whole catalog, not just installed
    /// formulae
    #[arg(long)]
    pub eval_all: bool,

    /// Path to the formula catalog JSON
    #[arg(long, value_name = "PATH", default_value = "formula.json")]
    pub catalog: PathBuf,

    /// Comma-separated names of the changed formulae being tested
    #[arg(value_name = "TESTING_FORMULAE")]
    pub testing_formulae: String,

    /// Comma-separated names of formulae deleted by the change
    #[arg(value_name = "DELETED_FORMULAE")]
    pub deleted_formulae: Option<String>,
}

impl CliArgs {
    pub fn run(&self, config: &Config) -> Result<()> {
        let testing_names = split_names(&self.testing_formulae);
        let deleted_names = self
            .deleted_formulae
            .as_deref()
            .map(split_names)
            .unwrap_or_default();
        debug!(
            "Determining runners for {} changed and {} deleted formulae (dependents={})",
            testing_names.len(),
            deleted_names.len(),
            self.dependents
        );

        let formulary = Formulary::new(self.catalog.clone());
        let testing: Vec<FormulaCompat> = testing_names
            .iter()
            .map(|name| Ok(FormulaCompat::new(formulary.load_formula(name)?)))
            .collect::<Result<_>>()?;

        let query = BrewDependentQuery {
            brew_bin: config.brew_bin.clone(),
            eval_all: self.eval_all,
        };
        let catalog = MacOsCatalog::known()?;

        let engine = CoverageEngine::new(
            &testing,
            &deleted_names,
            self.dependents,
            &formulary,
            &query,
        );
        let runners = MatrixBuilder::new(engine, &catalog, config).build()?;

        output::print_summary(&runners);
        output::write_runners(&config.github_output, &runners)?;
        Ok(())
    }
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn splits_and_trims_names() {
        assert_eq!(split_names("a,b , c"), ["a", "b", "c"]);
        assert_eq!(split_names(""), Vec::<String>::new());
        assert_eq!(split_names("a,,b"), ["a", "b"]);
    }

    fn config(output: &Path, brew_bin: &Path) -> Config {
        Config {
            linux_runner: "linux-self-hosted-1".to_string(),
            linux_cleanup: false,
            github_run_id: "42".to_string(),
            github_run_attempt: "1".to_string(),
            github_output: output.to_path_buf(),
            brew_bin: brew_bin.to_path_buf(),
        }
    }

    fn args(testing: &str, dependents: bool, catalog: &Path) -> CliArgs {
        CliArgs {
            verbose: 0,
            dependents,
            eval_all: false,
            catalog: catalog.to_path_buf(),
            testing_formulae: testing.to_string(),
            deleted_formulae: None,
        }
    }

    fn catalog_file(json: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), json).unwrap();
        file
    }

    fn written_runner_names(output: &Path) -> Vec<String> {
        let contents = std::fs::read_to_string(output).unwrap();
        let line = contents
            .lines()
            .find(|l| l.starts_with("runners="))
            .unwrap()
            .to_string();
        let runners: serde_json::Value =
            serde_json::from_str(line.strip_prefix("runners=").unwrap()).unwrap();
        runners
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap().to_string())
            .collect()
    }

    fn supported_release_count() -> usize {
        MacOsCatalog::known()
            .unwrap()
            .releases()
            .iter()
            .filter(|r| !r.prerelease && !r.eol)
            .count()
    }

    #[test]
    fn direct_run_writes_the_full_matrix() {
        let catalog = catalog_file(r#"[{"name": "pkg-a"}]"#);
        let output = tempfile::NamedTempFile::new().unwrap();
        let config = config(output.path(), Path::new("/nonexistent/brew"));

        args("pkg-a", false, catalog.path()).run(&config).unwrap();

        // One Linux entry plus Intel and Apple Silicon per supported
        // release; nothing ran on the no-op runner.
        let names = written_runner_names(output.path());
        assert_eq!(names.len(), 1 + 2 * supported_release_count());
        assert_eq!(names[0], "Linux");
        assert!(names.iter().all(|n| n != "no-op"));
        let contents = std::fs::read_to_string(output.path()).unwrap();
        assert!(contents.contains("runners_present=true"));
    }

    #[test]
    fn empty_direct_run_writes_only_the_no_op_runner() {
        let catalog = catalog_file("[]");
        let output = tempfile::NamedTempFile::new().unwrap();
        let config = config(output.path(), Path::new("/nonexistent/brew"));

        args("", false, catalog.path()).run(&config).unwrap();

        assert_eq!(written_runner_names(output.path()), ["no-op"]);
    }

    #[test]
    fn unknown_formula_fails_before_any_output() {
        let catalog = catalog_file(r#"[{"name": "pkg-a"}]"#);
        let output = tempfile::NamedTempFile::new().unwrap();
        let config = config(output.path(), Path::new("/nonexistent/brew"));

        let err = args("pkg-b", false, catalog.path())
            .run(&config)
            .unwrap_err();
        assert!(matches!(err, rmx_common::RmxError::NotFound(_)));
        assert!(std::fs::read_to_string(output.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn dependents_run_queries_the_brew_executable() {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let brew = dir.path().join("fake-brew");
        let mut file = std::fs::File::create(&brew).unwrap();
        writeln!(file, "#!/bin/sh\nprintf 'dep-x\\n'").unwrap();
        drop(file);
        std::fs::set_permissions(&brew, std::fs::Permissions::from_mode(0o755)).unwrap();

        let catalog = catalog_file(r#"[{"name": "pkg-a"}, {"name": "dep-x"}]"#);
        let output = tempfile::NamedTempFile::new().unwrap();
        let config = config(output.path(), &brew);

        args("pkg-a", true, catalog.path()).run(&config).unwrap();

        // dep-x is untested and unrestricted, so every runner is required.
        let names = written_runner_names(output.path());
        assert_eq!(names.len(), 1 + 2 * supported_release_count());
        assert_eq!(names[0], "Linux");
    }
}
