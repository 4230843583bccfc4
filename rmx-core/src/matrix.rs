// rmx-core/src/matrix.rs
//! Walks the OS-version catalog and assembles the final runner list.
use rmx_common::config::Config;
use rmx_common::error::Result;
use rmx_common::model::version::MacOsVersion;
use rmx_common::model::{Arch, MacOsCatalog, Platform};
use serde::Serialize;
use tracing::debug;

use crate::coverage::{CoverageEngine, RunnerFilter};

const LINUX_CONTAINER_IMAGE: &str = "ghcr.io/homebrew/ubuntu22.04:master";
const LINUX_CONTAINER_OPTIONS: &str = "--user=linuxbrew -e GITHUB_ACTIONS_HOMEBREW_SELF_HOSTED";
const LINUX_WORKDIR: &str = "/github/home";
const LINUX_TIMEOUT_MINUTES: u32 = 4320;
const NO_OP_RUNNER: &str = "ubuntu-latest";

// Apple Silicon fleet bands. Hardware at or above the ephemeral floor is
// always disposable; the band between the shared and ephemeral floors uses
// shared bare metal for dependents runs; the band down to the persistent
// floor is long-lived hardware that must be cleaned after use. Nothing
// older remains in the fleet.
const ARM64_EPHEMERAL_FLOOR: &str = "14";
const ARM64_SHARED_HARDWARE_FLOOR: &str = "13";
const ARM64_PERSISTENT_FLOOR: &str = "12";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSpec {
    pub image: String,
    pub options: String,
}

/// One entry of the emitted runner matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunnerSpec {
    pub name: String,
    pub runner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    pub cleanup: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_op: bool,
}

impl RunnerSpec {
    fn linux(config: &Config) -> Self {
        Self {
            name: "Linux".to_string(),
            runner: config.linux_runner.clone(),
            container: Some(ContainerSpec {
                image: LINUX_CONTAINER_IMAGE.to_string(),
                options: LINUX_CONTAINER_OPTIONS.to_string(),
            }),
            workdir: Some(LINUX_WORKDIR.to_string()),
            timeout: Some(LINUX_TIMEOUT_MINUTES),
            cleanup: config.linux_cleanup,
            no_op: false,
        }
    }

    fn macos_intel(version: &MacOsVersion, ephemeral_suffix: &str) -> Self {
        Self {
            name: format!("macOS {version}-x86_64"),
            runner: format!("{version}{ephemeral_suffix}"),
            container: None,
            workdir: None,
            timeout: None,
            cleanup: false,
            no_op: false,
        }
    }

    fn macos_arm64(version: &MacOsVersion, runner: String, cleanup: bool) -> Self {
        Self {
            name: format!("macOS {version}-arm64"),
            runner,
            container: None,
            workdir: None,
            timeout: None,
            cleanup,
            no_op: false,
        }
    }

    fn no_op() -> Self {
        Self {
            name: "no-op".to_string(),
            runner: NO_OP_RUNNER.to_string(),
            container: None,
            workdir: None,
            timeout: None,
            cleanup: false,
            no_op: true,
        }
    }
}

pub struct MatrixBuilder<'a> {
    engine: CoverageEngine<'a>,
    catalog: &'a MacOsCatalog,
    config: &'a Config,
}

impl<'a> MatrixBuilder<'a> {
    pub fn new(engine: CoverageEngine<'a>, catalog: &'a MacOsCatalog, config: &'a Config) -> Self {
        Self {
            engine,
            catalog,
            config,
        }
    }

    /// Produces the ordered runner list: Linux first, then one pass over
    /// the macOS catalog newest-first, Intel before Apple Silicon within a
    /// release.
    pub fn build(&self) -> Result<Vec<RunnerSpec>> {
        let mut runners = Vec::new();

        let linux_candidate = RunnerFilter {
            reject_platform: Some(Platform::MacOs),
            // The Linux fleet ships only x86_64.
            reject_arch: Some(Arch::Arm64),
            macos_version: None,
        };
        if self.engine.add_runner(&linux_candidate, false)? {
            debug!("Adding Linux runner '{}'.", self.config.linux_runner);
            runners.push(RunnerSpec::linux(self.config));
        }

        self.build_macos(&mut runners)?;

        // A direct run with nothing to do still reports to the required CI
        // status check.
        if !self.engine.dependents_mode() && runners.is_empty() {
            debug!("No runners required; emitting the no-op runner.");
            runners.push(RunnerSpec::no_op());
        }

        Ok(runners)
    }

    // macOS coverage is decided with the simulation flag set so dependent
    // queries reflect macOS build conditionals.
    fn build_macos(&self, runners: &mut Vec<RunnerSpec>) -> Result<()> {
        let macos_candidate = RunnerFilter {
            reject_platform: Some(Platform::Linux),
            reject_arch: None,
            macos_version: None,
        };
        if !self.engine.add_runner(&macos_candidate, true)? {
            debug!("No formula needs macOS coverage.");
            return Ok(());
        }

        let needs_intel = self.engine.add_runner(
            &RunnerFilter {
                reject_platform: Some(Platform::Linux),
                reject_arch: Some(Arch::Arm64),
                macos_version: None,
            },
            true,
        )?;
        let needs_arm64 = self.engine.add_runner(
            &RunnerFilter {
                reject_platform: Some(Platform::Linux),
                reject_arch: Some(Arch::X86_64),
                macos_version: None,
            },
            true,
        )?;

        let ephemeral_floor = MacOsVersion::parse(ARM64_EPHEMERAL_FLOOR)?;
        let shared_hardware_floor = MacOsVersion::parse(ARM64_SHARED_HARDWARE_FLOOR)?;
        let persistent_floor = MacOsVersion::parse(ARM64_PERSISTENT_FLOOR)?;
        let ephemeral_suffix = self.config.ephemeral_suffix();

        for release in self.catalog.releases() {
            if release.prerelease || release.eol {
                continue;
            }
            let version = &release.version;

            let version_candidate = RunnerFilter {
                reject_platform: Some(Platform::Linux),
                reject_arch: None,
                macos_version: Some(version.clone()),
            };
            if !self.engine.add_runner(&version_candidate, true)? {
                debug!("No formula needs macOS {} ({}).", version, release.codename);
                continue;
            }

            if needs_intel {
                runners.push(RunnerSpec::macos_intel(version, &ephemeral_suffix));
            }

            if needs_arm64 {
                let ephemeral = *version >= ephemeral_floor
                    || (*version >= shared_hardware_floor && !self.engine.dependents_mode());
                if ephemeral {
                    runners.push(RunnerSpec::macos_arm64(
                        version,
                        format!("{version}-arm64{ephemeral_suffix}"),
                        false,
                    ));
                } else if *version >= persistent_floor {
                    runners.push(RunnerSpec::macos_arm64(
                        version,
                        format!("{version}-arm64"),
                        true,
                    ));
                }
            }
        }

        Ok(())
    }
}
