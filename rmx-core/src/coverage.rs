// rmx-core/src/coverage.rs
//! Decides whether a candidate runner configuration needs to run at all,
//! either for the changed formulae directly or for their dependents.
use std::collections::HashSet;

use rmx_common::error::Result;
use rmx_common::formulary::Formulary;
use rmx_common::model::version::MacOsVersion;
use rmx_common::model::{Arch, Platform};
use tracing::debug;

use crate::compat::FormulaCompat;
use crate::dependents::DependentQuery;

/// One candidate runner configuration, expressed as what it cannot serve:
/// formulae pinned to the rejected platform or architecture, and formulae
/// incompatible with the selected macOS release.
#[derive(Debug, Clone, Default)]
pub struct RunnerFilter {
    pub reject_platform: Option<Platform>,
    pub reject_arch: Option<Arch>,
    pub macos_version: Option<MacOsVersion>,
}

impl RunnerFilter {
    fn excludes(&self, view: &FormulaCompat) -> bool {
        let platform_excluded = match self.reject_platform {
            Some(Platform::MacOs) => view.macos_only(),
            Some(Platform::Linux) => view.linux_only(),
            None => false,
        };
        if platform_excluded {
            return true;
        }
        match self.reject_arch {
            Some(Arch::Arm64) => view.arm64_only(),
            Some(Arch::X86_64) => view.x86_64_only(),
            None => false,
        }
    }

    /// Whether this runner can test the given formula.
    pub fn admits(&self, view: &FormulaCompat) -> bool {
        if self.excludes(view) {
            return false;
        }
        self.macos_version
            .as_ref()
            .map_or(true, |v| view.compatible_with(v))
    }
}

pub struct CoverageEngine<'a> {
    testing: &'a [FormulaCompat],
    testing_names: HashSet<&'a str>,
    deleted: &'a [String],
    dependents_mode: bool,
    formulary: &'a Formulary,
    query: &'a dyn DependentQuery,
}

impl<'a> CoverageEngine<'a> {
    pub fn new(
        testing: &'a [FormulaCompat],
        deleted: &'a [String],
        dependents_mode: bool,
        formulary: &'a Formulary,
        query: &'a dyn DependentQuery,
    ) -> Self {
        let testing_names = testing.iter().map(FormulaCompat::name).collect();
        Self {
            testing,
            testing_names,
            deleted,
            dependents_mode,
            formulary,
            query,
        }
    }

    pub fn dependents_mode(&self) -> bool {
        self.dependents_mode
    }

    /// Whether the candidate runner described by `filter` must execute.
    /// In dependents mode the question is asked of the untested dependents;
    /// otherwise of the changed formulae themselves.
    pub fn add_runner(&self, filter: &RunnerFilter, simulate_macos_on_linux: bool) -> Result<bool> {
        if self.dependents_mode {
            self.dependents_need_runner(filter, simulate_macos_on_linux)
        } else {
            Ok(self.needs_runner(filter))
        }
    }

    fn needs_runner(&self, filter: &RunnerFilter) -> bool {
        // A deleted formula always forces a runner: its removal still has
        // to be validated somewhere.
        if !self.deleted.is_empty() {
            return true;
        }
        self.testing.iter().any(|view| filter.admits(view))
    }

    fn dependents_need_runner(
        &self,
        filter: &RunnerFilter,
        simulate_macos_on_linux: bool,
    ) -> Result<bool> {
        for view in self.testing {
            // A formula this runner would never test directly cannot demand
            // dependent coverage on it either.
            if !filter.admits(view) {
                continue;
            }

            let dependents = view.dependents(self.formulary, self.query, simulate_macos_on_linux)?;
            let untested = dependents.iter().any(|dependent| {
                filter.admits(dependent) && !self.testing_names.contains(dependent.name())
            });
            if untested {
                debug!(
                    "Formula '{}' has untested dependents for this runner.",
                    view.name()
                );
                return Ok(true);
            }
        }
        Ok(false)
    }
}
