// rmx-core/src/compat.rs
//! Compatibility view over one formula: which platforms, architectures and
//! macOS releases it can be tested on, plus its (memoized) dependents.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rmx_common::dependency::Requirement;
use rmx_common::error::Result;
use rmx_common::formulary::Formulary;
use rmx_common::model::version::{Comparator, MacOsVersion};
use rmx_common::model::{Arch, Formula};
use tracing::debug;

use crate::dependents::DependentQuery;

pub struct FormulaCompat {
    formula: Arc<Formula>,
    // Dependent lookups differ between real-Linux and simulated-macOS
    // evaluation, so each flag value caches its own list.
    dependents_cache: Mutex<HashMap<bool, Arc<Vec<FormulaCompat>>>>,
}

impl FormulaCompat {
    pub fn new(formula: Arc<Formula>) -> Self {
        Self {
            formula,
            dependents_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        self.formula.name()
    }

    /// True iff a macOS platform requirement with no attached version
    /// exists. A versioned macOS requirement bounds releases instead of
    /// pinning the platform outright.
    pub fn macos_only(&self) -> bool {
        self.formula
            .requirements()
            .iter()
            .any(|r| matches!(r, Requirement::MacOs { version: None, .. }))
    }

    pub fn linux_only(&self) -> bool {
        self.formula
            .requirements()
            .iter()
            .any(|r| matches!(r, Requirement::Linux))
    }

    pub fn x86_64_only(&self) -> bool {
        self.formula
            .requirements()
            .iter()
            .any(|r| matches!(r, Requirement::Arch(Arch::X86_64)))
    }

    pub fn arm64_only(&self) -> bool {
        self.formula
            .requirements()
            .iter()
            .any(|r| matches!(r, Requirement::Arch(Arch::Arm64)))
    }

    /// The first macOS requirement that names a specific release, if any.
    pub fn versioned_macos_requirement(&self) -> Option<(&MacOsVersion, Comparator)> {
        self.formula.requirements().iter().find_map(|r| match r {
            Requirement::MacOs {
                version: Some(v),
                comparator,
            } => Some((v, *comparator)),
            _ => None,
        })
    }

    /// Whether the formula can be tested on the given macOS release. A
    /// formula without a versioned macOS requirement is compatible with
    /// every release.
    pub fn compatible_with(&self, version: &MacOsVersion) -> bool {
        match self.versioned_macos_requirement() {
            Some((required, comparator)) => comparator.matches(version, required),
            None => true,
        }
    }

    /// Compatibility views for every formula that transitively depends on
    /// this one (build-time and test-time edges included).
    ///
    /// The external query runs at most once per simulation-flag value; the
    /// cache lock is held across the query so that guarantee holds even if
    /// callers fan views out across threads.
    pub fn dependents(
        &self,
        formulary: &Formulary,
        query: &dyn DependentQuery,
        simulate_macos_on_linux: bool,
    ) -> Result<Arc<Vec<FormulaCompat>>> {
        let mut cache = self.dependents_cache.lock().unwrap();
        if let Some(cached) = cache.get(&simulate_macos_on_linux) {
            debug!(
                "Loaded dependents of '{}' (simulate={}) from cache.",
                self.name(),
                simulate_macos_on_linux
            );
            return Ok(Arc::clone(cached));
        }

        let names = query.dependents_of(self.name(), simulate_macos_on_linux)?;
        debug!(
            "Dependent query for '{}' (simulate={}) returned {} formulae.",
            self.name(),
            simulate_macos_on_linux,
            names.len()
        );
        let views = names
            .iter()
            .map(|name| Ok(FormulaCompat::new(formulary.load_formula(name)?)))
            .collect::<Result<Vec<_>>>()?;

        let views = Arc::new(views);
        cache.insert(simulate_macos_on_linux, Arc::clone(&views));
        Ok(views)
    }
}
