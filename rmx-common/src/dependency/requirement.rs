// rmx-common/src/dependency/requirement.rs
use std::fmt;

use crate::model::platform::Arch;
use crate::model::version::{Comparator, MacOsVersion};

/// A declared restriction on where a formula can build and run.
///
/// Requirement data is external and occasionally malformed; anything this
/// module does not recognize lands in `Other` and restricts nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// macOS-only. With a version attached the formula additionally bounds
    /// which releases it supports; without one it is a pure platform pin.
    MacOs {
        version: Option<MacOsVersion>,
        comparator: Comparator,
    },
    /// Linux-only.
    Linux,
    /// Restricted to exactly one CPU architecture.
    Arch(Arch),
    Other(String),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacOs {
                version: Some(v),
                comparator,
            } => write!(f, "macOS {comparator} {v}"),
            Self::MacOs { version: None, .. } => write!(f, "macOS"),
            Self::Linux => write!(f, "Linux"),
            Self::Arch(arch) => write!(f, "arch: {arch}"),
            Self::Other(s) => write!(f, "Requirement: {s}"),
        }
    }
}
