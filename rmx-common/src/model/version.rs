// rmx-common/src/model/version.rs
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, RmxError};

/// A macOS release version, ordered by release chronology.
///
/// Backed by `semver::Version` so that `10.15 < 11 < 12` holds numerically;
/// the original string is preserved for display because runner labels use
/// the short form ("14", "10.15").
#[derive(Debug, Clone)]
pub struct MacOsVersion {
    repr: String,
    version: semver::Version,
}

impl MacOsVersion {
    pub fn parse(s: &str) -> Result<Self> {
        // Versions arrive as "14", "10.15" or occasionally "13.2.1"; pad to
        // the three components semver requires.
        let cleaned = s.trim();
        let parts: Vec<&str> = cleaned.split('.').collect();
        let padded = match parts.len() {
            1 => format!("{}.0.0", parts[0]),
            2 => format!("{}.{}.0", parts[0], parts[1]),
            _ => cleaned.to_string(),
        };
        let version = semver::Version::parse(&padded).map_err(|e| {
            RmxError::VersionError(format!(
                "Failed to parse macOS version '{s}' (tried '{padded}'): {e}"
            ))
        })?;
        Ok(Self {
            repr: cleaned.to_string(),
            version,
        })
    }
}

impl FromStr for MacOsVersion {
    type Err = RmxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MacOsVersion::parse(s)
    }
}

impl fmt::Display for MacOsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr)
    }
}

// Equality and ordering go through the parsed version only; "14" and
// "14.0" are the same release.
impl PartialEq for MacOsVersion {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for MacOsVersion {}

impl PartialOrd for MacOsVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MacOsVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

impl Hash for MacOsVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.version.hash(state);
    }
}

impl Serialize for MacOsVersion {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.repr)
    }
}

impl<'de> Deserialize<'de> for MacOsVersion {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MacOsVersion::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Ordering operator attached to a versioned macOS requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    GreaterEqual,
    LessEqual,
    Equal,
    Greater,
    Less,
}

impl Comparator {
    pub fn matches(&self, candidate: &MacOsVersion, required: &MacOsVersion) -> bool {
        match self {
            Self::GreaterEqual => candidate >= required,
            Self::LessEqual => candidate <= required,
            Self::Equal => candidate == required,
            Self::Greater => candidate > required,
            Self::Less => candidate < required,
        }
    }
}

impl FromStr for Comparator {
    type Err = RmxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            ">=" => Ok(Self::GreaterEqual),
            "<=" => Ok(Self::LessEqual),
            "==" | "=" => Ok(Self::Equal),
            ">" => Ok(Self::Greater),
            "<" => Ok(Self::Less),
            _ => Err(RmxError::VersionError(format!(
                "Unknown version comparator '{s}'"
            ))),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Self::GreaterEqual => ">=",
            Self::LessEqual => "<=",
            Self::Equal => "==",
            Self::Greater => ">",
            Self::Less => "<",
        };
        write!(f, "{op}")
    }
}

/// One known macOS release in the catalog.
#[derive(Debug, Clone)]
pub struct MacOsRelease {
    pub codename: String,
    pub version: MacOsVersion,
    pub prerelease: bool,
    pub eol: bool,
}

/// Ordered enumeration (newest first) of the macOS releases the CI fleet
/// knows about, with per-release pre-release and end-of-life flags.
#[derive(Debug, Clone)]
pub struct MacOsCatalog {
    releases: Vec<MacOsRelease>,
}

// Newest first, matching the order runners are emitted in.
const MACOS_RELEASES: &[(&str, &str)] = &[
    ("tahoe", "26"),
    ("sequoia", "15"),
    ("sonoma", "14"),
    ("ventura", "13"),
    ("monterey", "12"),
    ("big_sur", "11"),
    ("catalina", "10.15"),
];

// Releases at or above the newer cutoff are pre-release; releases below
// the older cutoff no longer receive security updates.
const NEWEST_UNSUPPORTED: &str = "26";
const OLDEST_SUPPORTED: &str = "14";

impl MacOsCatalog {
    /// The built-in release catalog.
    pub fn known() -> Result<Self> {
        let newest_unsupported = MacOsVersion::parse(NEWEST_UNSUPPORTED)?;
        let oldest_supported = MacOsVersion::parse(OLDEST_SUPPORTED)?;

        let releases = MACOS_RELEASES
            .iter()
            .map(|(codename, raw)| {
                let version = MacOsVersion::parse(raw)?;
                let prerelease = version >= newest_unsupported;
                let eol = version < oldest_supported;
                Ok(MacOsRelease {
                    codename: (*codename).to_string(),
                    version,
                    prerelease,
                    eol,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { releases })
    }

    pub fn new(releases: Vec<MacOsRelease>) -> Self {
        Self { releases }
    }

    pub fn releases(&self) -> &[MacOsRelease] {
        &self.releases
    }
}
