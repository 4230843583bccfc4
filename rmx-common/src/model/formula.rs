// rmx-common/src/model/formula.rs
// A formula as the runner-matrix decision sees it: a name plus the declared
// platform/arch/OS-version restrictions. Everything else in the catalog
// entry is irrelevant here and ignored during deserialization.
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::dependency::Requirement;
use crate::model::platform::Arch;
use crate::model::version::{Comparator, MacOsVersion};

#[derive(Debug, Clone)]
pub struct Formula {
    pub name: String,
    pub desc: Option<String>,
    pub requirements: Vec<Requirement>,
}

impl Formula {
    pub fn new(name: impl Into<String>, requirements: Vec<Requirement>) -> Self {
        Self {
            name: name.into(),
            desc: None,
            requirements,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawFormula {
            name: String,
            #[serde(default)]
            desc: Option<String>,
            #[serde(default)]
            requirements: Vec<Value>,
        }

        let raw = RawFormula::deserialize(deserializer)?;
        let requirements = raw.requirements.iter().map(parse_requirement).collect();

        Ok(Formula {
            name: raw.name,
            desc: raw.desc,
            requirements,
        })
    }
}

/// Permissive requirement parsing: an unrecognized or malformed entry must
/// not block testing, so it degrades to `Requirement::Other` instead of
/// failing the whole catalog.
fn parse_requirement(value: &Value) -> Requirement {
    let Some(map) = value.as_object() else {
        return Requirement::Other(value.to_string());
    };

    let kind = map.get("name").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "macos" => {
            let comparator = map
                .get("comparator")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<Comparator>().ok())
                .unwrap_or(Comparator::GreaterEqual);
            match map
                .get("version")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
            {
                None => Requirement::MacOs {
                    version: None,
                    comparator,
                },
                Some(raw) => match MacOsVersion::parse(raw) {
                    Ok(version) => Requirement::MacOs {
                        version: Some(version),
                        comparator,
                    },
                    // An unparseable version must not restrict anything.
                    Err(_) => Requirement::Other(value.to_string()),
                },
            }
        }
        "linux" => Requirement::Linux,
        "arch" => {
            let arch = map
                .get("arch")
                .or_else(|| map.get("version"))
                .and_then(Value::as_str)
                .and_then(Arch::parse);
            match arch {
                Some(arch) => Requirement::Arch(arch),
                None => Requirement::Other(value.to_string()),
            }
        }
        _ => Requirement::Other(value.to_string()),
    }
}
