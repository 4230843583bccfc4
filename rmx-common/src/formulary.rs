use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::error::{Result, RmxError};
use super::model::formula::Formula;

/// The formula data source: a JSON catalog on disk, parsed once and then
/// served out of an in-memory cache keyed by formula name.
pub struct Formulary {
    catalog_path: PathBuf,
    parsed_cache: Mutex<HashMap<String, Arc<Formula>>>,
}

impl Formulary {
    pub fn new(catalog_path: PathBuf) -> Self {
        Self {
            catalog_path,
            parsed_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a formulary whose cache is already populated. No catalog file
    /// is read; lookups outside `formulae` fail with `NotFound`.
    pub fn preloaded(formulae: Vec<Formula>) -> Self {
        let cache = formulae
            .into_iter()
            .map(|f| (f.name.clone(), Arc::new(f)))
            .collect();
        Self {
            catalog_path: PathBuf::new(),
            parsed_cache: Mutex::new(cache),
        }
    }

    pub fn load_formula(&self, name: &str) -> Result<Arc<Formula>> {
        let mut parsed_cache_guard = self.parsed_cache.lock().unwrap();
        if let Some(formula_arc) = parsed_cache_guard.get(name) {
            debug!("Loaded formula '{}' from parsed cache.", name);
            return Ok(Arc::clone(formula_arc));
        }
        if !parsed_cache_guard.is_empty() {
            // The catalog was already parsed; the name simply is not in it.
            return Err(RmxError::NotFound(format!(
                "Formula '{name}' not found in catalog."
            )));
        }
        drop(parsed_cache_guard);

        let raw_data = fs::read_to_string(&self.catalog_path).map_err(|e| {
            RmxError::Catalog(format!(
                "Failed to read formula catalog {}: {e}",
                self.catalog_path.display()
            ))
        })?;
        let all_formulae: Vec<Formula> = serde_json::from_str(&raw_data)
            .map_err(|e| RmxError::Catalog(format!("Failed to parse formula catalog: {e}")))?;
        debug!("Parsed {} formulae.", all_formulae.len());

        let mut found_formula: Option<Arc<Formula>> = None;
        parsed_cache_guard = self.parsed_cache.lock().unwrap();
        for formula in all_formulae {
            let formula_name = formula.name.clone();
            let formula_arc = Arc::new(formula);

            if formula_name == name {
                found_formula = Some(Arc::clone(&formula_arc));
            }

            parsed_cache_guard
                .entry(formula_name)
                .or_insert(formula_arc);
        }

        match found_formula {
            Some(f) => {
                debug!("Successfully loaded formula '{}'", f.name);
                Ok(f)
            }
            None => {
                debug!("Formula '{}' not found within the catalog data.", name);
                Err(RmxError::NotFound(format!(
                    "Formula '{name}' not found in catalog."
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CATALOG: &str = r#"[
        {"name": "pkg-a"},
        {"name": "pkg-b", "requirements": [{"name": "linux"}]}
    ]"#;

    fn catalog_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_formula_by_name() {
        let file = catalog_file();
        let formulary = Formulary::new(file.path().to_path_buf());
        let f = formulary.load_formula("pkg-b").unwrap();
        assert_eq!(f.name(), "pkg-b");
        assert_eq!(f.requirements().len(), 1);
    }

    #[test]
    fn unknown_name_is_not_found() {
        let file = catalog_file();
        let formulary = Formulary::new(file.path().to_path_buf());
        let err = formulary.load_formula("missing").unwrap_err();
        assert!(matches!(err, RmxError::NotFound(_)));
    }

    #[test]
    fn catalog_is_read_once() {
        let file = catalog_file();
        let path = file.path().to_path_buf();
        let formulary = Formulary::new(path);
        formulary.load_formula("pkg-a").unwrap();

        // Deleting the catalog after the first load proves later lookups
        // are served from the parsed cache.
        drop(file);
        let f = formulary.load_formula("pkg-b").unwrap();
        assert_eq!(f.name(), "pkg-b");
        assert!(matches!(
            formulary.load_formula("missing").unwrap_err(),
            RmxError::NotFound(_)
        ));
    }

    #[test]
    fn missing_catalog_file_is_a_catalog_error() {
        let formulary = Formulary::new(PathBuf::from("/nonexistent/formula.json"));
        assert!(matches!(
            formulary.load_formula("pkg-a").unwrap_err(),
            RmxError::Catalog(_)
        ));
    }

    #[test]
    fn preloaded_serves_without_a_catalog_file() {
        let formulary = Formulary::preloaded(vec![Formula::new("pkg-a", Vec::new())]);
        assert_eq!(formulary.load_formula("pkg-a").unwrap().name(), "pkg-a");
        assert!(matches!(
            formulary.load_formula("pkg-b").unwrap_err(),
            RmxError::NotFound(_)
        ));
    }
}
