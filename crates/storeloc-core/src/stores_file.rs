use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::store::StoreRecord;
use crate::ConfigError;

#[derive(Debug, Deserialize)]
pub struct StoresFile {
    pub stores: Vec<StoreRecord>,
}

/// Load and validate a YAML file of store records.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_stores_file(path: &Path) -> Result<StoresFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StoresFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_stores_file(&content)
}

/// Parse and validate store records from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text does not parse or fails validation.
pub fn parse_stores_file(content: &str) -> Result<StoresFile, ConfigError> {
    let stores_file: StoresFile =
        serde_yaml::from_str(content).map_err(ConfigError::StoresFileParse)?;
    validate_stores(&stores_file)?;
    Ok(stores_file)
}

fn validate_stores(stores_file: &StoresFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for store in &stores_file.stores {
        if store.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store name must be non-empty".to_string(),
            ));
        }

        let id = store.id();
        if id.is_empty() {
            return Err(ConfigError::Validation(format!(
                "store '{}' needs a uid or store_code",
                store.name
            )));
        }

        if !seen_ids.insert(id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store id: '{id}' (from store '{}')",
                store.name
            )));
        }
    }

    Ok(())
}
