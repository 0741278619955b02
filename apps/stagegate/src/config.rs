//! # Registry Configuration
//!
//! Loads the stage catalog once at startup. A TOML registry file, named by
//! `--registry` or `STAGEGATE_REGISTRY`, replaces the built-in tracks.

use stagegate_core::{RegistryConfig, StageCatalog, StageGateError};
use std::path::Path;

/// Maximum registry file size (1 MiB).
const MAX_REGISTRY_FILE_SIZE: u64 = 1024 * 1024;

/// Parse a registry from TOML text.
pub fn parse_catalog(text: &str) -> Result<StageCatalog, StageGateError> {
    let config: RegistryConfig = toml::from_str(text)
        .map_err(|e| StageGateError::InvalidRegistry(format!("Invalid registry file: {}", e)))?;
    StageCatalog::from_config(config)
}

/// Load the catalog from `path`, or the built-in catalog when there is none.
pub fn load_catalog(path: Option<&Path>) -> Result<StageCatalog, StageGateError> {
    let Some(path) = path else {
        tracing::debug!("Using built-in stage registry");
        return Ok(StageCatalog::builtin());
    };

    let metadata = std::fs::metadata(path).map_err(|e| {
        StageGateError::IoError(format!("Cannot read registry '{}': {}", path.display(), e))
    })?;
    if metadata.len() > MAX_REGISTRY_FILE_SIZE {
        return Err(StageGateError::InvalidRegistry(format!(
            "Registry file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_REGISTRY_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(path).map_err(|e| {
        StageGateError::IoError(format!("Cannot read registry '{}': {}", path.display(), e))
    })?;
    let catalog = parse_catalog(&text)?;
    tracing::info!(path = %path.display(), "Loaded stage registry");
    Ok(catalog)
}

// =============================================================================
// TESTS
// =============================================================================
