//! Hand-off file between the ingest and merge stages.

use std::fs;
use std::path::Path;
use surprise_core::{Result, ReturnTable, SurpriseError};

/// Writes the return tables as JSON, creating parent directories.
///
/// # Errors
///
/// Returns an I/O or JSON error.
pub fn save_tables(path: impl AsRef<Path>, tables: &[ReturnTable]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(tables)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads the return tables written by [`save_tables`].
///
/// # Errors
///
/// Returns [`SurpriseError::FileNotFound`] when the ingest stage has not run.
pub fn load_tables(path: impl AsRef<Path>) -> Result<Vec<ReturnTable>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SurpriseError::FileNotFound(path.to_path_buf()));
    }
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
