//! Command implementations.

pub mod plan;
pub mod verify;

use snipvault_model::Snippet;
use snipvault_remote::RemoteRecord;
use std::path::Path;

/// Loads a local snapshot: a JSON array of snippets.
pub fn load_local(path: &Path) -> Result<Vec<Snippet>, Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Loads a remote snapshot: a JSON array of records.
pub fn load_remote(path: &Path) -> Result<Vec<RemoteRecord>, Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}
