//! JSON persistence of CTI models and clockers (`cti.json`, `clocker.json`).

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Write `value` as pretty-printed JSON, replacing any existing file.
pub fn output_to_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// Load a value written by [`output_to_json`]. Models are validated while
/// they are read, so an invalid file fails here rather than mid-clocking.
pub fn from_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
