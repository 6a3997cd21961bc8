//! JSON output

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Write `data` to `path` as 2-space indented JSON, replacing any existing file
pub fn save_json<T: Serialize + ?Sized, P: AsRef<Path>>(data: &T, path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
