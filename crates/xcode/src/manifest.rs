//! Dependency manifest in `config.properties`
//!
//! Each dependency is one line:
//!
//! ```text
//! dependency.<ProductName>=<URL>|<minimumVersion>
//! ```
//!
//! Other lines are ignored, and malformed dependency lines are skipped.

use crate::spm::Dependency;
use std::fs;
use std::path::Path;
use xcspm_core::error::{Error, Result, ResultExt};

const PREFIX: &str = "dependency.";

/// Read the dependencies declared in a manifest file
///
/// A missing file declares no dependencies.
pub fn read_manifest(path: &Path) -> Result<Vec<Dependency>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No manifest file");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("While reading manifest {}", path.display()))?;
    Ok(parse_manifest(&content))
}

/// Parse manifest text, keeping declaration order
pub fn parse_manifest(content: &str) -> Vec<Dependency> {
    content
        .lines()
        .filter_map(|raw| {
            let line = raw.trim();
            if !line.starts_with(PREFIX) {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            let product_name = key.trim().strip_prefix(PREFIX)?.trim();
            let (url, version) = value.trim().split_once('|')?;

            match Dependency::new(url, version, product_name) {
                Ok(dependency) => Some(dependency),
                Err(_) => {
                    tracing::debug!(line, "Skipping incomplete dependency line");
                    None
                }
            }
        })
        .collect()
}
