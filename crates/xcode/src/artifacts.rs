//! Swift package artifacts left behind by dependency resolution

use std::fs;
use std::path::{Path, PathBuf};
use xcspm_core::error::{Error, Result, ResultExt};

/// Resolved-package state of a project
#[derive(Debug, Clone)]
pub struct SpmArtifacts {
    /// `Package.resolved` inside the project's shared workspace data
    pub package_resolved: PathBuf,
    /// Checked-out package sources under the derived data directory
    pub source_packages: PathBuf,
}

impl SpmArtifacts {
    /// Locate the artifacts of the `.xcodeproj` bundle at `project`
    pub fn locate(project: &Path, derived_data: &Path) -> Self {
        Self {
            package_resolved: project
                .join("project.xcworkspace")
                .join("xcshareddata")
                .join("swiftpm")
                .join("Package.resolved"),
            source_packages: derived_data.join("SourcePackages"),
        }
    }

    /// Delete whichever artifacts exist and return the removed paths
    pub fn clean(&self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();

        if self.package_resolved.is_file() {
            fs::remove_file(&self.package_resolved)
                .map_err(Error::from)
                .context(format!("While removing {}", self.package_resolved.display()))?;
            removed.push(self.package_resolved.clone());
        }

        if self.source_packages.is_dir() {
            fs::remove_dir_all(&self.source_packages)
                .map_err(Error::from)
                .context(format!("While removing {}", self.source_packages.display()))?;
            removed.push(self.source_packages.clone());
        }

        for path in &removed {
            tracing::debug!(path = %path.display(), "Removed SPM artifact");
        }
        Ok(removed)
    }
}
