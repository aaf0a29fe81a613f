//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Xcode project settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    /// Target to edit; the first target of the project when unset
    #[serde(default)]
    pub target: Option<String>,
}

/// Dependency manifest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Path to the `config.properties` file listing dependencies
    #[serde(default = "default_manifest_path")]
    pub path: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: default_manifest_path(),
        }
    }
}

fn default_manifest_path() -> String {
    "ios/config/config.properties".to_string()
}

/// Artifact cleanup settings used by `reset`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Derived data directory holding the `SourcePackages` cache
    #[serde(default = "default_derived_data")]
    pub derived_data: String,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            derived_data: default_derived_data(),
        }
    }
}

fn default_derived_data() -> String {
    "ios/build/DerivedData".to_string()
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
