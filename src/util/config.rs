//! Configuration file support.
//!
//! slipway reads an optional `slipway.toml` from the project directory.
//! Everything in it has a CLI flag equivalent; flags take precedence.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// slipway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path settings
    pub paths: PathsConfig,

    /// Platform search-path overrides
    pub platform: PlatformOverrides,
}

/// Paths used by the lifecycle entry points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Shared install prefix for all native dependencies
    pub prefix: Option<PathBuf>,

    /// Extension source unit to compile
    pub source: Option<PathBuf>,

    /// Output directory for the compiled extension and bundled runtime
    pub out_dir: Option<PathBuf>,
}

/// Extra search paths merged into the platform profile.
///
/// These mirror the `CPATH` / `LD_LIBRARY_PATH` environment variables and
/// use the same colon-separated format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformOverrides {
    /// Colon-separated extra include roots
    pub include_path: Option<String>,

    /// Colon-separated extra library roots
    pub library_path: Option<String>,

    /// C++ compiler override (otherwise CXX, then PATH discovery)
    pub cxx: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration, falling back to defaults if the file doesn't exist.
    ///
    /// A file that exists but fails to parse is an error; silently ignoring
    /// a typo'd config would mask misconfigured builds.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Default config path for a project directory.
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join("slipway.toml")
}
