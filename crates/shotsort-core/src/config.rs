//! Organizer configuration.
//!
//! Everything has a compiled-in default, so no file is required. An
//! optional TOML file may override the watched root and the counter file
//! name:
//!
//! ```toml
//! root = "/home/me/Pictures/Screenshots"
//! counter_file = "screenshot_counter.json"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ShotsortError};
use crate::naming;

/// Default counter file name, stored inside the watched root.
pub const DEFAULT_COUNTER_FILE: &str = "screenshot_counter.json";

/// Resolved configuration for one watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory watched for loose screenshots; month folders live below it.
    pub root: PathBuf,
    /// Counter file name, relative to `root`.
    pub counter_file: String,
    /// Screenshot extension, without the dot.
    pub extension: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    root: Option<PathBuf>,
    counter_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_root(default_root())
    }
}

impl Config {
    /// Default settings for the given root.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counter_file: DEFAULT_COUNTER_FILE.to_string(),
            extension: naming::EXTENSION.to_string(),
        }
    }

    /// Load settings from a TOML file, filling gaps with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ShotsortError::Io`] if the file cannot be read.
    /// Returns [`ShotsortError::Config`] if it is not valid TOML, has
    /// unknown keys, or names a counter file outside the root.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&raw)
            .map_err(|e| ShotsortError::Config(format!("{}: {e}", path.display())))?;

        let mut config = Self::default();
        if let Some(root) = file.root {
            config.root = root;
        }
        if let Some(counter_file) = file.counter_file {
            config.counter_file = counter_file;
        }
        config.validate()?;
        Ok(config)
    }

    /// Path of the counter file.
    #[must_use]
    pub fn counter_path(&self) -> PathBuf {
        self.root.join(&self.counter_file)
    }

    fn validate(&self) -> Result<()> {
        let name = Path::new(&self.counter_file);
        if name.components().count() != 1 || name.file_name().is_none() {
            return Err(ShotsortError::Config(format!(
                "counter_file must be a bare file name, got '{}'",
                self.counter_file
            )));
        }
        Ok(())
    }
}

/// `<Pictures>/Screenshots`, or `./Screenshots` when the platform has no
/// pictures directory.
#[must_use]
pub fn default_root() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Screenshots")
}
