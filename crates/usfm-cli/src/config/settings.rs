//! Configuration settings

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File names searched in the working directory when no config is given
pub const CONFIG_CANDIDATES: [&str; 2] = ["usfm-strip.toml", ".usfm-strip.toml"];

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Which files are picked up from input directories
    pub input: InputSettings,
    /// Where stripped files are written
    pub output: OutputSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }
}

/// Input file selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Extension of the files converted when a directory is given
    pub extension: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            extension: "usfm".to_string(),
        }
    }
}

/// Output layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory receiving the stripped files
    pub directory: PathBuf,
    /// Appended to each file stem (`GEN.usfm` -> `GEN<suffix>.usfm`)
    pub suffix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("unaligned"),
            suffix: String::new(),
        }
    }
}

impl OutputSettings {
    /// Destination of a source file, given its path relative to its input root
    pub fn destination(&self, relative: &Path) -> PathBuf {
        let path = self.directory.join(relative);
        if self.suffix.is_empty() {
            return path;
        }

        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{stem}{}.{}", self.suffix, ext.to_string_lossy()),
            None => format!("{stem}{}", self.suffix),
        };
        path.with_file_name(name)
    }
}
