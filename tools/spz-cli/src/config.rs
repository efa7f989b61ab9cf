//! Tool configuration (spz.toml)
//!
//! ```toml
//! [decode]
//! coordinate_system = "RDF"
//! magic_scan_window = 8192
//!
//! [encode]
//! version = 3
//! fractional_bits = 12
//! sh1_bits = 5
//! sh_rest_bits = 4
//! ```
//!
//! Every table and key is optional; command-line flags override file values.
//! `convert` keeps the source SH degree unless `--sh-degree` or an explicit
//! `[encode] sh_degree` key asks for another one.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spz_format::{DecodeOptions, EncodeOptions};

/// Looked up in the working directory when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "spz.toml";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpzConfig {
    /// Options for reading containers
    pub decode: DecodeOptions,
    /// Options for writing containers
    pub encode: EncodeOptions,
    /// `[encode] sh_degree` when the file sets it
    #[serde(skip)]
    pub explicit_sh_degree: Option<u8>,
}

impl SpzConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).context("Invalid spz config")?;
        config.encode.validate().context("Invalid [encode] table")?;

        let table: toml::Table = toml::from_str(content).context("Invalid spz config")?;
        let has_sh_degree = table
            .get("encode")
            .and_then(|encode| encode.get("sh_degree"))
            .is_some();
        config.explicit_sh_degree = has_sh_degree.then_some(config.encode.sh_degree);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to load config {:?}", path))
    }

    /// Load `explicit`, else `spz.toml` in `dir` if present, else defaults
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            tracing::debug!("Using config {:?}", path);
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// SH degree for `convert`: the flag, else the file key, else `None` (keep source)
    pub fn convert_sh_degree(&self, flag: Option<u8>) -> Option<u8> {
        flag.or(self.explicit_sh_degree)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize spz config")
    }
}
