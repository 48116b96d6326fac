//! Settings loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, Environment, File, FileFormat};
use std::path::Path;

use super::{global_settings_path, RunSettings};

/// Prefix for environment variable overrides, e.g. `RANKQUEST_CHUNK_SIZE=25`
const ENV_PREFIX: &str = "RANKQUEST";

impl RunSettings {
    /// Loads settings from a TOML file with environment variable overrides
    ///
    /// A missing file is not an error; the defaults and environment still apply.
    /// Environment variables are prefixed with `RANKQUEST_`, for example:
    /// - `RANKQUEST_CHUNK_SIZE=25`
    /// - `RANKQUEST_MAX_CONCURRENT_CHUNKS=4`
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut builder = ConfigLib::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build settings: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize settings: {e}")))
    }

    /// Creates settings from a TOML string (useful for testing)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load settings
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Settings file (~/.rankquest/settings.toml or custom --settings path)
    /// 3. Environment variables (RANKQUEST_*)
    ///
    /// Command line flags are applied by the caller on top of the result.
    pub fn load(settings_path: Option<&Path>) -> Result<Self> {
        let path = match settings_path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::config(format!(
                        "Settings file {} does not exist",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => global_settings_path()?,
        };
        Self::from_file(&path)
    }
}
