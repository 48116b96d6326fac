//! Run settings for the rankquest pipeline
//!
//! These are the ambient tuning knobs of a metrics run (batching, concurrency,
//! timeouts). They are separate from the search plugin configuration, which
//! describes *what* to evaluate. Settings can be loaded from a TOML file and/or
//! environment variables, and command line flags override both.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use defaults::DEFAULT_CHUNK_SIZE;

use defaults::*;

/// Upper bound on chunks dispatched to a backend at the same time
const MAX_CONCURRENT_CHUNKS_LIMIT: usize = 64;

/// Returns the path to the global settings file
///
/// The global settings are stored at `~/.rankquest/settings.toml` and apply to
/// every run that does not pass an explicit `--settings` path.
pub fn global_settings_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| Error::config("Unable to determine home directory".to_string()))?;
    Ok(home_dir.join(".rankquest").join("settings.toml"))
}

/// Tuning settings for a metrics run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Number of rated searches dispatched to the search plugin per call
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Number of chunks that may be in flight at once (1 = sequential)
    #[serde(default = "default_max_concurrent_chunks")]
    pub max_concurrent_chunks: usize,

    /// Timeout for a single backend request in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Lower bound on results fetched per rated search
    ///
    /// The effective number is the larger of this and the biggest `k`
    /// among the configured metrics.
    #[serde(default = "default_min_results_to_fetch")]
    pub min_results_to_fetch: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_concurrent_chunks: default_max_concurrent_chunks(),
            request_timeout_secs: default_request_timeout_secs(),
            min_results_to_fetch: default_min_results_to_fetch(),
        }
    }
}

impl RunSettings {
    /// Override the chunk size, typically from a command line flag
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Override the number of concurrently dispatched chunks
    pub fn with_max_concurrent_chunks(mut self, max_concurrent_chunks: usize) -> Self {
        self.max_concurrent_chunks = max_concurrent_chunks;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrent_chunks == 0 {
            return Err(Error::config(
                "max_concurrent_chunks must be greater than 0".to_string(),
            ));
        }
        if self.max_concurrent_chunks > MAX_CONCURRENT_CHUNKS_LIMIT {
            return Err(Error::config(format!(
                "max_concurrent_chunks too large (max {MAX_CONCURRENT_CHUNKS_LIMIT}, got {})",
                self.max_concurrent_chunks
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.min_results_to_fetch == 0 {
            return Err(Error::config(
                "min_results_to_fetch must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
