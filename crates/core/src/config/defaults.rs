//! Default values and functions for run settings

/// Default number of rated searches per plugin call
pub const DEFAULT_CHUNK_SIZE: usize = 10;

pub(crate) fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

pub(crate) fn default_max_concurrent_chunks() -> usize {
    1
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_min_results_to_fetch() -> usize {
    10
}
