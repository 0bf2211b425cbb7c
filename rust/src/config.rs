use std::collections::HashMap;

use serde::Deserialize;

/// Distance (in media time units) from the end of the timeline at which a
/// buffered range is treated as complete.
pub const MEDIA_END_TOLERANCE_SECONDS: f64 = 0.4;

/// Weight used when a resource declares none, or declares a non-positive one.
pub const DEFAULT_RESOURCE_WEIGHT: f64 = 1.0;

/// Size of each ranged media download request (256 KB).
pub const DEFAULT_CHUNK_SIZE: u64 = 256 * 1024;

/// Byte rate used to map downloaded bytes onto the media timeline (128 KB/s).
pub const DEFAULT_NOMINAL_BYTES_PER_SECOND: u64 = 128 * 1024;

/// Minimum size of the first media request, so the container can be sniffed
/// from it (MPEG-TS needs two sync bytes 188 apart).
pub const FORMAT_PROBE_BYTES: u64 = 512;

/// Configuration for the reqwest-backed image fetcher and media backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpBackendConfig {
    /// Base URL that relative `src` values are resolved against.
    pub base_url: Option<String>,
    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
    /// Size of each ranged media download in bytes.
    pub chunk_size: u64,
    /// Bytes per second of media timeline; `duration = content_length / rate`.
    pub nominal_bytes_per_second: u64,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            headers: HashMap::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            nominal_bytes_per_second: DEFAULT_NOMINAL_BYTES_PER_SECOND,
        }
    }
}
