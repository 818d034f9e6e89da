//! Recorder configuration

use encoder::Container;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Recorder configuration
///
/// Encoding parameters are fixed; only where the file goes, what it is
/// called, the container and the permission wait are configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Output directory, `None` for the host's files directory
    pub output_dir: Option<PathBuf>,
    /// File name prefix, followed by `_<millis>.<ext>`
    pub file_prefix: String,
    /// Output container
    pub container: Container,
    /// Give up on the permission prompt after this long, `None` waits forever
    pub permission_timeout_ms: Option<u64>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            file_prefix: "screen_recording".to_string(),
            container: Container::Mp4,
            permission_timeout_ms: None,
        }
    }
}

impl RecorderConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn permission_timeout(&self) -> Option<Duration> {
        self.permission_timeout_ms.map(Duration::from_millis)
    }
}
