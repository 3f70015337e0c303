use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Lowest and highest accepted cutoff settings, in seconds.
pub const CUTOFF_RANGE: (i32, i32) = (1, 10);
/// Accepted cutoff buffer, in percent of the setting.
pub const CUTOFF_BUFFER_RANGE: (i32, i32) = (-5, 15);
pub const DEFAULT_CUTOFF_BUFFER: i32 = 5;
pub const DEFAULT_CUTOFF: i32 = 8;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings of the reference cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Archive location.
    pub path: PathBuf,
    /// Percentage shaved off the cutoff setting before comparing search times.
    /// Values outside [-5, 15] fall back to 5.
    pub cutoff_buffer: i32,
    /// Cutoff setting used for a fresh or reset archive.
    pub default_cutoff: i32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database").join("reference.db"),
            cutoff_buffer: DEFAULT_CUTOFF_BUFFER,
            default_cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl CacheConfig {
    /// Default settings with the archive at `path`.
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The configured buffer, or the default when out of range.
    pub fn effective_cutoff_buffer(&self) -> i32 {
        let (lo, hi) = CUTOFF_BUFFER_RANGE;
        if (lo..=hi).contains(&self.cutoff_buffer) {
            self.cutoff_buffer
        } else {
            log::warn!(
                "invalid reference cutoff buffer {}, allowed {lo} ({}%) to {hi} ({}%); \
                 using {DEFAULT_CUTOFF_BUFFER}",
                self.cutoff_buffer,
                100 - lo,
                100 - hi,
            );
            DEFAULT_CUTOFF_BUFFER
        }
    }

    /// The configured default cutoff, or the built-in one when out of range.
    pub fn effective_default_cutoff(&self) -> i32 {
        let (lo, hi) = CUTOFF_RANGE;
        if (lo..=hi).contains(&self.default_cutoff) {
            self.default_cutoff
        } else {
            log::warn!("invalid default cutoff {}, using {DEFAULT_CUTOFF}", self.default_cutoff);
            DEFAULT_CUTOFF
        }
    }
}

/// Minimum search time in seconds for a cutoff `setting` and `buffer` percent.
pub fn cutoff_limit(setting: i32, buffer: i32) -> f64 {
    setting as f64 * (100 - buffer) as f64 / 100.0
}
