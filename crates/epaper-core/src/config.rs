// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration and its JSON file persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EpaperError, Result};

/// What happens to committed regions that reach past the image edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampPolicy {
    /// Clamp into the image: `x, y >= 0`, `x + width <= 100`, `y + height <= 100`.
    Clamp,
    /// Store coordinates as drawn, allowing slight overscan.
    Permissive,
}

/// Persistent engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpaperConfig {
    /// Upper bound for a single page store round-trip, in seconds.
    pub store_timeout_secs: u64,
    /// Coordinate policy applied when a region is committed.
    pub clamp_policy: ClampPolicy,
    /// Prefix of suggested clip filenames (`<prefix>-<date>-p<n>.png`).
    pub clip_filename_prefix: String,
    /// Share of each image dimension covered by the editor's initial crop box.
    pub editor_auto_crop_ratio: f64,
    /// Share of each image dimension covered by the reader's free-crop box.
    pub reader_auto_crop_ratio: f64,
    /// SQLite database holding the page store, if persisted locally.
    pub database_path: Option<PathBuf>,
    /// Directory that relative page image URLs resolve against.
    pub image_root: PathBuf,
}

impl Default for EpaperConfig {
    fn default() -> Self {
        Self {
            store_timeout_secs: 15,
            clamp_policy: ClampPolicy::Clamp,
            clip_filename_prefix: "epaper-clip".into(),
            editor_auto_crop_ratio: 0.5,
            reader_auto_crop_ratio: 0.8,
            database_path: None,
            image_root: PathBuf::from("."),
        }
    }
}

impl EpaperConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    /// Reject settings the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.store_timeout_secs == 0 {
            return Err(EpaperError::Config("store_timeout_secs must be positive".into()));
        }
        for (name, ratio) in [
            ("editor_auto_crop_ratio", self.editor_auto_crop_ratio),
            ("reader_auto_crop_ratio", self.reader_auto_crop_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(EpaperError::Config(format!("{name} must be in (0, 1], got {ratio}")));
            }
        }
        if self.clip_filename_prefix.trim().is_empty() {
            return Err(EpaperError::Config("clip_filename_prefix must not be empty".into()));
        }
        Ok(())
    }
}

/// Load the configuration stored at `path`.
///
/// A missing file yields the defaults; a malformed one is an error.
pub fn load_config(path: &Path) -> Result<EpaperConfig> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(EpaperConfig::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: EpaperConfig = serde_json::from_str(&data)?;
    if let Err(e) = config.validate() {
        warn!(path = %path.display(), error = %e, "Rejecting config file");
        return Err(e);
    }
    Ok(config)
}

/// Write `config` to `path` as pretty-printed JSON.
pub fn persist_config(path: &Path, config: &EpaperConfig) -> Result<()> {
    config.validate()?;
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("epaper.json")).unwrap();
        assert_eq!(config, EpaperConfig::default());
        assert_eq!(config.store_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epaper.json");
        let config = EpaperConfig {
            clamp_policy: ClampPolicy::Permissive,
            clip_filename_prefix: "cjnewshub-clip".into(),
            ..EpaperConfig::default()
        };
        persist_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epaper.json");
        std::fs::write(&path, r#"{"store_timeout_secs": 30}"#).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.store_timeout_secs, 30);
        assert_eq!(config.clamp_policy, ClampPolicy::Clamp);
    }

    #[test]
    fn invalid_ratio_is_rejected() {
        let config = EpaperConfig {
            reader_auto_crop_ratio: 1.5,
            ..EpaperConfig::default()
        };
        assert!(matches!(config.validate(), Err(EpaperError::Config(_))));
    }
}
