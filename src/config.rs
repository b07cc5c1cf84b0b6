//! Run configuration.
//!
//! Sources, highest precedence first:
//!
//! 1. command-line flags (applied by `app`)
//! 2. TOML file given with `--config`
//! 3. environment (`CALLCAST_DATA_DIR`, `.env` honoured)
//! 4. built-in defaults
//!
//! Example file:
//!
//! ```toml
//! [data]
//! snapshot_dir = "data/call_volume"
//!
//! [view]
//! start = "2023-06"
//!
//! [plot]
//! enabled = true
//! width = 100
//! height = 25
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::Month;
use crate::error::{AppError, Result};

pub const DATA_DIR_ENV: &str = "CALLCAST_DATA_DIR";
pub const DEFAULT_DATA_DIR: &str = "data/call_volume";
pub const DEFAULT_PLOT_WIDTH: usize = 100;
pub const DEFAULT_PLOT_HEIGHT: usize = 25;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data: DataSection,
    pub view: ViewSection,
    pub plot: PlotSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataSection {
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewSection {
    pub start: Option<Month>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotSection {
    pub enabled: Option<bool>,
    pub width: Option<usize>,
    pub height: Option<usize>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        Self::from_toml_str(&content)
            .map_err(|e| AppError::config(format!("'{}': {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AppError::config(format!("TOML parsing error: {e}")))
    }
}

/// Settings after merging file, environment and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub view_start: Option<Month>,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

impl Settings {
    /// Read `.env`, the environment and the optional TOML file.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let file = match config_path {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::from_sources(file, std::env::var(DATA_DIR_ENV).ok()))
    }

    pub fn from_sources(file: FileConfig, env_data_dir: Option<String>) -> Self {
        let data_dir = file
            .data
            .snapshot_dir
            .or_else(|| env_data_dir.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        Self {
            data_dir,
            view_start: file.view.start,
            plot: file.plot.enabled.unwrap_or(true),
            plot_width: file.plot.width.unwrap_or(DEFAULT_PLOT_WIDTH),
            plot_height: file.plot.height.unwrap_or(DEFAULT_PLOT_HEIGHT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let s = Settings::from_sources(FileConfig::default(), None);
        assert_eq!(s.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        assert!(s.plot);
        assert_eq!(s.plot_width, DEFAULT_PLOT_WIDTH);
        assert_eq!(s.view_start, None);
    }

    #[test]
    fn toml_beats_environment() {
        let file = FileConfig::from_toml_str(
            "[data]\nsnapshot_dir = \"from/toml\"\n[view]\nstart = \"2023-06\"\n[plot]\nwidth = 60\n",
        )
        .unwrap();
        let s = Settings::from_sources(file, Some("from/env".to_string()));
        assert_eq!(s.data_dir, PathBuf::from("from/toml"));
        assert_eq!(s.view_start, Month::new(2023, 6));
        assert_eq!(s.plot_width, 60);
        assert_eq!(s.plot_height, DEFAULT_PLOT_HEIGHT);
    }

    #[test]
    fn environment_beats_default() {
        let s = Settings::from_sources(FileConfig::default(), Some("from/env".to_string()));
        assert_eq!(s.data_dir, PathBuf::from("from/env"));
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = FileConfig::from_toml_str("[view]\nstart = \"June\"\n").unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
        assert_eq!(err.exit_code(), 2);

        assert!(FileConfig::from_toml_str("[unknown]\nx = 1\n").is_err());
    }
}
