//! User preferences persisted as `settings.json` in the app config directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

pub const SETTINGS_FILE: &str = "settings.json";
pub const PDFIUM_DIR_ENV: &str = "PIXELCAT_PDFIUM_DIR";

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 2.0;
pub const DEFAULT_ZOOM: f32 = 1.2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appearance {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub zoom: f32,
    pub appearance: Appearance,
    pub zoom_debounce_ms: u64,
    /// Directory holding the PDFium shared library.
    pub pdfium_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            appearance: Appearance::Dark,
            zoom_debounce_ms: 300,
            pdfium_dir: None,
        }
    }
}

/// Clamp into the slider range; NaN falls back to the default.
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        DEFAULT_ZOOM
    } else {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

impl Settings {
    /// Read settings from `path`. A missing file gives defaults; an unreadable
    /// one is logged and also gives defaults.
    pub fn load(path: &Path) -> Self {
        let mut settings = match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Settings>(&raw) {
                Ok(s) => s,
                Err(e) => {
                    warn!("ignoring malformed {}: {}", path.display(), e);
                    Settings::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no settings at {}, using defaults", path.display());
                Settings::default()
            }
            Err(e) => {
                warn!("could not read {}: {}", path.display(), e);
                Settings::default()
            }
        };
        settings.zoom = clamp_zoom(settings.zoom);
        if let Some(dir) = std::env::var_os(PDFIUM_DIR_ENV).filter(|v| !v.is_empty()) {
            settings.pdfium_dir = Some(PathBuf::from(dir));
        }
        settings
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        self.zoom = clamp_zoom(zoom);
        self.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_clamped() {
        assert_eq!(clamp_zoom(0.1), MIN_ZOOM);
        assert_eq!(clamp_zoom(9.0), MAX_ZOOM);
        assert_eq!(clamp_zoom(1.0), 1.0);
        assert_eq!(clamp_zoom(f32::NAN), DEFAULT_ZOOM);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE));
        assert_eq!(settings.zoom, DEFAULT_ZOOM);
        assert_eq!(settings.appearance, Appearance::Dark);
        assert_eq!(settings.zoom_debounce_ms, 300);
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let mut settings = Settings::default();
        settings.set_zoom(1.6);
        settings.appearance = Appearance::Light;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.zoom, 1.6);
        assert_eq!(loaded.appearance, Appearance::Light);
    }

    #[test]
    fn partial_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        fs::write(&path, r#"{"zoom": 7.5}"#).unwrap();
        let loaded = Settings::load(&path);
        assert_eq!(loaded.zoom, MAX_ZOOM);
        assert_eq!(loaded.zoom_debounce_ms, 300);

        fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load(&path).zoom, DEFAULT_ZOOM);
    }
}
