/// Application settings
///
/// Settings are a small JSON document. Every key is optional; missing keys
/// take their default. The file is looked up in this order:
/// - an explicit path given on the command line (must exist)
/// - `<config dir>/optical-configurator/settings.json` (optional)
/// - built-in defaults

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ValidationError};
use crate::optics::metrics::DEFAULT_REQUIRED_PX;
use crate::optics::params::DEFAULT_WD_MM;

const APP_DIR: &str = "optical-configurator";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `cameras.json` and `objectives.json`
    pub catalog_dir: Option<PathBuf>,
    /// Working distance a reset session starts from (mm)
    pub default_wd_mm: f64,
    /// Pixels a defect must span to count as detectable
    pub required_defect_px: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_dir: None,
            default_wd_mm: DEFAULT_WD_MM,
            required_defect_px: DEFAULT_REQUIRED_PX,
        }
    }
}

impl Settings {
    /// Load settings from `explicit` if given, else from the default location if present
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate().map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        info!("⚙️  Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Default WD must be a finite positive distance, defects must span at least one pixel
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.default_wd_mm.is_finite() && self.default_wd_mm > 0.0) {
            return Err(ValidationError::NotPositiveFloat {
                field: "default_wd_mm",
                input: self.default_wd_mm.to_string(),
            });
        }
        if self.required_defect_px == 0 {
            return Err(ValidationError::NotPositiveInteger {
                field: "required_defect_px",
                input: self.required_defect_px.to_string(),
            });
        }
        Ok(())
    }

    /// `<config dir>/optical-configurator/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Catalog directory to use, falling back to the user's data directory:
    /// - Linux: ~/.local/share/optical-configurator
    /// - macOS: ~/Library/Application Support/optical-configurator
    /// - Windows: %APPDATA%\optical-configurator
    pub fn catalog_dir(&self) -> PathBuf {
        if let Some(dir) = &self.catalog_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_wd_mm, 200.0);
        assert_eq!(settings.required_defect_px, 3);
        assert!(settings.catalog_dir().ends_with(APP_DIR));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"required_defect_px": 5, "catalog_dir": "/tmp/catalogs"}"#).unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.required_defect_px, 5);
        assert_eq!(settings.default_wd_mm, 200.0);
        assert_eq!(settings.catalog_dir(), PathBuf::from("/tmp/catalogs"));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(Settings::load(Some(&missing)), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);

        fs::write(&path, r#"{"default_wd_mm": -50.0}"#).unwrap();
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(ConfigError::Invalid {
                source: ValidationError::NotPositiveFloat { field: "default_wd_mm", .. },
                ..
            })
        ));

        fs::write(&path, r#"{"default_wd_mm": 0}"#).unwrap();
        assert!(matches!(Settings::load(Some(&path)), Err(ConfigError::Invalid { .. })));

        fs::write(&path, r#"{"required_defect_px": 0}"#).unwrap();
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(ConfigError::Invalid {
                source: ValidationError::NotPositiveInteger { field: "required_defect_px", .. },
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{"default_wd_mm": "far"}"#).unwrap();
        assert!(matches!(Settings::load(Some(&path)), Err(ConfigError::Parse { .. })));
    }
}
