//! Persisted driver settings
//!
//! The two values the user picks: which serial port the station is on and
//! whether diagnostic tracing is wanted. Stored as JSON in the user's config
//! directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::DriverError;

/// Directory name under the platform config dir
const SETTINGS_DIR: &str = "remote-open-meteo";

/// Settings file name
const SETTINGS_FILE: &str = "settings.json";

/// Driver settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverSettings {
    /// Serial port identifier, used verbatim to open the port
    pub port: String,

    /// Verbose diagnostic logging
    pub trace_enabled: bool,
}

impl DriverSettings {
    /// Default settings file location
    pub fn default_path() -> io::Result<PathBuf> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
            })?;
        Ok(base.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Load settings; a missing file gives the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(DriverError::Settings(format!(
                    "reading {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&content)
            .map_err(|e| DriverError::Settings(format!("parsing {}: {}", path.display(), e)))
    }

    /// Save settings, creating the parent directory if needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DriverError> {
        let path = path.as_ref();
        let write = || -> io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(self)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            fs::write(path, content)
        };
        write().map_err(|e| DriverError::Settings(format!("writing {}: {}", path.display(), e)))
    }

    /// Whether a port has been selected
    pub fn has_port(&self) -> bool {
        !self.port.is_empty()
    }

    /// Log filter directive matching the trace flag
    pub fn log_filter(&self) -> &'static str {
        if self.trace_enabled {
            "info,rom_core=trace"
        } else {
            "warn,rom_core=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = DriverSettings::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, DriverSettings::default());
        assert!(!settings.has_port());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = DriverSettings {
            port: "COM4".to_string(),
            trace_enabled: true,
        };
        settings.save(&path).unwrap();

        let loaded = DriverSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.log_filter(), "info,rom_core=trace");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, r#"{ "port": "/dev/ttyUSB0" }"#).unwrap();
        let loaded = DriverSettings::load(&path).unwrap();
        assert_eq!(loaded.port, "/dev/ttyUSB0");
        assert!(!loaded.trace_enabled);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            DriverSettings::load(&path),
            Err(DriverError::Settings(_))
        ));
    }

    #[test]
    fn test_default_path_ends_with_file_name() {
        if let Ok(path) = DriverSettings::default_path() {
            assert!(path.ends_with(Path::new(SETTINGS_DIR).join(SETTINGS_FILE)));
        }
    }
}
