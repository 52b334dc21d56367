//! INI file configuration adapter.
//!
//! Section and key names are case-insensitive; values keep their case.

use crate::domain::error::StopError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

/// Sections volstop reads. Anything else in a file is ignored.
pub const KNOWN_SECTIONS: [&str; 7] = [
    "atr", "regime", "stop", "sizing", "channels", "data", "watchlist",
];

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StopError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| StopError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, StopError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| StopError::ConfigParse {
                file: "<string>".into(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// Sections present in the file that volstop does not read, sorted.
    pub fn unknown_sections(&self) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .config
            .sections()
            .into_iter()
            .filter(|s| s != "default" && !KNOWN_SECTIONS.contains(&s.as_str()))
            .collect();
        unknown.sort();
        unknown
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
