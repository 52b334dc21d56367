//! Configuration access port trait.
//!
//! Typed lookups by `[section] key`. A missing or blank key yields the
//! supplied default; a present value that does not parse is
//! `StopError::ConfigInvalid`.

use crate::domain::error::StopError;
use std::str::FromStr;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, StopError> {
        parse_or(self.get_string(section, key), section, key, default, "an integer")
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, StopError> {
        parse_or(self.get_string(section, key), section, key, default, "a number")
    }

    /// Accepts true/yes/on/1 and false/no/off/0, case-insensitively.
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, StopError> {
        match self.get_string(section, key) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err(unparsable(section, key, &raw, "a boolean")),
            },
        }
    }

    /// Comma-separated value split into trimmed items. Empty items are kept
    /// so callers can reject them.
    fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_string(section, key)
            .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    section: &str,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, StopError> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| unparsable(section, key, &raw, expected)),
    }
}

fn unparsable(section: &str, key: &str, raw: &str, expected: &str) -> StopError {
    StopError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: format!("'{raw}' is not {expected}"),
    }
}
