//! Run-wide key/value parameters in `.properties` text form.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use super::ConfigError;
use crate::error::Result;

/// A flat set of textual run parameters.
///
/// Values are parsed on lookup, with the caller supplying the default for
/// absent keys. Files use the `key=value` (or `key: value`) line format with
/// `#` and `!` comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load properties from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(text.parse()?)
    }

    /// Raw value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    /// Parsed value for a key, or `None` if absent.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|raw| {
                raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                })
            })
            .transpose()
    }

    /// Parsed value for a key, or `default` if absent.
    pub fn get_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        Ok(self.get_parsed(key)?.unwrap_or(default))
    }

    /// Parsed value for a key that must be present.
    pub fn require<T: FromStr>(&self, key: &str) -> Result<T, ConfigError> {
        self.get_parsed(key)?
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromStr for Properties {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut props = Properties::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some(split) = line.find(['=', ':']) else {
                return Err(ConfigError::MalformedLine {
                    line: index + 1,
                    text: line.to_string(),
                });
            };
            let (key, value) = line.split_at(split);
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::MalformedLine {
                    line: index + 1,
                    text: line.to_string(),
                });
            }
            props.set(key, value[1..].trim());
        }
        Ok(props)
    }
}
