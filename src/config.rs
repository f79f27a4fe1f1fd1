// Config file support. The file is a plain properties file whose keys
// mirror the shared command line flags. Values found here only fill in
// what was not passed explicitly.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const KEY_SERVICE: &str = "service";
pub const KEY_API_KEY: &str = "api-key";
pub const KEY_DELAY_SECS: &str = "delay-secs";
pub const KEY_SYSTEM: &str = "qa";
pub const KEY_LLM: &str = "llm";

/// Delay between batch calls when neither flag nor config sets one.
pub const DEFAULT_DELAY_SECS: u64 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file does not exist or cannot be read: {path}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`delay-secs` must be a whole number of seconds, got `{0}`")]
    InvalidDelay(String),
}

/// Key/value pairs loaded from a properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    /// Parse `key=value` / `key: value` lines. `#` and `!` start comment
    /// lines; a later duplicate key wins.
    pub fn parse(text: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = match line.find(|c: char| c == '=' || c == ':') {
                Some(idx) => (&line[..idx], &line[idx + 1..]),
                None => (line, ""),
            };
            values.insert(key.trim().to_string(), value.trim().to_string());
        }
        Properties { values }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(Self::parse(&text))
    }

    /// Non-empty value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// `explicit` when present, otherwise the config value for `key`.
    pub fn overlay(&self, explicit: Option<String>, key: &str) -> Option<String> {
        explicit
            .filter(|v| !v.is_empty())
            .or_else(|| self.get(key).map(str::to_string))
    }

    pub fn delay_secs(&self, explicit: Option<u64>) -> Result<u64, ConfigError> {
        if let Some(secs) = explicit {
            return Ok(secs);
        }
        match self.get(KEY_DELAY_SECS) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidDelay(raw.to_string())),
            None => Ok(DEFAULT_DELAY_SECS),
        }
    }
}

/// Location searched when no config file is named on the command line.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("qna").join("config.properties"))
}

/// Load the named file, or the default file if it exists, or nothing.
pub fn load_properties(explicit: Option<&Path>) -> Result<Properties, ConfigError> {
    if let Some(path) = explicit {
        return Properties::load(path);
    }
    match default_config_path() {
        Some(path) if path.is_file() => Properties::load(&path),
        _ => Ok(Properties::default()),
    }
}
