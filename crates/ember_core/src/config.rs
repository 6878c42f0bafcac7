//! Flat `KEY=value` engine configuration.
//!
//! One pair per line, the first `=` splits key from value, no escaping.
//! A line without `=` is a parse error; the host treats that as fatal.
//! A missing file is not an error: the defaults are loaded and written
//! back so the player ends up with an editable config on first run.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "ember.cfg";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config line (expected KEY=value): '{line}'")]
    Parse { line: String },
    #[error("config key not found: {key}")]
    MissingKey { key: String },
    #[error("config key {key} has non-numeric value '{value}'")]
    InvalidNumber { key: String, value: String },
}

/// The keys the engine itself reads. Arbitrary keys may still be stored
/// and queried by name via [`Config::get_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ScreenWidth,
    ScreenHeight,
    BitsPerPixel,
    SoundVolume,
    MusicVolume,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::ScreenWidth,
        ConfigKey::ScreenHeight,
        ConfigKey::BitsPerPixel,
        ConfigKey::SoundVolume,
        ConfigKey::MusicVolume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::ScreenWidth => "R_SCREEN_WIDTH",
            ConfigKey::ScreenHeight => "R_SCREEN_HEIGHT",
            ConfigKey::BitsPerPixel => "R_BPP",
            ConfigKey::SoundVolume => "S_VOLUME",
            ConfigKey::MusicVolume => "S_MUSIC_VOLUME",
        }
    }

    pub fn default_value(self) -> &'static str {
        match self {
            ConfigKey::ScreenWidth => "720",
            ConfigKey::ScreenHeight => "480",
            ConfigKey::BitsPerPixel => "16",
            ConfigKey::SoundVolume => "100",
            ConfigKey::MusicVolume => "100",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    values: BTreeMap<String, String>,
}

impl Config {
    /// Load from `path`, or materialize the defaults there if it does
    /// not exist yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!(
                "Config '{}' not found, writing defaults",
                path.display()
            );
            let config = Self::defaults();
            config.save(path)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut values = BTreeMap::new();
        for line in raw.lines() {
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Parse {
                    line: line.to_string(),
                });
            };
            values.insert(key.to_string(), value.to_string());
        }

        Ok(Self { values })
    }

    pub fn defaults() -> Self {
        let mut values = BTreeMap::new();
        for key in ConfigKey::ALL {
            values.insert(key.name().to_string(), key.default_value().to_string());
        }
        Self { values }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let mut out = String::new();
        for (key, value) in &self.values {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        fs::write(path, out).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn get_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingKey {
                key: key.to_string(),
            })
    }

    pub fn get(&self, key: ConfigKey) -> Result<&str, ConfigError> {
        self.get_str(key.name())
    }

    pub fn get_int(&self, key: ConfigKey) -> Result<i32, ConfigError> {
        let value = self.get(key)?;
        value.parse().map_err(|_| ConfigError::InvalidNumber {
            key: key.name().to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_config_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "ember_config_test_{}_{}_{}.cfg",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn load_parses_flat_key_value_pairs() {
        let path = temp_config_path("valid");
        fs::write(&path, "R_SCREEN_WIDTH=1024\nR_SCREEN_HEIGHT=768\n").expect("write cfg");

        let config = Config::load(&path).expect("valid config should load");
        assert_eq!(config.get(ConfigKey::ScreenWidth).unwrap(), "1024");
        assert_eq!(config.get_int(ConfigKey::ScreenHeight).unwrap(), 768);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn first_equals_sign_splits_key_from_value() {
        let path = temp_config_path("nested_equals");
        fs::write(&path, "GREETING=a=b=c\n").expect("write cfg");

        let config = Config::load(&path).expect("config should load");
        assert_eq!(config.get_str("GREETING").unwrap(), "a=b=c");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn line_without_delimiter_fails_parse() {
        let path = temp_config_path("bad_line");
        fs::write(&path, "R_SCREEN_WIDTH=720\nthis line is broken\n").expect("write cfg");

        let err = Config::load(&path).expect_err("malformed line should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_materializes_defaults_on_disk() {
        let path = temp_config_path("missing");
        let _ = fs::remove_file(&path);

        let config = Config::load(&path).expect("defaults should load");
        assert_eq!(config.get_int(ConfigKey::ScreenWidth).unwrap(), 720);
        assert_eq!(config.get_int(ConfigKey::ScreenHeight).unwrap(), 480);
        assert_eq!(config.get_int(ConfigKey::BitsPerPixel).unwrap(), 16);
        assert_eq!(config.get_int(ConfigKey::SoundVolume).unwrap(), 100);
        assert_eq!(config.get_int(ConfigKey::MusicVolume).unwrap(), 100);

        // The defaults were written back, so a second load reads the file.
        assert!(path.exists());
        let reloaded = Config::load(&path).expect("written defaults should reload");
        assert_eq!(reloaded.get(ConfigKey::ScreenWidth).unwrap(), "720");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn unknown_key_is_missing_key_error() {
        let config = Config::defaults();
        let err = config.get_str("R_VSYNC").expect_err("unknown key should fail");
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }

    #[test]
    fn non_numeric_value_fails_get_int() {
        let path = temp_config_path("non_numeric");
        fs::write(&path, "R_SCREEN_WIDTH=wide\n").expect("write cfg");

        let config = Config::load(&path).expect("config should load");
        let err = config
            .get_int(ConfigKey::ScreenWidth)
            .expect_err("non-numeric value should fail");
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let _ = fs::remove_file(path);
    }
}
