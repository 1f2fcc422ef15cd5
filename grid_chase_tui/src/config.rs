//! Optional TOML configuration.
//!
//! Only timing and logging are configurable; the grid and the key bindings
//! are fixed. Missing keys fall back to the defaults below.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// Timer and obstacle cadence in milliseconds.
    pub tick_ms: u64,
    /// Pause between frames of the input/render loop.
    pub frame_ms: u64,
    pub log_file: Option<PathBuf>,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            tick_ms: default_tick_ms(),
            frame_ms: default_frame_ms(),
            log_file: None,
            log_filter: default_log_filter(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    log: TomlLog,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlTiming {
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TomlLog {
    #[serde(default)]
    file: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    filter: String,
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_ms: default_tick_ms(),
            frame_ms: default_frame_ms(),
        }
    }
}

impl Default for TomlLog {
    fn default() -> Self {
        TomlLog {
            file: None,
            filter: default_log_filter(),
        }
    }
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_frame_ms() -> u64 {
    30
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Parses configuration from TOML text.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let raw: TomlConfig = toml::from_str(text)?;
        Ok(AppConfig {
            // A zero cadence would spin the background threads.
            tick_ms: raw.timing.tick_ms.max(1),
            frame_ms: raw.timing.frame_ms,
            log_file: raw.log.file,
            log_filter: raw.log.filter,
        })
    }

    /// Loads configuration from `path`, or returns the defaults when no path
    /// is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(AppConfig::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        AppConfig::parse(&text).with_context(|| format!("parsing config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(AppConfig::parse("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::parse(
            r#"
            [timing]
            tick_ms = 500

            [log]
            file = "chase.log"
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_ms, 500);
        assert_eq!(config.frame_ms, 30);
        assert_eq!(config.log_file, Some(PathBuf::from("chase.log")));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn zero_tick_is_clamped() {
        let config = AppConfig::parse("[timing]\ntick_ms = 0\n").unwrap();
        assert_eq!(config.tick_ms, 1);
    }

    #[test]
    fn grid_size_is_not_configurable() {
        assert!(AppConfig::parse("[grid]\nsize = 20\n").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/grid_chase.toml"))).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
