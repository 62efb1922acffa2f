use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, de};
use tracing::level_filters::LevelFilter;

/// How log lines are rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Pretty on a terminal, simplified otherwise.
    Auto,
    Pretty,
    /// One compact line per event, without colors.
    Simplified,
    /// JSON lines including the current span.
    Json,
}

/// The `logging` section of the configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Logging {
    /// Used unless `RUST_LOG` is set.
    #[serde(deserialize_with = "deserialize_level_filter")]
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Configuration of the cache and the `rivecli` tool, read from YAML.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: Logging,

    /// The directory relative `src` paths are resolved against.
    ///
    /// Defaults to the current working directory.
    pub base_dir: Option<PathBuf>,

    /// Files to load into the cache up front.
    pub preload: Vec<String>,
}

impl Config {
    /// Reads the configuration from `path`, or returns the defaults if there is none.
    pub fn get(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let yaml = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&yaml)
    }

    fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            anyhow::bail!("config file is empty");
        }
        serde_yaml::from_str(yaml).context("failed to parse config YAML")
    }
}

/// Parses levels the way `RUST_LOG` spells them, e.g. `"warn"` or `"off"`.
fn deserialize_level_filter<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<LevelFilter, D::Error> {
    let level = String::deserialize(deserializer)?;
    level.parse().map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::get(None).unwrap();
        assert_eq!(cfg.logging.level, LevelFilter::INFO);
        assert_eq!(cfg.logging.format, LogFormat::Auto);
        assert_eq!(cfg.base_dir, None);
        assert!(cfg.preload.is_empty());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
            logging:
              level: trace
              format: json
            base_dir: /srv/animations
            preload:
              - vehicles.riv
              - file:///opt/shared/loader.riv
        "#;
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.logging.level, LevelFilter::TRACE);
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.base_dir.as_deref(), Some(Path::new("/srv/animations")));
        assert_eq!(
            cfg.preload,
            vec!["vehicles.riv", "file:///opt/shared/loader.riv"]
        );
    }

    #[test]
    fn test_partial_logging() {
        // Setting only the level keeps the default format.
        let yaml = r#"
            logging:
              level: warn
        "#;
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.logging.level, LevelFilter::WARN);
        assert_eq!(cfg.logging.format, LogFormat::Auto);
    }

    #[test]
    fn test_invalid_level() {
        let yaml = r#"
            logging:
              level: verbose
        "#;
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let yaml = r#"
            base_dir: animations
            autoplay:
              state_machine: Idle
        "#;
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.base_dir.as_deref(), Some(Path::new("animations")));
    }

    #[test]
    fn test_empty_file() {
        assert!(Config::from_yaml("").is_err());
        assert!(Config::from_yaml("  \n").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::get(Some(Path::new("/nonexistent/rivecli.yml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rivecli.yml"));
    }
}
