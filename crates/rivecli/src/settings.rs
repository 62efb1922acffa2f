use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use rive_cache::config::Config;
use tracing::level_filters::LevelFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Outputs the load results as JSON.
    Json,
    /// Outputs the load results as a table.
    Compact,
}

/// Loads Rive files through the file cache and reports how each load went.
///
/// Files are taken from the command line and from the `preload` list of the
/// configuration file. Relative paths are resolved against `--base-dir`, the
/// `base_dir` configuration option, or the current directory, in that order.
///
/// Exits with a non-zero status if any file failed to load.
#[derive(Clone, Parser, Debug)]
#[command(author, version, about, long_about)]
struct Cli {
    /// The Rive files to load, as paths or `file://` URLs.
    pub files: Vec<String>,

    /// Path to a YAML configuration file.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// The directory relative paths are resolved against.
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// The output format.
    #[arg(long, value_enum, default_value = "compact")]
    format: OutputFormat,

    /// The severity level of logging output.
    ///
    /// Possible values:
    /// off, error, warn, info, debug, trace
    ///
    /// Overrides the level from the configuration file.
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub config: Config,
    pub sources: Vec<String>,
    pub output_format: OutputFormat,
}

impl Settings {
    pub fn get() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    fn from_cli(cli: Cli) -> Result<Self> {
        let mut config = Config::get(cli.config.as_deref())?;

        if let Some(base_dir) = cli.base_dir {
            config.base_dir = Some(base_dir);
        }
        if let Some(level) = cli.log_level {
            config.logging.level = level;
        }

        let mut sources = config.preload.clone();
        sources.extend(cli.files);
        if sources.is_empty() {
            bail!("No Rive files given. Pass them as arguments or list them under `preload`.");
        }

        Ok(Settings {
            config,
            sources,
            output_format: cli.format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "rivecli",
            "--base-dir",
            "/srv/animations",
            "--log-level",
            "debug",
            "--format",
            "json",
            "a.riv",
            "b.riv",
        ]);
        let settings = Settings::from_cli(cli).unwrap();

        assert_eq!(settings.sources, vec!["a.riv", "b.riv"]);
        assert_eq!(settings.output_format, OutputFormat::Json);
        assert_eq!(settings.config.logging.level, LevelFilter::DEBUG);
        assert_eq!(
            settings.config.base_dir.as_deref(),
            Some(Path::new("/srv/animations"))
        );
    }

    #[test]
    fn test_no_sources() {
        let cli = Cli::parse_from(["rivecli"]);
        assert!(Settings::from_cli(cli).is_err());
    }
}
