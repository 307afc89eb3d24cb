//! Configuration management for the formcheck command-line front end.
//!
//! Handles:
//! - Command-line argument parsing
//! - Locating the declarations file

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Default declarations file looked up in the working directory
pub const DEFAULT_FORMS_FILE: &str = "formcheck.toml";

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Command-line arguments for formcheck
#[derive(Debug, Parser)]
#[command(name = "formcheck")]
#[command(about = "Validate form values against declared rules")]
#[command(version)]
pub struct Args {
    /// Declarations file (TOML or JSON)
    #[arg(long, help = "File declaring forms, field rules and messages")]
    pub forms: Option<PathBuf>,

    /// Values file (TOML or JSON): form -> field -> value
    #[arg(long, help = "File holding the field values to validate")]
    pub values: PathBuf,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level
    #[arg(
        long,
        default_value = "warn",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Declarations file to load
    pub forms_path: PathBuf,
    /// Values file to validate
    pub values_path: PathBuf,
    pub format: OutputFormat,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let forms_path = match args.forms {
            Some(path) => path,
            None => Self::find_forms_file()?,
        };

        Ok(Config {
            forms_path,
            values_path: args.values,
            format: args.format,
            log_level: args.log_level,
        })
    }

    /// Places searched when `--forms` is not given, in priority order
    pub fn default_forms_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(DEFAULT_FORMS_FILE)];

        // User config directory: ~/.config/formcheck/forms.toml
        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join("formcheck").join("forms.toml"));
        }

        locations
    }

    fn find_forms_file() -> Result<PathBuf> {
        let locations = Self::default_forms_locations();
        match locations.iter().find(|path| path.is_file()) {
            Some(path) => Ok(path.clone()),
            None => bail!(
                "No declarations file given and none found (looked in: {})",
                locations
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_paths() {
        let args = Args::parse_from([
            "formcheck",
            "--forms",
            "forms.toml",
            "--values",
            "values.json",
            "--format",
            "json",
        ]);
        let config = Config::from_args(args).unwrap();

        assert_eq!(config.forms_path, PathBuf::from("forms.toml"));
        assert_eq!(config.values_path, PathBuf::from("values.json"));
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_default_locations_start_with_working_directory() {
        let locations = Config::default_forms_locations();
        assert_eq!(locations[0], PathBuf::from(DEFAULT_FORMS_FILE));
    }
}
