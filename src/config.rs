//! CLI configuration.
//!
//! Settings come from `ktsyntax.yaml` (or the file given with `--config`);
//! command-line flags override them.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use termcolor::ColorChoice;

use crate::errors::{read_source, KtError};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "ktsyntax.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl From<ColorMode> for ColorChoice {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Schema file used instead of the built-in Kotlin schema.
    pub schema: Option<PathBuf>,
    pub format: OutputFormat,
    pub color: ColorMode,
    /// File extensions `parse` picks up when given a directory.
    pub extensions: Vec<String>,
    /// Parser threads for directories; 0 uses every available core.
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: None,
            format: OutputFormat::Text,
            color: ColorMode::Auto,
            extensions: vec!["kt".to_string(), "kts".to_string()],
            threads: 0,
        }
    }
}

impl Config {
    /// Loads `path`, or the default file if it exists, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, KtError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, KtError> {
        let text = read_source(path)?;
        Self::from_yaml(&text).map_err(|message| KtError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
        if config.extensions.is_empty() {
            return Err("`extensions` must list at least one extension".to_string());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("format: json\nthreads: 2\n").unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.threads, 2);
        assert_eq!(config.color, ColorMode::Auto);
        assert_eq!(config.extensions, ["kt", "kts"]);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = Config::from_yaml("fromat: json\n").unwrap_err();
        assert!(err.contains("fromat"));
    }

    #[test]
    fn test_empty_extensions_rejected() {
        assert!(Config::from_yaml("extensions: []\n").is_err());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }
}
