//! Configuration file support
//!
//! Loads settings from ~/.pipeline-highlight.toml (or
//! %USERPROFILE%\.pipeline-highlight.toml on Windows)
//!
//! Example:
//! ```text
//! # pipeline-highlight configuration
//! poll-interval-ms = 1000
//! pipeline-grammar = "pipeline-yaml"
//! shell-grammar = "shell-script"
//! color = true
//!
//! [colors]
//! Keyword = "magenta"
//! Comment = "bright-black"
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HighlightError, Result};
use crate::syntax::{Color, TokenType, PIPELINE_GRAMMAR_ID, SHELL_GRAMMAR_ID};

const CONFIG_FILE: &str = ".pipeline-highlight.toml";

/// Configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Delay between attachment checks, in milliseconds
    pub poll_interval_ms: u64,
    /// Identifier of the pipeline grammar
    pub pipeline_grammar: String,
    /// Identifier of the shell grammar
    pub shell_grammar: String,
    /// Whether to emit colors
    pub color: bool,
    /// Token name -> color name overrides
    pub colors: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            pipeline_grammar: PIPELINE_GRAMMAR_ID.to_string(),
            shell_grammar: SHELL_GRAMMAR_ID.to_string(),
            color: true,
            colors: HashMap::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(CONFIG_FILE))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(CONFIG_FILE))
        }
    }

    /// Load configuration from the default location
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_optional(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a file that may not exist
    pub fn load_optional(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load configuration from a file that must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.poll_interval_ms = config.poll_interval_ms.max(10); // Minimum 10 ms
        config.color_overrides()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Resolve the `[colors]` table
    pub fn color_overrides(&self) -> Result<Vec<(TokenType, Color)>> {
        let mut overrides = Vec::new();
        for (token, color) in &self.colors {
            let token_type = TokenType::from_name(token)
                .ok_or_else(|| HighlightError::Message(format!("unknown token type in [colors]: {}", token)))?;
            let color = Color::from_name(color)
                .ok_or_else(|| HighlightError::Message(format!("unknown color for {}: {}", token, color)))?;
            overrides.push((token_type, color));
        }
        Ok(overrides)
    }
}
