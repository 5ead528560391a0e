//! Configuration management for the Zero screener.
//!
//! The screener reads `~/.codecoder/screener.json`. A missing file is not an
//! error: every section has defaults.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (ZERO_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `ZERO_LOG_LEVEL` → observability.log_level
//! - `ZERO_LOG_FORMAT` → observability.log_format
//! - `ZERO_SCREENER_DICTIONARY` → screener.dictionary_path
//! - `ZERO_SCREENER_LAYOUT` → screener.layout (`pretty` | `single_line`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".codecoder"),
        |dirs| dirs.home_dir().join(".codecoder"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("screener.json")
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// ============================================================================
// Screener Configuration
// ============================================================================

/// How a serialized condition chain is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionLayout {
    /// One connector-led line per condition
    #[default]
    Pretty,
    /// Everything on one line
    SingleLine,
}

impl std::str::FromStr for ExpressionLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "single_line" | "single-line" | "compact" => Ok(Self::SingleLine),
            other => Err(format!("unknown expression layout: {other}")),
        }
    }
}

/// How `between` and `in` conditions are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStyle {
    /// `(字段 >= a AND 字段 <= b)`
    #[default]
    Expanded,
    /// `字段 BETWEEN [a, b]`
    Keyword,
}

/// Screener behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    /// Optional JSON file replacing the built-in field dictionary
    #[serde(default)]
    pub dictionary_path: Option<PathBuf>,

    /// Layout used when serializing condition lists
    #[serde(default)]
    pub layout: ExpressionLayout,

    /// Rendering of range and set conditions
    #[serde(default)]
    pub range_style: RangeStyle,

    /// Longest expression (in characters) echoed into filter session log
    /// lines. The free `validate` / `parse` functions take no config and
    /// use [`DEFAULT_LOG_PREVIEW_CHARS`].
    #[serde(default = "default_log_preview_chars")]
    pub log_preview_chars: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            dictionary_path: None,
            layout: ExpressionLayout::default(),
            range_style: RangeStyle::default(),
            log_preview_chars: default_log_preview_chars(),
        }
    }
}

/// Preview length used where no configuration is at hand.
pub const DEFAULT_LOG_PREVIEW_CHARS: usize = 80;

fn default_log_preview_chars() -> usize {
    DEFAULT_LOG_PREVIEW_CHARS
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for the screener.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub screener: ScreenerConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("ZERO_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("ZERO_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Ok(path) = std::env::var("ZERO_SCREENER_DICTIONARY") {
            if !path.trim().is_empty() {
                self.screener.dictionary_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(layout) = std::env::var("ZERO_SCREENER_LAYOUT") {
            match layout.parse() {
                Ok(layout) => self.screener.layout = layout,
                Err(e) => tracing::warn!("Ignoring ZERO_SCREENER_LAYOUT: {}", e),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.observability.log_format, "pretty");
        assert!(config.screener.dictionary_path.is_none());
        assert_eq!(config.screener.layout, ExpressionLayout::Pretty);
        assert_eq!(config.screener.range_style, RangeStyle::Expanded);
        assert_eq!(config.screener.log_preview_chars, 80);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"screener": {"layout": "single_line"}}"#).unwrap();
        assert_eq!(config.screener.layout, ExpressionLayout::SingleLine);
        assert_eq!(config.screener.range_style, RangeStyle::Expanded);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"observability": {{"log_level": "debug"}}, "screener": {{"range_style": "keyword"}}}}"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.screener.range_style, RangeStyle::Keyword);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ broken").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("pretty".parse::<ExpressionLayout>(), Ok(ExpressionLayout::Pretty));
        assert_eq!(
            "Single-Line".parse::<ExpressionLayout>(),
            Ok(ExpressionLayout::SingleLine)
        );
        assert!("diagonal".parse::<ExpressionLayout>().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("observability"));
        assert!(json.contains("\"layout\": \"pretty\""));

        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.screener.layout, config.screener.layout);
    }
}
