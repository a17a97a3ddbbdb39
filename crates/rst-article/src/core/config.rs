//! Configuration loading and management.
//!
//! The defaults reproduce the fixed rendering profile used for articles:
//! sections start at `<h2>`, code tokens use short class names, any ERROR
//! stops the transformation, and re-encoded JPEGs use quality 75.

use crate::rst::Severity;
use crate::{ArticleError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main transformation configuration.
///
/// # Example
///
/// ```rust
/// use rst_article::core::config::TransformConfig;
///
/// let config = TransformConfig::default();
/// assert_eq!(config.parser.initial_header_level, 2);
/// assert_eq!(config.images.jpeg_quality, 75);
///
/// // let config = TransformConfig::from_toml_file("rst-article.toml")?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub images: ImageConfig,
}

/// Token class naming for highlighted code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyntaxHighlight {
    /// `keyword`, `literal string`, ...
    Long,
    /// `k`, `s`, ...
    #[default]
    Short,
    /// No token markup.
    None,
}

/// Markup parser settings.
///
/// The defaults are the fixed article rendering profile: `<h2>` top-level
/// sections, short token classes, halt at `Error`, 8-column tabs. Config
/// files may override any of them; keys left out keep these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Heading level used for top-level sections of the body.
    #[serde(default = "default_initial_header_level")]
    pub initial_header_level: u8,

    #[serde(default)]
    pub syntax_highlight: SyntaxHighlight,

    /// System messages at or above this severity abort the transformation.
    #[serde(default = "default_halt_level")]
    pub halt_level: Severity,

    /// Tab stops used when expanding tabs in the source.
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            initial_header_level: default_initial_header_level(),
            syntax_highlight: SyntaxHighlight::default(),
            halt_level: default_halt_level(),
            tab_width: default_tab_width(),
        }
    }
}

/// Image re-encoding settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// JPEG quality, 1-100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Spend more effort on smaller output where the encoder supports it.
    #[serde(default = "default_true")]
    pub optimize: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
            optimize: default_true(),
        }
    }
}

fn default_initial_header_level() -> u8 {
    2
}

fn default_halt_level() -> Severity {
    Severity::Error
}

fn default_tab_width() -> usize {
    8
}

fn default_jpeg_quality() -> u8 {
    75
}

fn default_true() -> bool {
    true
}

impl TransformConfig {
    /// Check value ranges. Loaders call this after deserializing.
    pub fn validate(&self) -> Result<()> {
        if !(1..=6).contains(&self.parser.initial_header_level) {
            return Err(ArticleError::validation(format!(
                "initial_header_level must be between 1 and 6, got {}",
                self.parser.initial_header_level
            )));
        }
        if self.parser.tab_width == 0 {
            return Err(ArticleError::validation("tab_width must be at least 1"));
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(ArticleError::validation(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.images.jpeg_quality
            )));
        }
        Ok(())
    }

    fn read(path: &Path) -> Result<String> {
        std::fs::read_to_string(path)
            .map_err(|e| ArticleError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = Self::read(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ArticleError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = Self::read(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| ArticleError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = Self::read(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ArticleError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, choosing the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "toml" => Self::from_toml_file(path),
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ArticleError::validation(format!(
                "Unsupported config file format: {}. Use .toml, .yaml, .yml or .json",
                path.display()
            ))),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `rst-article.toml` in the current directory and its parents.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(ArticleError::Io)?;

        loop {
            let candidate = current.join("rst-article.toml");
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = TransformConfig::default();
        assert_eq!(config.parser.initial_header_level, 2);
        assert_eq!(config.parser.syntax_highlight, SyntaxHighlight::Short);
        assert_eq!(config.parser.halt_level, Severity::Error);
        assert_eq!(config.parser.tab_width, 8);
        assert_eq!(config.images.jpeg_quality, 75);
        assert!(config.images.optimize);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("rst-article.toml");

        fs::write(
            &config_path,
            r#"
[parser]
initial_header_level = 3
syntax_highlight = "long"
halt_level = "severe"

[images]
jpeg_quality = 90
        "#,
        )
        .unwrap();

        let config = TransformConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.parser.initial_header_level, 3);
        assert_eq!(config.parser.syntax_highlight, SyntaxHighlight::Long);
        assert_eq!(config.parser.halt_level, Severity::Severe);
        assert_eq!(config.parser.tab_width, 8);
        assert_eq!(config.images.jpeg_quality, 90);
        assert!(config.images.optimize);
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        fs::write(&config_path, "images:\n  optimize: false\n").unwrap();

        let config = TransformConfig::from_file(&config_path).unwrap();
        assert!(!config.images.optimize);
        assert_eq!(config.parser, ParserConfig::default());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"parser": {"syntax_highlight": "none"}}"#).unwrap();

        let config = TransformConfig::from_file(&config_path).unwrap();
        assert_eq!(config.parser.syntax_highlight, SyntaxHighlight::None);
    }

    #[test]
    fn test_validation_rejects_out_of_range_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("bad.toml");
        fs::write(&config_path, "[parser]\ninitial_header_level = 7\n").unwrap();

        let err = TransformConfig::from_toml_file(&config_path).unwrap_err();
        assert!(matches!(err, ArticleError::Validation { .. }));
        assert!(err.to_string().contains("initial_header_level"));

        let mut config = TransformConfig::default();
        config.images.jpeg_quality = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_validation_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("broken.toml");
        fs::write(&config_path, "[parser\n").unwrap();

        let err = TransformConfig::from_toml_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = TransformConfig::from_file("config.ini").unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }

    #[test]
    fn test_missing_file() {
        let err = TransformConfig::from_toml_file("/nonexistent/rst-article.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
