//! Run configuration: category rules and date options.
//!
//! Category rules are read from a JSON document mapping category names to
//! lists of extensions:
//!
//! ```json
//! {
//!     "images": ["jpg", ".png"],
//!     "books": [".epub", "mobi"]
//! }
//! ```
//!
//! Extensions may be written with or without the leading dot and in any case.
//! Categories keep the order in which they appear in the document, which is
//! also the order used for classification.
//!
//! Loading is lenient: [`RuleSet::load`] never fails and falls back to the
//! built-in table when the file is missing, malformed or empty, so a broken config
//! never aborts a batch. Use [`RuleSet::load_from_file`] for strict loading.

use crate::file_category::RuleSet;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Default strftime pattern for date mode (`2024/03`).
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// IO error while reading configuration.
    #[error("IO error reading {}: {}", path.display(), error)]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The document is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The document is JSON but not an object of string lists.
    #[error("Invalid configuration: {0}")]
    InvalidShape(String),

    /// The date pattern contains an unknown or malformed specifier.
    #[error("Invalid date format '{0}'")]
    InvalidDateFormat(String),
}

impl RuleSet {
    /// Loads rules, falling back to the defaults on any failure.
    ///
    /// With no path the built-in table is returned. When the file cannot be
    /// read or parsed a warning is logged and the defaults are used instead.
    pub fn load(config_path: Option<&Path>) -> Self {
        let Some(path) = config_path else {
            return Self::defaults();
        };

        match Self::load_from_file(path) {
            Ok(rules) => rules,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Could not load category rules; using defaults"
                );
                Self::defaults()
            }
        }
    }

    /// Loads rules from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::Io` if it cannot be read, and `InvalidJson` /
    /// `InvalidShape` if its contents are not a category mapping.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|error| ConfigError::Io {
            path: path.to_path_buf(),
            error,
        })?;

        Self::from_json_str(&content)
    }

    /// Parses rules from a JSON document.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::file_category::{Category, RuleSet};
    ///
    /// let rules = RuleSet::from_json_str(r#"{"books": ["EPUB", ".mobi"]}"#).unwrap();
    /// assert_eq!(rules.classify(".epub"), Category::Named("books"));
    /// assert_eq!(rules.classify(".mobi"), Category::Named("books"));
    /// ```
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let document: Value = serde_json::from_str(content)?;
        let categories: Map<String, Value> = serde_json::from_value(document).map_err(|_| {
            ConfigError::InvalidShape("expected an object of category -> extensions".to_string())
        })?;
        if categories.is_empty() {
            return Err(ConfigError::InvalidShape("no categories".to_string()));
        }

        let mut entries = Vec::with_capacity(categories.len());
        for (category, value) in categories {
            if category.trim().is_empty() {
                return Err(ConfigError::InvalidShape(
                    "category names must not be empty".to_string(),
                ));
            }

            let extensions: Vec<String> = serde_json::from_value(value).map_err(|_| {
                ConfigError::InvalidShape(format!(
                    "extensions for '{}' must be a list of strings",
                    category
                ))
            })?;
            entries.push((category, extensions));
        }

        Ok(Self::from_entries(entries))
    }
}

/// Which timestamp date mode groups files by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DateAttribute {
    /// Last modification time.
    #[default]
    #[value(name = "mtime")]
    Modified,
    /// Inode change time on Unix, creation time elsewhere.
    #[value(name = "ctime")]
    Changed,
}

impl DateAttribute {
    /// Parses `"mtime"` or `"ctime"`; anything else falls back to `Modified`.
    ///
    /// Unknown names are not an error, only a logged warning.
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mtime" => DateAttribute::Modified,
            "ctime" => DateAttribute::Changed,
            other => {
                warn!(
                    attribute = other,
                    "Unknown date attribute; using modification time"
                );
                DateAttribute::Modified
            }
        }
    }

    /// The name used on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            DateAttribute::Modified => "mtime",
            DateAttribute::Changed => "ctime",
        }
    }
}

/// A validated strftime pattern producing a relative subpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    /// Validates `pattern`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDateFormat` if any specifier is unknown.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::config::DateFormat;
    ///
    /// assert!(DateFormat::parse("%Y/%m/%d").is_ok());
    /// assert!(DateFormat::parse("%Y/%").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(pattern.to_string()));
        }
        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    /// The raw pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Renders `timestamp` into a relative subpath.
    ///
    /// Root, prefix and `..` components are dropped so the result always
    /// stays below the directory it is joined to.
    pub fn subpath(&self, timestamp: &DateTime<Local>) -> PathBuf {
        let rendered = timestamp.format(&self.pattern).to_string();
        Path::new(&rendered)
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect()
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::Category;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_no_path_returns_defaults() {
        assert_eq!(RuleSet::load(None), RuleSet::defaults());
    }

    #[test]
    fn test_extensions_are_normalized() {
        let rules =
            RuleSet::from_json_str(r#"{"images": ["JPG"], "photos": [".Jpg"]}"#).unwrap();
        let images = &rules.categories()[0];
        assert!(images.extensions.contains(".jpg"));
        assert_eq!(rules.classify("jpg"), Category::Named("images"));
    }

    #[test]
    fn test_dotless_and_dotted_extensions_classify_the_same() {
        let dotless = RuleSet::from_json_str(r#"{"pics": ["jpg"]}"#).unwrap();
        let dotted = RuleSet::from_json_str(r#"{"pics": [".jpg"]}"#).unwrap();
        assert_eq!(dotless, dotted);
        assert_eq!(dotless.classify(".jpg"), dotted.classify(".jpg"));
    }

    #[test]
    fn test_document_order_is_preserved() {
        let rules =
            RuleSet::from_json_str(r#"{"zeta": [".a"], "alpha": [".a"], "mid": [".b"]}"#)
                .unwrap();
        let names: Vec<_> = rules.categories().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(rules.classify(".a"), Category::Named("zeta"));
    }

    #[test]
    fn test_wrong_shapes_are_rejected() {
        assert!(matches!(
            RuleSet::from_json_str("[1, 2]"),
            Err(ConfigError::InvalidShape(_))
        ));
        assert!(matches!(
            RuleSet::from_json_str(r#"{"images": ".jpg"}"#),
            Err(ConfigError::InvalidShape(_))
        ));
        assert!(matches!(
            RuleSet::from_json_str(r#"{"images": [1]}"#),
            Err(ConfigError::InvalidShape(_))
        ));
        assert!(matches!(
            RuleSet::from_json_str(r#"{"": [".jpg"]}"#),
            Err(ConfigError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_malformed_json_falls_back_to_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("rules.json");
        fs::write(&path, "{ not json").expect("Failed to write config");

        assert!(matches!(
            RuleSet::load_from_file(&path),
            Err(ConfigError::InvalidJson(_))
        ));
        assert_eq!(RuleSet::load(Some(&path)), RuleSet::defaults());
    }

    #[test]
    fn test_empty_mapping_falls_back_to_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("rules.json");
        fs::write(&path, "{}").expect("Failed to write config");

        assert!(matches!(
            RuleSet::from_json_str("{}"),
            Err(ConfigError::InvalidShape(_))
        ));
        let rules = RuleSet::load(Some(&path));
        assert_eq!(rules, RuleSet::defaults());
        assert_eq!(rules.classify(".jpg"), Category::Named("images"));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("absent.json");

        assert!(matches!(
            RuleSet::load_from_file(&path),
            Err(ConfigError::ConfigNotFound(_))
        ));
        assert_eq!(RuleSet::load(Some(&path)), RuleSet::defaults());
    }

    #[test]
    fn test_valid_file_is_loaded() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("rules.json");
        fs::write(&path, r#"{"books": ["epub"]}"#).expect("Failed to write config");

        let rules = RuleSet::load(Some(&path));
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.classify(".EPUB"), Category::Named("books"));
        assert_eq!(rules.classify(".jpg"), Category::Uncategorized);
    }

    #[test]
    fn test_date_attribute_lenient_parsing() {
        assert_eq!(DateAttribute::parse_lenient("mtime"), DateAttribute::Modified);
        assert_eq!(DateAttribute::parse_lenient("CTIME"), DateAttribute::Changed);
        assert_eq!(DateAttribute::parse_lenient("atime"), DateAttribute::Modified);
        assert_eq!(DateAttribute::parse_lenient(""), DateAttribute::Modified);
    }

    #[test]
    fn test_default_date_format_renders_year_month() {
        let timestamp = Local.with_ymd_and_hms(2024, 3, 9, 10, 30, 0).unwrap();
        let format = DateFormat::default();
        assert_eq!(format.subpath(&timestamp), PathBuf::from("2024").join("03"));
    }

    #[test]
    fn test_date_subpath_stays_relative() {
        let timestamp = Local.with_ymd_and_hms(2023, 4, 1, 8, 0, 0).unwrap();
        let format = DateFormat::parse("/%Y/../%m").unwrap();
        assert_eq!(format.subpath(&timestamp), PathBuf::from("2023").join("04"));
    }

    #[test]
    fn test_invalid_date_format_is_rejected() {
        assert!(matches!(
            DateFormat::parse("%Y/%"),
            Err(ConfigError::InvalidDateFormat(_))
        ));
    }
}
