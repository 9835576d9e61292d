//! File categorization by extension.
//!
//! This module maps file extensions to named categories (e.g., "images",
//! "documents") through an ordered [`RuleSet`]. Lookups are case-insensitive
//! and the first category that claims an extension wins.
//!
//! # Examples
//!
//! ```
//! use sortdir::file_category::{Category, RuleSet};
//!
//! let rules = RuleSet::defaults();
//! assert_eq!(rules.classify(".jpg"), Category::Named("images"));
//! assert_eq!(rules.classify("PDF"), Category::Named("documents"));
//! assert_eq!(rules.classify(".xyz"), Category::Uncategorized);
//! ```

use std::collections::HashSet;

/// Built-in category table, in classification order.
pub const DEFAULT_RULES: &[(&str, &[&str])] = &[
    (
        "images",
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp"],
    ),
    ("documents", &[".pdf", ".doc", ".docx", ".txt", ".odt", ".rtf"]),
    ("spreadsheets", &[".xls", ".xlsx", ".csv", ".ods"]),
    ("archives", &[".zip", ".tar", ".gz", ".rar", ".7z"]),
    ("videos", &[".mp4", ".mkv", ".avi", ".mov", ".wmv"]),
    ("audio", &[".mp3", ".wav", ".flac", ".aac", ".m4a"]),
    (
        "code",
        &[".py", ".js", ".java", ".c", ".cpp", ".go", ".rs", ".ts"],
    ),
];

/// Directory name used for files no category claims.
pub const UNCATEGORIZED_DIR: &str = "others";

/// The outcome of classifying an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category<'a> {
    /// A category from the rule set.
    Named(&'a str),
    /// No category matched.
    Uncategorized,
}

impl Category<'_> {
    /// Returns the subdirectory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::file_category::Category;
    ///
    /// assert_eq!(Category::Named("images").dir_name(), "images");
    /// assert_eq!(Category::Uncategorized.dir_name(), "others");
    /// ```
    pub fn dir_name(&self) -> &str {
        match self {
            Category::Named(name) => *name,
            Category::Uncategorized => UNCATEGORIZED_DIR,
        }
    }
}

/// A single category and the extensions it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRule {
    /// Category name, also used as the destination subfolder.
    pub name: String,
    /// Normalized extensions (lowercase, dot-prefixed).
    pub extensions: HashSet<String>,
}

impl CategoryRule {
    /// Creates a rule, normalizing every extension.
    pub fn new<I, S>(name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
        }
    }

    /// Returns true if this rule owns the given normalized extension.
    pub fn contains(&self, normalized_ext: &str) -> bool {
        self.extensions.contains(normalized_ext)
    }
}

/// Ordered mapping from category name to extensions.
///
/// A `RuleSet` is built once per run and only read afterwards. When an
/// extension appears under more than one category, the category listed
/// first wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<CategoryRule>,
}

impl RuleSet {
    /// Builds the rule set from [`DEFAULT_RULES`].
    pub fn defaults() -> Self {
        Self::from_entries(
            DEFAULT_RULES
                .iter()
                .map(|(name, exts)| (name.to_string(), exts.iter().copied())),
        )
    }

    /// Builds a rule set from `(category, extensions)` pairs, preserving order.
    ///
    /// Extensions are normalized with [`normalize_extension`], so `"JPG"`,
    /// `"jpg"` and `".jpg"` are equivalent.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortdir::file_category::{Category, RuleSet};
    ///
    /// let rules = RuleSet::from_entries(vec![("photos".to_string(), vec!["JPG"])]);
    /// assert_eq!(rules.classify(".jpg"), Category::Named("photos"));
    /// ```
    pub fn from_entries<I, E, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, E)>,
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rules: entries
                .into_iter()
                .map(|(name, exts)| CategoryRule::new(name, exts))
                .collect(),
        }
    }

    /// Returns the rules in classification order.
    pub fn categories(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no categories.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Classifies an extension (with or without the leading dot).
    pub fn classify(&self, extension: &str) -> Category<'_> {
        classify(extension, self)
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Normalizes an extension to lowercase with a leading `.`.
///
/// # Examples
///
/// ```
/// use sortdir::file_category::normalize_extension;
///
/// assert_eq!(normalize_extension("JPG"), ".jpg");
/// assert_eq!(normalize_extension(".Png"), ".png");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    let lower = ext.to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{}", lower)
    }
}

/// Returns the first category in `rules` that owns `extension`.
///
/// The lookup is case-insensitive. An empty extension never matches.
pub fn classify<'a>(extension: &str, rules: &'a RuleSet) -> Category<'a> {
    if extension.is_empty() || extension == "." {
        return Category::Uncategorized;
    }

    let normalized = normalize_extension(extension);
    rules
        .rules
        .iter()
        .find(|rule| rule.contains(&normalized))
        .map(|rule| Category::Named(rule.name.as_str()))
        .unwrap_or(Category::Uncategorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_extension_classifies_to_its_category() {
        let rules = RuleSet::defaults();
        for (category, extensions) in DEFAULT_RULES {
            for ext in *extensions {
                assert_eq!(
                    rules.classify(ext),
                    Category::Named(*category),
                    "extension {} should belong to {}",
                    ext,
                    category
                );
            }
        }
    }

    #[test]
    fn test_default_category_order() {
        let rules = RuleSet::defaults();
        let names: Vec<_> = rules.categories().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "images",
                "documents",
                "spreadsheets",
                "archives",
                "videos",
                "audio",
                "code"
            ]
        );
    }

    #[test]
    fn test_unknown_extension_is_uncategorized() {
        let rules = RuleSet::defaults();
        assert_eq!(rules.classify(".unknownext"), Category::Uncategorized);
        assert_eq!(rules.classify(""), Category::Uncategorized);
        assert_eq!(rules.classify("."), Category::Uncategorized);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let rules = RuleSet::defaults();
        assert_eq!(rules.classify(".JPG"), Category::Named("images"));
        assert_eq!(rules.classify(".Mp3"), Category::Named("audio"));
    }

    #[test]
    fn test_classify_accepts_extension_without_dot() {
        let rules = RuleSet::defaults();
        assert_eq!(rules.classify("zip"), Category::Named("archives"));
    }

    #[test]
    fn test_first_matching_category_wins() {
        let rules = RuleSet::from_entries(vec![
            ("first".to_string(), vec![".dat"]),
            ("second".to_string(), vec![".dat", ".bin"]),
        ]);
        assert_eq!(rules.classify(".dat"), Category::Named("first"));
        assert_eq!(rules.classify(".bin"), Category::Named("second"));
    }

    #[test]
    fn test_uncategorized_dir_name() {
        assert_eq!(Category::Uncategorized.dir_name(), "others");
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("jpg"), ".jpg");
        assert_eq!(normalize_extension(".jpg"), ".jpg");
        assert_eq!(normalize_extension("TAR"), ".tar");
    }
}
