//! Resolve the catalog into per-extension registration data

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex_lite::Regex;

use super::catalog::DocumentTypeDescriptor;

/// Which extensions an operation applies to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtensionFilter {
    /// Every extension the catalog declares
    #[default]
    All,
    /// Only these bare extensions
    Only(BTreeSet<String>),
}

/// An extension that cannot be used as a registry key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid file extension: {0:?}")]
pub struct InvalidExtension(pub String);

fn extension_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9_+-]+(\.[a-z0-9_+-]+)*$").expect("extension pattern is valid")
    })
}

fn format_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_+-]+(\.[A-Za-z0-9_+-]+)*$").expect("format pattern is valid")
    })
}

/// Whether a document format can be used as the last part of a ProgId
pub fn is_valid_format(format: &str) -> bool {
    format_pattern().is_match(format)
}

/// Strip wildcards and the leading dot: `*.EPUB` becomes `epub`
pub fn bare_extension(pattern: &str) -> String {
    pattern
        .trim()
        .replace('*', "")
        .trim_start_matches('.')
        .to_lowercase()
}

/// Normalize a user-supplied extension and check it is usable as a key name
pub fn normalize_extension(value: &str) -> Result<String, InvalidExtension> {
    let bare = bare_extension(value);
    if extension_pattern().is_match(&bare) {
        Ok(bare)
    } else {
        Err(InvalidExtension(value.to_string()))
    }
}

impl ExtensionFilter {
    /// Parse a list of extensions; an empty list or `*` selects everything
    pub fn parse<I, S>(items: I) -> Result<Self, InvalidExtension>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions = BTreeSet::new();
        for item in items {
            let item = item.as_ref();
            if item.trim() == "*" {
                return Ok(Self::All);
            }
            extensions.insert(normalize_extension(item)?);
        }

        if extensions.is_empty() {
            Ok(Self::All)
        } else {
            Ok(Self::Only(extensions))
        }
    }

    /// Whether a bare extension passes the filter
    pub fn matches(&self, extension: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(extensions) => extensions.contains(extension),
        }
    }
}

impl fmt::Display for ExtensionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "*"),
            Self::Only(extensions) => {
                let list: Vec<&str> = extensions.iter().map(String::as_str).collect();
                write!(f, "{}", list.join(", "))
            }
        }
    }
}

/// Registration data for one extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub prog_id: String,
    pub description: String,
    pub icon_path: Option<PathBuf>,
}

/// Maps catalog entries to [`ExtensionInfo`] records
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    prog_id_prefix: String,
    icon_dir: PathBuf,
}

impl CatalogResolver {
    pub fn new(prog_id_prefix: impl Into<String>, icon_dir: impl Into<PathBuf>) -> Self {
        Self {
            prog_id_prefix: prog_id_prefix.into(),
            icon_dir: icon_dir.into(),
        }
    }

    /// `<prefix>.<format>`
    pub fn prog_id(&self, format: &str) -> String {
        format!("{}.{}", self.prog_id_prefix, format)
    }

    /// Build the extension mapping for every catalog entry passing `filter`.
    ///
    /// Extensions in the filter that no entry declares are left out. When two
    /// entries declare the same extension the later one wins. Entries whose
    /// format or pattern cannot be a key name are skipped.
    pub fn resolve<'a, D, I>(&self, classes: I, filter: &ExtensionFilter) -> BTreeMap<String, ExtensionInfo>
    where
        D: DocumentTypeDescriptor + 'a,
        I: IntoIterator<Item = &'a D>,
    {
        let mut doctypes = BTreeMap::new();

        for class in classes {
            if !is_valid_format(class.format()) {
                tracing::warn!("Skipping document type with invalid format {:?}", class.format());
                continue;
            }

            for pattern in class.extensions() {
                let ext = match normalize_extension(pattern) {
                    Ok(ext) => ext,
                    Err(err) => {
                        tracing::warn!("Skipping pattern of {}: {}", class.format(), err);
                        continue;
                    }
                };
                if !filter.matches(&ext) {
                    continue;
                }

                let icon = self.icon_dir.join(format!("{}.ico", class.format()));
                let info = ExtensionInfo {
                    prog_id: self.prog_id(class.format()),
                    description: class.name().to_string(),
                    icon_path: icon.exists().then_some(icon),
                };
                doctypes.insert(ext, info);
            }
        }

        doctypes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Catalog, DocumentClass};

    fn catalog() -> Catalog {
        Catalog::from_classes(vec![
            DocumentClass::new("epub", "EPUB Book", ["*.epub"]),
            DocumentClass::new("html", "HTML Document", ["*.html", "*.htm"]),
        ])
    }

    #[test]
    fn test_bare_extension() {
        assert_eq!(bare_extension("*.epub"), "epub");
        assert_eq!(bare_extension(".HTM"), "htm");
        assert_eq!(bare_extension("*.tar.gz"), "tar.gz");
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(ExtensionFilter::parse(Vec::<String>::new()).unwrap(), ExtensionFilter::All);
        assert_eq!(ExtensionFilter::parse(["epub", "*"]).unwrap(), ExtensionFilter::All);

        let filter = ExtensionFilter::parse([".EPUB", "*.pdf"]).unwrap();
        assert_eq!(
            filter,
            ExtensionFilter::Only(["epub", "pdf"].iter().map(|s| s.to_string()).collect())
        );
        assert_eq!(filter.to_string(), "epub, pdf");
    }

    #[test]
    fn test_parse_rejects_bad_extensions() {
        assert!(ExtensionFilter::parse(["ep ub"]).is_err());
        assert!(ExtensionFilter::parse([r"..\evil"]).is_err());
        assert!(ExtensionFilter::parse(["."]).is_err());
    }

    #[test]
    fn test_resolve_all() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = CatalogResolver::new("Bookworm", dir.path());
        let doctypes = resolver.resolve(catalog().classes(), &ExtensionFilter::All);

        let keys: Vec<_> = doctypes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["epub", "htm", "html"]);
        assert_eq!(doctypes["htm"].prog_id, "Bookworm.html");
        assert_eq!(doctypes["htm"].prog_id, doctypes["html"].prog_id);
    }

    #[test]
    fn test_resolve_filter_containment() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = CatalogResolver::new("Bookworm", dir.path());
        let filter = ExtensionFilter::parse(["html", "docx"]).unwrap();

        let doctypes = resolver.resolve(catalog().classes(), &filter);
        let keys: Vec<_> = doctypes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["html"]);
    }

    #[test]
    fn test_resolve_picks_up_icons() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("html.ico"), b"icon").unwrap();
        let resolver = CatalogResolver::new("Bookworm", dir.path());

        let doctypes = resolver.resolve(catalog().classes(), &ExtensionFilter::All);
        assert_eq!(doctypes["html"].icon_path, Some(dir.path().join("html.ico")));
        assert_eq!(doctypes["epub"].icon_path, None);
    }

    #[test]
    fn test_resolve_later_class_wins_duplicate_extension() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = CatalogResolver::new("Bookworm", dir.path());
        let catalog = Catalog::from_classes(vec![
            DocumentClass::new("txt", "Plain Text File", ["*.txt"]),
            DocumentClass::new("markdown", "Markdown File", ["*.md", "*.txt"]),
        ]);

        let doctypes = resolver.resolve(catalog.classes(), &ExtensionFilter::All);
        assert_eq!(doctypes.len(), 2);
        assert_eq!(doctypes["txt"].prog_id, "Bookworm.markdown");
        assert_eq!(doctypes["txt"].description, "Markdown File");
    }

    #[test]
    fn test_resolve_skips_unusable_key_names() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = CatalogResolver::new("Bookworm", dir.path());
        let catalog = Catalog::from_classes(vec![
            DocumentClass::new("epub", "EPUB Book", ["*.ep ub", r"*.a\b", "*.epub"]),
            DocumentClass::new(r"html\..", "HTML Document", ["*.html"]),
        ]);

        let doctypes = resolver.resolve(catalog.classes(), &ExtensionFilter::All);
        let keys: Vec<_> = doctypes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["epub"]);
    }

    #[test]
    fn test_format_validation() {
        assert!(is_valid_format("epub"));
        assert!(is_valid_format("Comic.Book"));
        assert!(!is_valid_format(r"epub\shell"));
        assert!(!is_valid_format("e pub"));
        assert!(!is_valid_format(""));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = CatalogResolver::new("Bookworm", dir.path());
        let first = resolver.resolve(catalog().classes(), &ExtensionFilter::All);
        let second = resolver.resolve(catalog().classes(), &ExtensionFilter::All);
        assert_eq!(first, second);
    }
}
