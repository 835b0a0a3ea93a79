//! Document types the application can open

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::resolver::{is_valid_format, normalize_extension};

/// Something that describes a document type the application handles
pub trait DocumentTypeDescriptor {
    /// Stable short name, used to build the ProgId and find the icon
    fn format(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Extension patterns, e.g. `*.epub`
    fn extensions(&self) -> &[String];
}

/// A document type declared in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentClass {
    pub format: String,
    pub name: String,
    pub extensions: Vec<String>,
}

impl DocumentClass {
    /// Create a new document class
    pub fn new<I, S>(format: impl Into<String>, name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            format: format.into(),
            name: name.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
        }
    }
}

impl DocumentTypeDescriptor for DocumentClass {
    fn format(&self) -> &str {
        &self.format
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

/// The set of document types known to the application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    classes: Vec<DocumentClass>,
}

impl Catalog {
    /// Build a catalog from explicit classes
    pub fn from_classes(classes: Vec<DocumentClass>) -> Self {
        Self { classes }
    }

    /// Document types an e-book reader opens out of the box
    pub fn builtin() -> Self {
        Self::from_classes(vec![
            DocumentClass::new("epub", "Electronic Publication", ["*.epub"]),
            DocumentClass::new("pdf", "Portable Document Format", ["*.pdf"]),
            DocumentClass::new("txt", "Plain Text File", ["*.txt"]),
            DocumentClass::new("html", "HTML Document", ["*.html", "*.htm"]),
            DocumentClass::new("markdown", "Markdown File", ["*.md"]),
            DocumentClass::new("docx", "Word Document", ["*.docx"]),
            DocumentClass::new("fb2", "FictionBook", ["*.fb2"]),
            DocumentClass::new("mobi", "Kindle eBook", ["*.mobi", "*.azw3"]),
        ])
    }

    /// Load a catalog from a JSON array of document classes
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog: {}", path.display()))?;
        let catalog: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))?;
        catalog
            .validate()
            .with_context(|| format!("Invalid catalog: {}", path.display()))?;

        tracing::info!(
            "Loaded {} document types from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Check every format and extension pattern can be used as a registry key name
    pub fn validate(&self) -> Result<()> {
        for class in &self.classes {
            if !is_valid_format(&class.format) {
                anyhow::bail!("invalid document format {:?}", class.format);
            }
            for pattern in &class.extensions {
                normalize_extension(pattern)
                    .with_context(|| format!("in document format {}", class.format))?;
            }
        }
        Ok(())
    }

    pub fn classes(&self) -> &[DocumentClass] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
