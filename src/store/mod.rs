//! Configuration store access
//!
//! The association logic talks to the persistent store through [`ConfigStore`]
//! and scoped [`StoreKey`] handles. A handle is released when it is dropped, so
//! every exit path of an operation closes the keys it opened.

pub mod memory;
#[cfg(windows)]
pub mod windows;

use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;
#[cfg(windows)]
pub use self::windows::WindowsRegistry;

/// A value stored under a key, tagged with its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RegValue {
    /// String value (`REG_SZ`)
    String(String),
    /// Binary value (`REG_BINARY`)
    Binary(Vec<u8>),
}

impl RegValue {
    /// Create a string value
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// The zero-length binary marker
    pub fn empty_binary() -> Self {
        Self::Binary(Vec::new())
    }
}

/// Coarse classification of a store failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The key or value does not exist
    NotFound,
    /// The caller may not modify the key
    PermissionDenied,
    /// Anything else reported by the backend
    Other,
}

/// Errors raised by a configuration store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("registry key or value not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    PermissionDenied(String),

    #[error("registry operation on {path} failed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Classify an I/O error reported for `path`
    pub fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }

    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::NotFound(_) => StoreErrorKind::NotFound,
            Self::PermissionDenied(_) => StoreErrorKind::PermissionDenied,
            Self::Io { .. } => StoreErrorKind::Other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == StoreErrorKind::NotFound
    }
}

/// An open key in the configuration store
///
/// Paths are relative to the key and use `\` as separator.
pub trait StoreKey: Sized {
    /// Path of this key relative to the store root
    fn path(&self) -> &str;

    /// Open a subkey, creating any missing keys along the way
    fn create_subkey(&self, path: &str) -> Result<Self, StoreError>;

    /// Open an existing subkey; fails with [`StoreError::NotFound`] if absent
    fn open_subkey(&self, path: &str) -> Result<Self, StoreError>;

    /// Set a named value; the empty name addresses the key's default value
    fn set_value(&self, name: &str, value: &RegValue) -> Result<(), StoreError>;

    /// Delete a subkey and everything below it
    fn delete_subkey_all(&self, path: &str) -> Result<(), StoreError>;

    /// Delete a named value
    fn delete_value(&self, name: &str) -> Result<(), StoreError>;

    /// Check whether a subkey exists
    fn has_subkey(&self, path: &str) -> Result<bool, StoreError> {
        match self.open_subkey(path) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// A configuration store rooted at the application-local software branch
pub trait ConfigStore {
    type Key: StoreKey;

    /// Open the root key of the store
    fn root(&self) -> Result<Self::Key, StoreError>;
}

/// Split a `\`-separated key path into its components
pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('\\').filter(|segment| !segment.is_empty())
}

/// Join a parent key path and a relative subkey path
pub(crate) fn join_path(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => parent.to_string(),
        _ => format!(r"{}\{}", parent, child),
    }
}
