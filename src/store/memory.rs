//! In-process configuration store
//!
//! Mirrors the registry's key/value tree. Used for dry runs (persisted as JSON)
//! and as the backend the association logic is tested against.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{join_path, split_path, ConfigStore, RegValue, StoreError, StoreKey};

/// A key in the in-memory tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryNode {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, RegValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, MemoryNode>,
}

impl MemoryNode {
    fn find(&self, segments: &[&str]) -> Option<&MemoryNode> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.children.get(*segment))
    }

    fn find_mut(&mut self, segments: &[&str]) -> Option<&mut MemoryNode> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.children.get_mut(*segment))
    }

    fn find_or_create(&mut self, segments: &[&str]) -> &mut MemoryNode {
        segments.iter().fold(self, |node, segment| {
            node.children.entry(segment.to_string()).or_default()
        })
    }

    /// Number of keys below this one
    pub fn key_count(&self) -> usize {
        self.children
            .values()
            .map(|child| 1 + child.key_count())
            .sum()
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    root: MemoryNode,
    writes: usize,
    open_handles: usize,
    denied: BTreeSet<String>,
}

impl MemoryState {
    /// Reject mutations below a denied path
    fn check_writable(&self, path: &str) -> Result<(), StoreError> {
        let target: Vec<&str> = split_path(path).collect();
        let blocked = self.denied.iter().any(|denied| {
            let prefix: Vec<&str> = split_path(denied).collect();
            target.starts_with(&prefix)
        });
        if blocked {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
        Ok(())
    }
}

/// Configuration store held in memory
///
/// Cloning yields another handle to the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Rc<RefCell<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from an existing tree
    pub fn from_tree(root: MemoryNode) -> Self {
        let store = Self::new();
        store.state.borrow_mut().root = root;
        store
    }

    /// Load a store persisted with [`MemoryStore::save`], or an empty one if the
    /// file does not exist yet
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store file: {}", path.display()))?;
        let root: MemoryNode = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse store file: {}", path.display()))?;
        Ok(Self::from_tree(root))
    }

    /// Persist the tree as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.state.borrow().root)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write store file: {}", path.display()))?;

        tracing::info!("Saved store to: {}", path.display());
        Ok(())
    }

    /// Copy of the whole tree
    pub fn snapshot(&self) -> MemoryNode {
        self.state.borrow().root.clone()
    }

    /// Whether a key exists at `path`
    pub fn key_exists(&self, path: &str) -> bool {
        let segments: Vec<&str> = split_path(path).collect();
        self.state.borrow().root.find(&segments).is_some()
    }

    /// Read a value; the empty name is the default value
    pub fn value(&self, path: &str, name: &str) -> Option<RegValue> {
        let segments: Vec<&str> = split_path(path).collect();
        self.state
            .borrow()
            .root
            .find(&segments)
            .and_then(|node| node.values.get(name).cloned())
    }

    /// Make every mutation at or below `path` fail with access denied
    pub fn deny_writes(&self, path: &str) {
        self.state.borrow_mut().denied.insert(path.to_string());
    }

    /// Number of mutating calls made so far
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    /// Number of key handles currently open
    pub fn open_handles(&self) -> usize {
        self.state.borrow().open_handles
    }

    fn handle(&self, path: String) -> MemoryKey {
        self.state.borrow_mut().open_handles += 1;
        MemoryKey {
            state: Rc::clone(&self.state),
            path,
        }
    }
}

impl ConfigStore for MemoryStore {
    type Key = MemoryKey;

    fn root(&self) -> Result<MemoryKey, StoreError> {
        Ok(self.handle(String::new()))
    }
}

/// Open key in a [`MemoryStore`]
#[derive(Debug)]
pub struct MemoryKey {
    state: Rc<RefCell<MemoryState>>,
    path: String,
}

impl MemoryKey {
    fn child(&self, path: String) -> MemoryKey {
        self.state.borrow_mut().open_handles += 1;
        MemoryKey {
            state: Rc::clone(&self.state),
            path,
        }
    }
}

impl Drop for MemoryKey {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.open_handles = state.open_handles.saturating_sub(1);
    }
}

impl StoreKey for MemoryKey {
    fn path(&self) -> &str {
        &self.path
    }

    fn create_subkey(&self, path: &str) -> Result<Self, StoreError> {
        let full = join_path(&self.path, path);
        {
            let mut state = self.state.borrow_mut();
            let segments: Vec<&str> = split_path(&full).collect();
            if state.root.find(&segments).is_none() {
                state.check_writable(&full)?;
                state.writes += 1;
                state.root.find_or_create(&segments);
            }
        }
        Ok(self.child(full))
    }

    fn open_subkey(&self, path: &str) -> Result<Self, StoreError> {
        let full = join_path(&self.path, path);
        let exists = {
            let segments: Vec<&str> = split_path(&full).collect();
            self.state.borrow().root.find(&segments).is_some()
        };
        if !exists {
            return Err(StoreError::NotFound(full));
        }
        Ok(self.child(full))
    }

    fn set_value(&self, name: &str, value: &RegValue) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        state.check_writable(&self.path)?;
        let segments: Vec<&str> = split_path(&self.path).collect();
        let node = state
            .root
            .find_mut(&segments)
            .ok_or_else(|| StoreError::NotFound(self.path.clone()))?;
        node.values.insert(name.to_string(), value.clone());
        state.writes += 1;
        Ok(())
    }

    fn delete_subkey_all(&self, path: &str) -> Result<(), StoreError> {
        let full = join_path(&self.path, path);
        let mut state = self.state.borrow_mut();
        state.check_writable(&full)?;
        let segments: Vec<&str> = split_path(&full).collect();
        let Some((leaf, parent)) = segments.split_last() else {
            return Err(StoreError::NotFound(full));
        };
        let removed = state
            .root
            .find_mut(parent)
            .and_then(|node| node.children.remove(*leaf));
        if removed.is_none() {
            return Err(StoreError::NotFound(full));
        }
        state.writes += 1;
        Ok(())
    }

    fn delete_value(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.state.borrow_mut();
        state.check_writable(&self.path)?;
        let segments: Vec<&str> = split_path(&self.path).collect();
        let removed = state
            .root
            .find_mut(&segments)
            .and_then(|node| node.values.remove(name));
        if removed.is_none() {
            return Err(StoreError::NotFound(join_path(&self.path, name)));
        }
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreErrorKind;

    #[test]
    fn test_create_and_set_value() {
        let store = MemoryStore::new();
        let root = store.root().unwrap();
        let key = root.create_subkey(r"Applications\app.exe").unwrap();
        key.set_value("", &RegValue::string("hello")).unwrap();

        assert!(store.key_exists("Applications"));
        assert_eq!(
            store.value(r"Applications\app.exe", ""),
            Some(RegValue::string("hello"))
        );
        assert_eq!(key.path(), r"Applications\app.exe");
    }

    #[test]
    fn test_missing_keys_report_not_found() {
        let store = MemoryStore::new();
        let root = store.root().unwrap();

        assert!(root.open_subkey("missing").unwrap_err().is_not_found());
        assert!(root.delete_subkey_all("missing").unwrap_err().is_not_found());
        assert!(root.delete_value("missing").unwrap_err().is_not_found());
        assert!(!root.has_subkey("missing").unwrap());
    }

    #[test]
    fn test_delete_subkey_all_removes_tree() {
        let store = MemoryStore::new();
        let root = store.root().unwrap();
        root.create_subkey(r"Prog.epub\shell\Open\Command").unwrap();
        root.create_subkey("Other").unwrap();

        root.delete_subkey_all("Prog.epub").unwrap();
        assert!(!store.key_exists("Prog.epub"));
        assert!(store.key_exists("Other"));
    }

    #[test]
    fn test_denied_writes() {
        let store = MemoryStore::new();
        store.deny_writes("Locked");
        let root = store.root().unwrap();

        let err = root.create_subkey(r"Locked\Child").unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::PermissionDenied);
        assert!(root.create_subkey("LockedOut").is_ok());
    }

    #[test]
    fn test_handles_are_released_on_drop() {
        let store = MemoryStore::new();
        {
            let root = store.root().unwrap();
            let _child = root.create_subkey("a").unwrap();
            assert_eq!(store.open_handles(), 2);
        }
        assert_eq!(store.open_handles(), 0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::new();
        let key = store.root().unwrap().create_subkey(r"epub\OpenWithProgids").unwrap();
        key.set_value("Docassoc.epub", &RegValue::empty_binary()).unwrap();
        drop(key);
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.snapshot(), store.snapshot());
        assert_eq!(loaded.snapshot().key_count(), 2);
    }
}
