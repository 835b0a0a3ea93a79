//! Windows registry backend

use winreg::enums::{RegType, HKEY_CURRENT_USER, KEY_ALL_ACCESS};
use winreg::RegKey;

use super::{join_path, ConfigStore, RegValue, StoreError, StoreKey};

/// Per-user class registrations; no elevation needed
const CURRENT_USER_CLASSES: &str = r"Software\Classes";

/// Registry branch the associations are written to
pub struct WindowsRegistry {
    root_path: String,
}

impl Default for WindowsRegistry {
    fn default() -> Self {
        Self::current_user()
    }
}

impl WindowsRegistry {
    /// `HKEY_CURRENT_USER\Software\Classes`
    pub fn current_user() -> Self {
        Self {
            root_path: CURRENT_USER_CLASSES.to_string(),
        }
    }
}

impl ConfigStore for WindowsRegistry {
    type Key = WindowsKey;

    fn root(&self) -> Result<WindowsKey, StoreError> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (key, _) = hkcu
            .create_subkey(&self.root_path)
            .map_err(|e| StoreError::from_io(&self.root_path, e))?;
        Ok(WindowsKey {
            key,
            path: String::new(),
        })
    }
}

/// Open registry key; the handle is closed when dropped
pub struct WindowsKey {
    key: RegKey,
    path: String,
}

impl StoreKey for WindowsKey {
    fn path(&self) -> &str {
        &self.path
    }

    fn create_subkey(&self, path: &str) -> Result<Self, StoreError> {
        let full = join_path(&self.path, path);
        let (key, _) = self
            .key
            .create_subkey(path)
            .map_err(|e| StoreError::from_io(&full, e))?;
        Ok(Self { key, path: full })
    }

    fn open_subkey(&self, path: &str) -> Result<Self, StoreError> {
        let full = join_path(&self.path, path);
        let key = self
            .key
            .open_subkey_with_flags(path, KEY_ALL_ACCESS)
            .map_err(|e| StoreError::from_io(&full, e))?;
        Ok(Self { key, path: full })
    }

    fn set_value(&self, name: &str, value: &RegValue) -> Result<(), StoreError> {
        let result = match value {
            RegValue::String(text) => self.key.set_value(name, text),
            RegValue::Binary(bytes) => self.key.set_raw_value(
                name,
                &winreg::RegValue {
                    bytes: bytes.clone(),
                    vtype: RegType::REG_BINARY,
                },
            ),
        };
        result.map_err(|e| StoreError::from_io(join_path(&self.path, name), e))
    }

    fn delete_subkey_all(&self, path: &str) -> Result<(), StoreError> {
        self.key
            .delete_subkey_all(path)
            .map_err(|e| StoreError::from_io(join_path(&self.path, path), e))
    }

    fn delete_value(&self, name: &str) -> Result<(), StoreError> {
        self.key
            .delete_value(name)
            .map_err(|e| StoreError::from_io(join_path(&self.path, name), e))
    }
}
