//! Removing registrations written by [`super::registrar`]

use std::path::Path;

use super::{executable_name, extension_key, APPLICATIONS_KEY};
use crate::shell::ShellNotifier;
use crate::store::{ConfigStore, StoreError, StoreKey};

/// Treat a missing key as already removed
fn tolerate_missing(result: Result<(), StoreError>, what: &str) -> Result<(), StoreError> {
    match result {
        Err(err) if err.is_not_found() => {
            tracing::error!("Could not remove {}: {}", what, err);
            Ok(())
        }
        other => other,
    }
}

/// Remove the ProgId branch and the `OpenWithProgids` entry for `ext`, then
/// notify the shell. Missing entries are not an error.
pub fn remove_association<S, N>(
    store: &S,
    notifier: &N,
    ext: &str,
    prog_id: &str,
) -> Result<(), StoreError>
where
    S: ConfigStore,
    N: ShellNotifier + ?Sized,
{
    let result = delete_association(store, ext, prog_id);
    notifier.associations_changed();
    result
}

fn delete_association<S: ConfigStore>(store: &S, ext: &str, prog_id: &str) -> Result<(), StoreError> {
    let root = store.root()?;
    tolerate_missing(root.delete_subkey_all(prog_id), "ProgId branch")?;

    let open_with_path = format!(r"{}\OpenWithProgids", extension_key(ext));
    let open_with = root
        .open_subkey(&open_with_path)
        .and_then(|key| key.delete_value(prog_id));
    tolerate_missing(open_with, "OpenWithProgids entry")?;

    tracing::debug!("Removed association of .{} with {}", ext, prog_id);
    Ok(())
}

/// Delete `Applications\<exe>` if it exists
pub fn unregister_application<S: ConfigStore>(store: &S, executable: &Path) -> Result<(), StoreError> {
    let exe = executable_name(executable);
    let root = store.root()?;

    let apps_key = match root.open_subkey(APPLICATIONS_KEY) {
        Ok(key) => key,
        Err(err) if err.is_not_found() => return Ok(()),
        Err(err) => return Err(err),
    };
    if apps_key.has_subkey(&exe)? {
        apps_key.delete_subkey_all(&exe)?;
        tracing::debug!("Unregistered application {}", exe);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::testing::RecordingNotifier;
    use crate::store::{MemoryStore, RegValue, StoreErrorKind};

    #[test]
    fn test_remove_missing_association_is_not_an_error() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();

        remove_association(&store, &notifier, "epub", "Bookworm.epub").unwrap();
        assert_eq!(notifier.count(), 1);
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_remove_association() {
        let store = MemoryStore::new();
        let root = store.root().unwrap();
        root.create_subkey(r"Bookworm.epub\DefaultIcon").unwrap();
        let open_with = root.create_subkey(r".epub\OpenWithProgids").unwrap();
        open_with.set_value("Bookworm.epub", &RegValue::empty_binary()).unwrap();
        open_with.set_value("Other.epub", &RegValue::empty_binary()).unwrap();
        drop(open_with);
        drop(root);

        let notifier = RecordingNotifier::new();
        remove_association(&store, &notifier, "epub", "Bookworm.epub").unwrap();

        assert!(!store.key_exists("Bookworm.epub"));
        assert!(store.value(r".epub\OpenWithProgids", "Bookworm.epub").is_none());
        assert!(store.value(r".epub\OpenWithProgids", "Other.epub").is_some());
        assert_eq!(notifier.count(), 1);
        assert_eq!(store.open_handles(), 0);
    }

    #[test]
    fn test_remove_association_propagates_other_errors() {
        let store = MemoryStore::new();
        store.root().unwrap().create_subkey("Bookworm.epub").unwrap();
        store.deny_writes("Bookworm.epub");
        let notifier = RecordingNotifier::new();

        let err = remove_association(&store, &notifier, "epub", "Bookworm.epub").unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::PermissionDenied);
        assert_eq!(notifier.count(), 1);
    }

    #[test]
    fn test_unregister_application() {
        let store = MemoryStore::new();
        let root = store.root().unwrap();
        root.create_subkey(r"Applications\bookworm.exe\SupportedTypes").unwrap();
        root.create_subkey(r"Applications\other.exe").unwrap();
        drop(root);

        unregister_application(&store, Path::new("/opt/bookworm/bookworm.exe")).unwrap();
        assert!(!store.key_exists(r"Applications\bookworm.exe"));
        assert!(store.key_exists(r"Applications\other.exe"));
    }

    #[test]
    fn test_unregister_missing_application() {
        let store = MemoryStore::new();
        unregister_application(&store, Path::new("/opt/bookworm/bookworm.exe")).unwrap();

        store.root().unwrap().create_subkey("Applications").unwrap();
        unregister_application(&store, Path::new("/opt/bookworm/bookworm.exe")).unwrap();
        assert!(store.key_exists("Applications"));
    }
}
