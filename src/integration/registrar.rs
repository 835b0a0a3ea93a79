//! Writing the application and per-extension registrations

use std::path::Path;

use super::{executable_name, extension_key, open_command, APPLICATIONS_KEY, OPEN_COMMAND_KEY};
use crate::core::resolver::ExtensionInfo;
use crate::shell::ShellNotifier;
use crate::store::{ConfigStore, RegValue, StoreError, StoreKey};

/// Write the open command under `key`
fn add_shell_command<K: StoreKey>(key: &K, executable: &Path) -> Result<(), StoreError> {
    let command_key = key.create_subkey(OPEN_COMMAND_KEY)?;
    command_key.set_value("", &RegValue::string(open_command(executable)))
}

/// Register the executable as a known application and list the extensions it
/// supports under `Applications\<exe>\SupportedTypes`
pub fn register_application<'a, S, I>(
    store: &S,
    executable: &Path,
    extensions: I,
) -> Result<(), StoreError>
where
    S: ConfigStore,
    I: IntoIterator<Item = &'a str>,
{
    let exe = executable_name(executable);
    let root = store.root()?;
    let exe_key = root.create_subkey(&format!(r"{}\{}", APPLICATIONS_KEY, exe))?;
    add_shell_command(&exe_key, executable)?;

    let supported = exe_key.create_subkey("SupportedTypes")?;
    for ext in extensions {
        supported.set_value(&extension_key(ext), &RegValue::string(""))?;
    }

    tracing::debug!("Registered application {}", exe);
    Ok(())
}

/// Make the application the handler for `ext`, then notify the shell.
///
/// The notification is sent even when one of the writes failed; the first
/// failure is returned afterwards.
pub fn associate_extension<S, N>(
    store: &S,
    notifier: &N,
    ext: &str,
    info: &ExtensionInfo,
    executable: &Path,
) -> Result<(), StoreError>
where
    S: ConfigStore,
    N: ShellNotifier + ?Sized,
{
    let result = write_association(store, ext, info, executable);
    notifier.associations_changed();
    result
}

fn write_association<S: ConfigStore>(
    store: &S,
    ext: &str,
    info: &ExtensionInfo,
    executable: &Path,
) -> Result<(), StoreError> {
    let root = store.root()?;

    {
        let prog_key = root.create_subkey(&info.prog_id)?;
        prog_key.set_value("", &RegValue::string(info.description.as_str()))?;

        let icon = info.icon_path.as_deref().unwrap_or(executable);
        let icon_key = prog_key.create_subkey("DefaultIcon")?;
        icon_key.set_value("", &RegValue::string(icon.display().to_string()))?;

        add_shell_command(&prog_key, executable)?;
    }

    let ext_key = extension_key(ext);
    {
        let open_with = root.create_subkey(&format!(r"{}\OpenWithProgids", ext_key))?;
        open_with.set_value(&info.prog_id, &RegValue::empty_binary())?;
    }

    // Default handler for the extension
    let default_key = root.create_subkey(&ext_key)?;
    default_key.set_value("", &RegValue::string(info.prog_id.as_str()))?;

    tracing::debug!("Associated {} with {}", ext_key, info.prog_id);
    Ok(())
}
