//! Shell change notification

/// Tells the desktop shell that file associations changed
pub trait ShellNotifier {
    /// Fire-and-forget; the shell re-reads associations
    fn associations_changed(&self);
}

/// Notifier for platforms without a shell to notify
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ShellNotifier for NoopNotifier {
    fn associations_changed(&self) {
        tracing::debug!("Skipping shell notification: no shell on this platform");
    }
}

/// Sends `SHCNE_ASSOCCHANGED` to the Windows shell
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsShellNotifier;

#[cfg(windows)]
impl ShellNotifier for WindowsShellNotifier {
    fn associations_changed(&self) {
        use windows_sys::Win32::UI::Shell::{SHChangeNotify, SHCNE_ASSOCCHANGED, SHCNF_IDLIST};

        // SAFETY: both item pointers may be null for SHCNE_ASSOCCHANGED
        unsafe {
            SHChangeNotify(
                SHCNE_ASSOCCHANGED,
                SHCNF_IDLIST,
                std::ptr::null(),
                std::ptr::null(),
            );
        }
        tracing::debug!("Notified shell of association change");
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;

    #[test]
    fn test_recording_notifier_counts() {
        let notifier = RecordingNotifier::new();
        notifier.associations_changed();
        notifier.associations_changed();
        assert_eq!(notifier.count(), 2);
    }

    #[test]
    fn test_noop_notifier_is_silent() {
        NoopNotifier.associations_changed();
    }
}
