//! Shell integration: registering and removing file associations
//!
//! [`ShellIntegration`] is the entry point. Both of its operations are best
//! effort: failures are logged and reported as [`IntegrationOutcome::Failed`],
//! never returned as errors. Writes made before a failure are left in place.
//!
//! Calls touching the same store must not run concurrently.

pub mod registrar;
pub mod removal;

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::catalog::Catalog;
use crate::core::environment::Environment;
use crate::core::resolver::{CatalogResolver, ExtensionFilter};
use crate::shell::ShellNotifier;
use crate::store::ConfigStore;

pub use registrar::{associate_extension, register_application};
pub use removal::{remove_association, unregister_application};

pub(crate) const APPLICATIONS_KEY: &str = "Applications";
pub(crate) const OPEN_COMMAND_KEY: &str = r"shell\Open\Command";

/// Key name of a bare extension: `epub` becomes `.epub`
pub fn extension_key(ext: &str) -> String {
    format!(".{}", ext)
}

/// `"<exe>" "%1"`
pub fn open_command(executable: &Path) -> String {
    format!("\"{}\" \"%1\"", executable.display())
}

/// Final path segment of the executable
pub fn executable_name(executable: &Path) -> String {
    executable
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| executable.to_string_lossy().to_string())
}

/// How an integration call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationOutcome {
    /// Not a packaged build; the store was not touched
    Skipped,
    /// Every step succeeded
    Completed,
    /// A step failed and the rest of the batch was abandoned
    Failed,
}

/// Run `operation`, logging and swallowing any error or panic it raises
pub fn best_effort<F>(description: &str, operation: F) -> IntegrationOutcome
where
    F: FnOnce() -> Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(operation)) {
        Ok(Ok(())) => IntegrationOutcome::Completed,
        Ok(Err(err)) => {
            tracing::error!("Failed to {}: {:#}", description, err);
            IntegrationOutcome::Failed
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Failed to {}: panicked: {}", description, message);
            IntegrationOutcome::Failed
        }
    }
}

/// Registers and removes the application's file associations
pub struct ShellIntegration<'a, S, N: ?Sized> {
    store: &'a S,
    notifier: &'a N,
    catalog: &'a Catalog,
    resolver: CatalogResolver,
    env: Environment,
}

impl<'a, S, N> ShellIntegration<'a, S, N>
where
    S: ConfigStore,
    N: ShellNotifier + ?Sized,
{
    pub fn new(
        store: &'a S,
        notifier: &'a N,
        catalog: &'a Catalog,
        resolver: CatalogResolver,
        env: Environment,
    ) -> Self {
        Self {
            store,
            notifier,
            catalog,
            resolver,
            env,
        }
    }

    pub fn resolver(&self) -> &CatalogResolver {
        &self.resolver
    }

    /// Register the application and associate every extension in `filter`
    pub fn shell_integrate(&self, filter: &ExtensionFilter) -> IntegrationOutcome {
        if !self.env.packaged {
            tracing::warn!("File association is not available when running from source");
            return IntegrationOutcome::Skipped;
        }
        best_effort("register file associations", || self.integrate(filter))
    }

    /// Remove the application and every association in `filter`
    pub fn shell_disintegrate(&self, filter: &ExtensionFilter) -> IntegrationOutcome {
        if !self.env.packaged {
            tracing::warn!("File association is not available when running from source");
            return IntegrationOutcome::Skipped;
        }
        best_effort("unregister file associations", || self.disintegrate(filter))
    }

    fn integrate(&self, filter: &ExtensionFilter) -> Result<()> {
        tracing::info!("Registering file associations for extensions {}", filter);
        let executable = self.env.executable.as_path();
        let doctypes = self.resolver.resolve(self.catalog.classes(), filter);

        register_application(self.store, executable, doctypes.keys().map(String::as_str))
            .context("registering the application")?;

        for (ext, info) in &doctypes {
            associate_extension(self.store, self.notifier, ext, info, executable)
                .with_context(|| format!("associating .{} with {}", ext, info.prog_id))?;
        }

        tracing::info!("Registered {} file associations", doctypes.len());
        Ok(())
    }

    fn disintegrate(&self, filter: &ExtensionFilter) -> Result<()> {
        tracing::info!("Unregistering file associations for extensions {}", filter);
        let executable = self.env.executable.as_path();

        unregister_application(self.store, executable)
            .context("unregistering the application")?;

        let doctypes = self.resolver.resolve(self.catalog.classes(), filter);
        for (ext, info) in &doctypes {
            remove_association(self.store, self.notifier, ext, &info.prog_id)
                .with_context(|| format!("removing association of .{}", ext))?;
        }

        tracing::info!("Removed {} file associations", doctypes.len());
        Ok(())
    }
}
