//! Docassoc - document file-type associations for desktop applications
//!
//! Registers an application as the handler for the document types it can open,
//! publishes per-extension metadata into the system configuration store, and
//! removes those registrations again on demand.

pub mod core;
pub mod integration;
pub mod shell;
pub mod store;

pub use crate::core::catalog::{Catalog, DocumentClass, DocumentTypeDescriptor};
pub use crate::core::config::AppConfig;
pub use crate::core::environment::Environment;
pub use crate::core::resolver::{CatalogResolver, ExtensionFilter, ExtensionInfo};
pub use crate::integration::{IntegrationOutcome, ShellIntegration};
pub use crate::shell::ShellNotifier;
pub use crate::store::{ConfigStore, RegValue, StoreError, StoreErrorKind, StoreKey};
