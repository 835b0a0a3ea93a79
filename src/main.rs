//! Docassoc - register an application's document file associations
//!
//! Writes to the system registry on Windows. `--store <FILE>` swaps in a JSON
//! file so the produced layout can be inspected on any platform.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docassoc::core::resolver::InvalidExtension;
use docassoc::shell::NoopNotifier;
use docassoc::store::MemoryStore;
use docassoc::{
    AppConfig, Catalog, CatalogResolver, ConfigStore, Environment, ExtensionFilter,
    ShellIntegration, ShellNotifier,
};

#[derive(Debug, Parser)]
#[command(name = "docassoc", version, about = "Manage document file associations")]
struct Cli {
    /// Use a JSON file as the configuration store instead of the system registry
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// JSON catalog of document types
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Treat the running executable as an installed build
    #[arg(long, global = true)]
    packaged: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register the application as handler for the given extensions (all by default)
    Integrate { extensions: Vec<String> },
    /// Remove the application's registrations
    Disintegrate { extensions: Vec<String> },
    /// Print the registration data for the given extensions
    List { extensions: Vec<String> },
}

impl Command {
    fn extensions(&self) -> &[String] {
        match self {
            Self::Integrate { extensions }
            | Self::Disintegrate { extensions }
            | Self::List { extensions } => extensions,
        }
    }

    fn modifies_store(&self) -> bool {
        !matches!(self, Self::List { .. })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(level)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let catalog = match cli.catalog.as_ref().or(config.catalog_path.as_ref()) {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin(),
    };

    let packaged = if cli.packaged { Some(true) } else { config.packaged };
    let env = Environment::detect(packaged)?;
    let resolver = CatalogResolver::new(
        config.prog_id_prefix.clone(),
        config.get_icon_dir(&env.executable),
    );
    let filter = parse_filter(cli.command.extensions(), &config)?;

    match cli.store {
        Some(ref path) => {
            let store = MemoryStore::load(path)?;
            run(&cli.command, &store, &NoopNotifier, &catalog, resolver, env, &filter);
            if cli.command.modifies_store() {
                store.save(path)?;
            }
        }
        None => run_system(&cli.command, &catalog, resolver, env, &filter)?,
    }

    Ok(())
}

/// Extensions from the command line, falling back to the configured list
fn parse_filter(extensions: &[String], config: &AppConfig) -> Result<ExtensionFilter, InvalidExtension> {
    if extensions.is_empty() {
        ExtensionFilter::parse(&config.extensions)
    } else {
        ExtensionFilter::parse(extensions)
    }
}

#[cfg(windows)]
fn run_system(
    command: &Command,
    catalog: &Catalog,
    resolver: CatalogResolver,
    env: Environment,
    filter: &ExtensionFilter,
) -> Result<()> {
    use docassoc::shell::WindowsShellNotifier;
    use docassoc::store::WindowsRegistry;

    let store = WindowsRegistry::current_user();
    run(command, &store, &WindowsShellNotifier, catalog, resolver, env, filter);
    Ok(())
}

#[cfg(not(windows))]
fn run_system(
    _command: &Command,
    _catalog: &Catalog,
    _resolver: CatalogResolver,
    _env: Environment,
    _filter: &ExtensionFilter,
) -> Result<()> {
    anyhow::bail!("No system registry on this platform; pass --store <FILE>")
}

fn run<S: ConfigStore>(
    command: &Command,
    store: &S,
    notifier: &dyn ShellNotifier,
    catalog: &Catalog,
    resolver: CatalogResolver,
    env: Environment,
    filter: &ExtensionFilter,
) {
    let integration = ShellIntegration::new(store, notifier, catalog, resolver, env);

    match command {
        Command::Integrate { .. } => {
            let outcome = integration.shell_integrate(filter);
            tracing::info!("Integration finished: {:?}", outcome);
        }
        Command::Disintegrate { .. } => {
            let outcome = integration.shell_disintegrate(filter);
            tracing::info!("Disintegration finished: {:?}", outcome);
        }
        Command::List { .. } => {
            let doctypes = integration.resolver().resolve(catalog.classes(), filter);
            for (ext, info) in &doctypes {
                let icon = info
                    .icon_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}\t{}", ext, info.prog_id, info.description, icon);
            }
        }
    }
}
