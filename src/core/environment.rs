//! Facts about the running process

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Where the application runs from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Running as a fixed, installed executable rather than from a source checkout
    pub packaged: bool,
    /// Absolute path of the running executable
    pub executable: PathBuf,
}

impl Environment {
    /// Installed build at `executable`
    pub fn packaged(executable: impl Into<PathBuf>) -> Self {
        Self {
            packaged: true,
            executable: executable.into(),
        }
    }

    /// Development build at `executable`
    pub fn unpackaged(executable: impl Into<PathBuf>) -> Self {
        Self {
            packaged: false,
            executable: executable.into(),
        }
    }

    /// Inspect the current process. `packaged` overrides the detection.
    pub fn detect(packaged: Option<bool>) -> Result<Self> {
        let executable =
            std::env::current_exe().context("Could not determine the running executable")?;
        let launched_by_cargo = std::env::var_os("CARGO").is_some();
        let packaged =
            packaged.unwrap_or_else(|| !is_source_build(&executable, launched_by_cargo));

        tracing::debug!(
            "Executable {} (packaged: {})",
            executable.display(),
            packaged
        );
        Ok(Self {
            packaged,
            executable,
        })
    }
}

/// A build run through cargo or straight out of `target/debug` or `target/release`
fn is_source_build(executable: &Path, launched_by_cargo: bool) -> bool {
    let components: Vec<_> = executable
        .components()
        .map(|component| component.as_os_str())
        .collect();
    launched_by_cargo
        || components
            .windows(2)
            .any(|pair| pair[0] == "target" && (pair[1] == "debug" || pair[1] == "release"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_build_detection() {
        assert!(is_source_build(
            Path::new("/home/dev/docassoc/target/debug/docassoc"),
            false
        ));
        assert!(is_source_build(Path::new("/opt/docassoc/docassoc"), true));
        assert!(!is_source_build(Path::new("/opt/docassoc/docassoc"), false));
        assert!(is_source_build(
            Path::new("/home/dev/docassoc/target/release/docassoc"),
            false
        ));
    }

    #[test]
    fn test_install_dir_named_target_is_packaged() {
        assert!(!is_source_build(Path::new("/srv/target/App/app"), false));
        assert!(!is_source_build(Path::new("/srv/target/debugger/app"), false));
    }

    #[test]
    fn test_detect_honors_override() {
        assert!(Environment::detect(Some(true)).unwrap().packaged);
        assert!(!Environment::detect(Some(false)).unwrap().packaged);
    }
}
