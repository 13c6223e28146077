//! CLI subcommand implementations.

pub mod build;
pub mod list;

use kiln_core::BuildConfig;
use miette::IntoDiagnostic;
use std::path::Path;

/// Load the configuration file, tolerating a missing default file.
///
/// An explicitly named file must exist; the default `kiln.toml` falls back
/// to built-in defaults when absent so `kiln list` works in a bare tree.
pub fn load_config(path: &Path) -> miette::Result<BuildConfig> {
    if !path.exists() && path == Path::new("kiln.toml") {
        tracing::warn!("No kiln.toml found, using built-in defaults");
        return Ok(BuildConfig::default());
    }
    BuildConfig::from_file(path).into_diagnostic()
}
