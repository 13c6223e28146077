//! Command-line interface definition.

use crate::logging::{LogFormat, LogLevel};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Dependency-ordered container image build pipeline.
#[derive(Debug, Parser)]
#[command(name = "kiln", version, about)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "kiln.toml", env = "KILN_CONFIG")]
    pub config: PathBuf,

    /// Log verbosity.
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build matched component images, cascading through the graph.
    Build(BuildArgs),
    /// Show the discovered image graph and what a build would select.
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Component name prefixes to build; everything when omitted.
    #[arg(long = "components", value_name = "NAME", num_args = 0..)]
    pub components: Vec<String>,

    /// Override the configured namespace.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Override the configured tag.
    #[arg(long)]
    pub tag: Option<String>,

    /// Override the configured worker count.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Push images after building, regardless of configuration.
    #[arg(long)]
    pub push: bool,

    /// Disable the runtime layer cache for every build.
    #[arg(long)]
    pub no_cache: bool,
}

impl BuildArgs {
    /// Apply flag overrides onto a loaded configuration.
    pub fn apply(&self, config: &mut kiln_core::BuildConfig) {
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(tag) = &self.tag {
            config.tag = tag.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.push {
            config.push = true;
        }
        if self.no_cache {
            config.no_cache = true;
        }
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Component name prefixes to select; everything when omitted.
    #[arg(long = "components", value_name = "NAME", num_args = 0..)]
    pub components: Vec<String>,
}
