//! Core types for the kiln image build pipeline.
//!
//! This crate holds everything the other kiln crates agree on: the image
//! reference grammar shared by `FROM` parsing, local image listing and tag
//! construction, the run configuration, and the base error type.

mod config;
mod error;
mod reference;

pub use config::{BuildConfig, RegistryConfig};
pub use error::{Error, Result};
pub use reference::ImageRef;

/// Crate version, surfaced by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
