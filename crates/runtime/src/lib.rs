//! Container runtime client.
//!
//! The scheduler drives builds and pushes through the [`ContainerRuntime`]
//! trait; [`DockerCli`] is the default implementation and shells out to the
//! `docker` binary, streaming build and push output line by line through
//! `tracing`. Streaming loops poll the cancellation token between lines so
//! an interrupted run stops consuming promptly.

mod client;
mod docker;
mod error;

pub use client::{BuildOutput, BuildRequest, ContainerRuntime, PushOutput, PushStatus};
pub use docker::DockerCli;
pub use error::{Error, Result};
