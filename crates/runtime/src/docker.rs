//! Docker CLI runtime client.

use crate::client::{BuildOutput, BuildRequest, ContainerRuntime, PushOutput, PushStatus};
use crate::{Error, Result};
use async_trait::async_trait;
use kiln_core::RegistryConfig;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runtime client that shells out to the `docker` binary.
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerCli {
    /// Client for the `docker` binary on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: "docker".to_string(),
        }
    }

    /// Client for a compatible binary at another name (e.g. `podman`).
    #[must_use]
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn spawn(&self, mut cmd: Command) -> Result<Child> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.spawn().map_err(|source| Error::Spawn {
            command: self.binary.clone(),
            source,
        })
    }

    /// Drive a spawned process to completion, feeding every output line to
    /// `on_line`. Cancellation between lines kills the process.
    async fn stream(
        &self,
        mut child: Child,
        image: &str,
        cancel: &CancellationToken,
        mut on_line: impl FnMut(&str),
    ) -> Result<std::process::ExitStatus> {
        let (tx, mut rx) = mpsc::channel::<String>(64);

        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx.clone());
        }
        drop(tx);

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    warn!(%image, "Cancelled, killing runtime process");
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return Err(Error::Cancelled {
                        image: image.to_string(),
                    });
                }
                line = rx.recv() => match line {
                    Some(line) => on_line(&line),
                    None => break,
                },
            }
        }

        child.wait().await.map_err(|source| Error::Wait {
            command: self.binary.clone(),
            source,
        })
    }
}

fn forward_lines(
    reader: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    tx: mpsc::Sender<String>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn build(
        &self,
        request: &BuildRequest,
        cancel: &CancellationToken,
    ) -> Result<BuildOutput> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("build")
            .arg("--tag")
            .arg(&request.tag)
            .arg("--file")
            .arg(&request.definition_path);
        if request.no_cache {
            cmd.arg("--no-cache");
        }
        cmd.arg(&request.context_dir);

        info!(image = %request.tag, context = %request.context_dir.display(), "Building image");
        let child = self.spawn(cmd)?;
        let status = self
            .stream(child, &request.tag, cancel, |line| {
                info!(image = %request.tag, "{line}");
            })
            .await?;

        Ok(BuildOutput {
            success: status.success(),
            exit_code: status.code().unwrap_or(-1),
        })
    }

    async fn push(&self, tag: &str, cancel: &CancellationToken) -> Result<PushOutput> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("push").arg(tag);

        info!(image = %tag, "Pushing image");
        let mut layers_existed = false;
        let child = self.spawn(cmd)?;
        let status = self
            .stream(child, tag, cancel, |line| {
                if line.contains("Layer already exists") {
                    layers_existed = true;
                }
                info!(image = %tag, "{line}");
            })
            .await?;

        let push_status = if !status.success() {
            PushStatus::Failed
        } else if layers_existed {
            PushStatus::AlreadyExists
        } else {
            PushStatus::Pushed
        };
        Ok(PushOutput {
            status: push_status,
            exit_code: status.code().unwrap_or(-1),
        })
    }

    async fn login(&self, registry: &RegistryConfig) -> Result<()> {
        let (Some(username), Some(password)) = (&registry.username, &registry.password) else {
            debug!(registry = %registry.address, "No credentials configured, skipping login");
            return Ok(());
        };
        if registry.insecure {
            // TLS verification for insecure registries is daemon
            // configuration for docker; nothing to pass per call.
            debug!(registry = %registry.address, "Insecure registry, relying on daemon config");
        }

        let mut cmd = Command::new(&self.binary);
        cmd.arg("login")
            .arg("--username")
            .arg(username)
            .arg("--password-stdin")
            .arg(&registry.address)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            command: self.binary.clone(),
            source,
        })?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(password.as_bytes())
                .await
                .map_err(|source| Error::Wait {
                    command: self.binary.clone(),
                    source,
                })?;
        }
        let output = child
            .wait_with_output()
            .await
            .map_err(|source| Error::Wait {
                command: self.binary.clone(),
                source,
            })?;

        if output.status.success() {
            info!(registry = %registry.address, "Logged in");
            Ok(())
        } else {
            Err(Error::LoginFailed {
                registry: registry.address.clone(),
            })
        }
    }

    async fn list_local_images(&self) -> Result<Vec<String>> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("images")
            .arg("--format")
            .arg("{{.Repository}}:{{.Tag}}");

        let output = cmd.output().await.map_err(|source| Error::Spawn {
            command: self.binary.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(Error::ListFailed {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let listing = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        debug!(count = listing.len(), "Listed local images");
        Ok(listing)
    }
}
