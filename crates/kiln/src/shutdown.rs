//! Graceful shutdown wiring.
//!
//! SIGINT/SIGTERM fire a shared cancellation token. The scheduler stops
//! submitting new work, lets in-flight builds wind down, and the summary
//! is still printed before the process exits non-zero.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// Install signal handlers and return the token they fire.
pub fn install_signal_handlers() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
                return;
            };
            let Ok(mut sigint) = signal(SignalKind::interrupt()) else {
                return;
            };

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, finishing in-flight builds");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, finishing in-flight builds");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            info!("Received interrupt, finishing in-flight builds");
        }

        trigger.cancel();
    });

    cancel
}
