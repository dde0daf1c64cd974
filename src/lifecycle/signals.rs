//! OS signal handling.
//!
//! SIGINT and SIGTERM both start a graceful shutdown. If the handlers cannot
//! be installed the process keeps serving and can only be killed.

/// Wait for a termination signal and return its name.
#[cfg(unix)]
pub async fn wait_for_termination() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut interrupt, mut terminate) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(interrupt), Ok(terminate)) => (interrupt, terminate),
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return std::future::pending().await;
            }
        };

    tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    }
}

/// Wait for Ctrl+C and return its name.
#[cfg(not(unix))]
pub async fn wait_for_termination() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        return std::future::pending().await;
    }
    "ctrl-c"
}
