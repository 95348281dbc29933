//! Assetline Dev - Watch loop and development server
//!
//! The watch loop maps debounced file changes to the tasks that own them,
//! rebuilds, and tells connected browsers to reload through a server-sent
//! events endpoint on the development server.

pub mod error;
pub mod reload;
pub mod rules;
pub mod server;
pub mod watcher;

pub use error::{ServeError, WatchError};
pub use reload::{ReloadEvent, ReloadHub};
pub use rules::{default_rules, CompiledRules, WatchRule};
pub use server::{inject_live_reload, DevServer, RELOAD_ENDPOINT};
pub use watcher::{Rebuilder, WatchLoop, WatchState};

/// Resolve when the process receives Ctrl-C (or SIGTERM on unix)
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
