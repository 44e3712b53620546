//! # Hookshot relay server
//!
//! The public-facing half of hookshot: accepts tunnel WebSocket
//! connections, accepts public webhook HTTP traffic, and exposes the
//! request-listing and replay JSON API (`spec.md` §4.5).

pub mod handlers;
pub mod options;
pub mod state;
pub mod websocket;

pub use options::{ServerOptions, TlsOptions};
pub use state::AppState;

use std::net::SocketAddr;

use tracing::info;

use crate::options::SHUTDOWN_DRAIN;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Build the router without binding a listener — used directly by tests
/// that want an in-process server on an ephemeral port.
pub fn build_router(state: AppState) -> axum::Router {
    handlers::router(state)
}

/// Bind and serve until a shutdown signal arrives. On shutdown: stop
/// accepting new connections, fire every tunnel's done signal (closing
/// tunnel sockets promptly), and give in-flight HTTP handlers up to
/// [`SHUTDOWN_DRAIN`] to finish before returning (`spec.md` §5 "Graceful
/// shutdown"). Both the plain and TLS listeners go through `axum-server`
/// so they share one bounded-drain `Handle`.
pub async fn run(options: ServerOptions) -> Result<(), BoxError> {
    let addr = SocketAddr::new(options.host, options.port);
    let tls = options.tls.clone();
    let state = AppState::new(options);
    let registry = state.registry.clone();
    let router = build_router(state);

    info!(%addr, "hookshot server listening");

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("shutdown signal received, closing tunnels and draining in-flight handlers");
        registry.close_all().await;
        shutdown_handle.graceful_shutdown(Some(SHUTDOWN_DRAIN));
    });

    if let Some(tls) = tls {
        let config =
            axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await?;
        axum_server::bind_rustls(addr, config)
            .handle(handle)
            .serve(router.into_make_service())
            .await?;
    } else {
        axum_server::bind(addr)
            .handle(handle)
            .serve(router.into_make_service())
            .await?;
    }

    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
