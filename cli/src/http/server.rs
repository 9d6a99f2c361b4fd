use super::{
    middleware::{create_middleware_stack, create_trace_layer, request_logger},
    routes::create_router,
    AppState,
};
use crate::commands::cli::ServeArgs;
use axum::{middleware, Router};
use clipseek_core::api::{AppContext, CliError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};

/// Router with the logging, CORS, timeout and trace layers applied.
pub fn build_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.http_server.request_timeout_secs);
    create_router(state)
        .layer(middleware::from_fn(request_logger))
        .layer(create_middleware_stack(timeout))
        .layer(create_trace_layer())
}

/// `clipseek serve`: CLI flags win over `http_server` config.
pub async fn handle_serve(args: ServeArgs, ctx: &AppContext) -> Result<(), CliError> {
    let config = &ctx.cfg().http_server;
    let host = args.host.unwrap_or_else(|| config.host.clone());
    let port = args.port.unwrap_or(config.port);

    let service = ctx.query_service().await?;
    let state = AppState::new(service, ctx.default_tenant()?, ctx.cfg().clone());

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| CliError::Config(format!("invalid listen address {host}:{port}: {e}")))?;

    start_server(addr, state).await
}

pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<(), CliError> {
    let app = build_app(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target: "clipseek.http", "HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C signal");
                }
                _ = wait_for_sigterm() => {
                    info!("Received SIGTERM signal");
                }
            }
            info!("Starting graceful shutdown...");
        })
        .await?;

    let pending = state.service.background().in_flight();
    if pending > 0 {
        info!(target: "clipseek.http", pending, "waiting for background refreshes");
        state.service.background().wait_idle().await;
    }
    info!("Server shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
