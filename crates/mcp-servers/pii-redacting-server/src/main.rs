// Copyright 2026
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use pii_redacting_server::config::Args;
use pii_redacting_server::{APP_NAME, APP_VERSION, build_router, init_tracing};
use pii_redaction::Interceptor;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::from_cli(std::env::args_os());
    init_tracing(&args.log_level);
    tracing::info!("---- Starting PII REDACTING MCP Server ----");

    let config = args.redaction_config()?;
    let interceptor = Interceptor::from_config(&config, args.observer())
        .context("Invalid redaction configuration")?;
    let router = build_router(interceptor);

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    tracing::info!(
        app = APP_NAME,
        version = APP_VERSION,
        addr = %args.bind,
        "Server starting"
    );

    tracing::info!(
        entity_types = ?config.entity_types,
        max_recursion_depth = config.max_recursion_depth,
        strategy = ?config.replacement.strategy,
        transport = "streamable-http",
        "Configuration loaded"
    );

    tracing::info!(url = format!("http://{}/mcp", args.bind), "Server ready");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "SIGTERM handler unavailable, waiting for Ctrl-C only");
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }

    tracing::info!("Shutting down...");
}
