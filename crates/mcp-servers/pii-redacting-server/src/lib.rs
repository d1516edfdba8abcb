// Copyright 2026
// SPDX-License-Identifier: Apache-2.0

use crate::guard::RedactingServer;
use crate::server::PiiDemoServer;
use pii_redaction::Interceptor;
use rmcp::transport;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod guard;
pub mod server;
pub mod tools;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub static APP_NAME: &str = env!("CARGO_PKG_NAME");
pub static APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Installs the global subscriber. `level` is an `EnvFilter` directive;
/// an unparsable one falls back to `info`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .try_init();
}

/// Streamable HTTP router serving the guarded demo tools at `/mcp`.
pub fn build_router(interceptor: Interceptor) -> axum::Router {
    let service = transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(RedactingServer::new(PiiDemoServer::new(), interceptor.clone())),
        transport::streamable_http_server::session::local::LocalSessionManager::default().into(),
        Default::default(),
    );

    axum::Router::new().nest_service("/mcp", service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pii_redaction::{NoopObserver, RedactionConfig};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_build_router() {
        let interceptor =
            Interceptor::from_config(&RedactionConfig::default(), Arc::new(NoopObserver)).unwrap();
        let _router = build_router(interceptor);
    }
}
