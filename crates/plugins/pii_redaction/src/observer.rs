// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Observability hook for the redaction pipeline.

use crate::error::{DetectionError, RedactionError};
use crate::interceptor::CallState;

/// Receives pipeline events. Every method defaults to a no-op.
///
/// Events carry identifiers, counts and error kinds only, never payload text.
pub trait RedactionObserver: Send + Sync {
    fn on_detection_error(&self, _error: &DetectionError) {}

    fn on_text_redacted(&self, _span_count: usize) {}

    fn on_state_change(&self, _call_id: &str, _tool: &str, _from: CallState, _to: CallState) {}

    fn on_rejected(&self, _call_id: &str, _tool: &str, _error: &RedactionError) {}

    fn on_downstream_error(&self, _call_id: &str, _tool: &str) {}

    fn on_cancelled(&self, _call_id: &str, _tool: &str) {}
}

/// Observer used when observability is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RedactionObserver for NoopObserver {}

/// Observer that reports call lifecycle events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RedactionObserver for TracingObserver {
    fn on_text_redacted(&self, span_count: usize) {
        tracing::debug!(spans = span_count, "redacted text leaf");
    }

    fn on_state_change(&self, call_id: &str, tool: &str, from: CallState, to: CallState) {
        tracing::debug!(call_id, tool, from = ?from, to = ?to, "call state changed");
    }

    fn on_rejected(&self, call_id: &str, tool: &str, error: &RedactionError) {
        tracing::warn!(call_id, tool, error = %error, "call rejected before forwarding");
    }

    fn on_downstream_error(&self, call_id: &str, tool: &str) {
        tracing::warn!(call_id, tool, "downstream handler failed");
    }

    fn on_cancelled(&self, call_id: &str, tool: &str) {
        tracing::info!(call_id, tool, "call cancelled while forwarded");
    }
}
