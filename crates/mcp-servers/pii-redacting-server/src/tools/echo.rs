// Copyright 2026
// SPDX-License-Identifier: Apache-2.0

use serde_json::{Value, json};

/// Payload returned by `demo_echo`.
pub fn echo_payload(input: &str) -> Value {
    tracing::debug!(bytes = input.len(), "echoing input");
    json!({ "result": input })
}

/// Text returned by `orchestrator_tool`. The orchestrator hands its input
/// straight back, so every redaction applied inbound is visible to callers.
pub fn orchestrate(input: String) -> String {
    tracing::debug!(bytes = input.len(), "orchestrating input");
    input
}
