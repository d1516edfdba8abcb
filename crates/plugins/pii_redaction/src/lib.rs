// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// PII Redaction Plugin
//
// Scrubs personally identifiable information from MCP tool-call arguments
// and tool results:
// - RegexSet-prefiltered recognizers with checksum validation
// - Copy-on-write text redaction (no allocation when nothing is found)
// - In-place traversal of serde_json payloads with a depth guard
// - A call interceptor that redacts both directions and never masks
//   downstream failures

pub mod config;
pub mod detector;
pub mod engine;
pub mod entities;
pub mod error;
pub mod interceptor;
pub mod masking;
pub mod observer;
pub mod patterns;
pub mod span;

pub use config::{DetectionFailurePolicy, RecognizerConfig, RedactionConfig, ReplacementConfig};
pub use detector::{Detector, RegexDetector};
pub use engine::{RedactionEngine, Redactable};
pub use entities::{DEFAULT_ENTITY_TYPES, EntityTypeSet};
pub use error::{CallError, ConfigError, DetectionError, RedactionError, ValidationError};
pub use interceptor::{CallContext, CallEnvelope, CallMetadata, CallState, Interceptor};
pub use masking::{Anonymizer, MaskStrategy, MaskingAnonymizer};
pub use observer::{NoopObserver, RedactionObserver, TracingObserver};
pub use span::Span;
