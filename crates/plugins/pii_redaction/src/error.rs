// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Error taxonomy for detection, anonymization, traversal and interception.
//
// None of these messages may carry payload text: a rejected call reports a
// generic failure so the error path cannot leak the PII being protected.

use thiserror::Error;

/// The detection backend could not analyze a text.
///
/// Recovered by the engine (the leaf is treated as having no detections)
/// unless the configured policy is `reject`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("entity type '{0}' is not supported by this detector")]
    UnsupportedEntity(String),

    #[error("detection backend failure: {0}")]
    Backend(String),
}

/// A span handed to the anonymizer does not fit the text it targets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("span range is inverted (start {start} > end {end})")]
    InvertedRange { start: usize, end: usize },

    #[error("span end {end} is beyond the text length {len}")]
    OutOfBounds { end: usize, len: usize },

    #[error("span score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),
}

/// Fatal redaction failures. Any of these rejects the whole call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RedactionError {
    #[error("invalid span: {0}")]
    Validation(#[from] ValidationError),

    /// A payload shape the engine cannot guarantee to be safe.
    #[error("unsupported payload shape: {kind}")]
    Schema { kind: &'static str },

    #[error("payload nesting exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },

    /// Only raised when detection failures are configured as fatal.
    #[error("detection failed: {0}")]
    Detection(DetectionError),

    #[error("redaction worker failed")]
    WorkerFailed,
}

impl RedactionError {
    /// Whether this failure stems from the structure of the payload rather
    /// than from the redaction machinery.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RedactionError::Schema { .. } | RedactionError::DepthExceeded { .. }
        )
    }

    /// Message safe to return to the remote caller.
    pub fn public_message(&self) -> &'static str {
        if self.is_structural() {
            "payload failed structural validation"
        } else {
            "payload redaction failed"
        }
    }
}

/// Outcome of an intercepted call that did not produce a result.
///
/// `Downstream` carries the handler's own error untouched so callers can
/// recover its original kind.
#[derive(Error, Debug)]
pub enum CallError<E> {
    #[error("{}", .0.public_message())]
    Rejected(RedactionError),

    #[error("{0}")]
    Downstream(E),

    #[error("call cancelled")]
    Cancelled,
}

impl<E> CallError<E> {
    /// Returns the downstream error if this is one.
    pub fn into_downstream(self) -> Option<E> {
        match self {
            CallError::Downstream(err) => Some(err),
            _ => None,
        }
    }
}

/// Configuration loading or validation failure.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid pattern for entity '{entity_type}': {source}")]
    Pattern {
        entity_type: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
