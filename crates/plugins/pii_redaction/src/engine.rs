// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Redaction engine: detector + anonymizer applied to text leaves and to
// arbitrarily nested JSON payloads.

use crate::config::{DetectionFailurePolicy, RedactionConfig};
use crate::detector::{Detector, RegexDetector};
use crate::entities::EntityTypeSet;
use crate::error::{ConfigError, RedactionError};
use crate::masking::{Anonymizer, MaskingAnonymizer};
use crate::observer::{NoopObserver, RedactionObserver};
use crate::span::validate_score;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// Composes a [`Detector`] and an [`Anonymizer`].
///
/// The engine keeps no per-call state: spans and texts are dropped as soon as
/// a leaf has been rewritten, so one engine can be shared by every concurrent
/// call.
#[derive(Clone)]
pub struct RedactionEngine {
    detector: Arc<dyn Detector>,
    anonymizer: Arc<dyn Anonymizer>,
    entity_types: EntityTypeSet,
    min_score: f64,
    max_depth: usize,
    on_detection_error: DetectionFailurePolicy,
    observer: Arc<dyn RedactionObserver>,
}

impl RedactionEngine {
    pub fn new(detector: Arc<dyn Detector>, anonymizer: Arc<dyn Anonymizer>) -> Self {
        let defaults = RedactionConfig::default();
        Self {
            detector,
            anonymizer,
            entity_types: defaults.entity_types,
            min_score: defaults.min_score,
            max_depth: defaults.max_recursion_depth,
            on_detection_error: defaults.on_detection_error,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Builds the regex detector and masking anonymizer described by `config`.
    ///
    /// Fails when an entity type has no recognizer, since every text would
    /// otherwise hit a detection error and pass through unredacted.
    pub fn from_config(config: &RedactionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let detector = RegexDetector::with_custom(config.custom_recognizers()?)
            .map_err(|e| ConfigError::Invalid(format!("recognizer set: {e}")))?;
        let unsupported: Vec<&str> = config
            .entity_types
            .iter()
            .filter(|t| !detector.supports(t))
            .collect();
        if !unsupported.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "no recognizer for entity types: {}",
                unsupported.join(", ")
            )));
        }

        let anonymizer = MaskingAnonymizer::from_config(&config.replacement);
        Ok(Self::new(Arc::new(detector), Arc::new(anonymizer))
            .with_entity_types(config.entity_types.clone())
            .with_min_score(config.min_score)
            .with_max_depth(config.max_recursion_depth)
            .with_detection_failure_policy(config.on_detection_error))
    }

    pub fn with_entity_types(mut self, entity_types: EntityTypeSet) -> Self {
        self.entity_types = entity_types;
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_detection_failure_policy(mut self, policy: DetectionFailurePolicy) -> Self {
        self.on_detection_error = policy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RedactionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn entity_types(&self) -> &EntityTypeSet {
        &self.entity_types
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Redacts one text with the configured entity types.
    pub fn redact_text<'a>(&self, text: &'a str) -> Result<Cow<'a, str>, RedactionError> {
        self.redact_text_for(text, &self.entity_types)
    }

    /// Redacts one text.
    ///
    /// When nothing is detected the original text is returned borrowed and the
    /// anonymizer is never called.
    pub fn redact_text_for<'a>(
        &self,
        text: &'a str,
        entity_types: &EntityTypeSet,
    ) -> Result<Cow<'a, str>, RedactionError> {
        if text.is_empty() {
            return Ok(Cow::Borrowed(text));
        }

        let spans = match self.detector.detect(text, entity_types) {
            Ok(spans) => spans,
            Err(err) => {
                tracing::error!(error = %err, policy = ?self.on_detection_error, "PII detection failed");
                self.observer.on_detection_error(&err);
                return match self.on_detection_error {
                    DetectionFailurePolicy::Allow => Ok(Cow::Borrowed(text)),
                    DetectionFailurePolicy::Reject => Err(RedactionError::Detection(err)),
                };
            }
        };

        // NaN or out-of-range scores must fail before filtering can drop them
        for span in &spans {
            validate_score(span.score)?;
        }
        let spans: Vec<_> = spans
            .into_iter()
            .filter(|s| s.score >= self.min_score)
            .collect();
        if spans.is_empty() {
            return Ok(Cow::Borrowed(text));
        }

        let redacted = self.anonymizer.anonymize(text, &spans)?;
        self.observer.on_text_redacted(spans.len());
        Ok(Cow::Owned(redacted))
    }

    /// Redacts a string in place.
    pub fn redact_string(&self, text: &mut String) -> Result<(), RedactionError> {
        self.redact_string_for(text, &self.entity_types)
    }

    fn redact_string_for(&self, text: &mut String, entity_types: &EntityTypeSet) -> Result<(), RedactionError> {
        let replacement = match self.redact_text_for(text, entity_types)? {
            Cow::Owned(redacted) => Some(redacted),
            Cow::Borrowed(_) => None,
        };
        if let Some(redacted) = replacement {
            *text = redacted;
        }
        Ok(())
    }

    /// Redacts every string leaf of `value` in place with the configured
    /// entity types.
    pub fn redact_value(&self, value: &mut Value) -> Result<(), RedactionError> {
        self.redact_value_for(value, &self.entity_types)
    }

    /// Redacts every string leaf of `value` in place.
    ///
    /// Keys, key order, array lengths and non-string scalars are untouched.
    /// On error the value may be partially rewritten and must be discarded.
    pub fn redact_value_for(
        &self,
        value: &mut Value,
        entity_types: &EntityTypeSet,
    ) -> Result<(), RedactionError> {
        self.walk(value, entity_types, 0)
    }

    fn walk(&self, value: &mut Value, entity_types: &EntityTypeSet, depth: usize) -> Result<(), RedactionError> {
        match value {
            Value::String(text) => self.redact_string_for(text, entity_types),
            Value::Array(items) => {
                let depth = self.descend(depth)?;
                for item in items.iter_mut() {
                    self.walk(item, entity_types, depth)?;
                }
                Ok(())
            }
            Value::Object(map) => {
                let depth = self.descend(depth)?;
                for (_key, item) in map.iter_mut() {
                    self.walk(item, entity_types, depth)?;
                }
                Ok(())
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => Ok(()),
        }
    }

    fn descend(&self, depth: usize) -> Result<usize, RedactionError> {
        if depth >= self.max_depth {
            return Err(RedactionError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        Ok(depth + 1)
    }
}

impl std::fmt::Debug for RedactionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedactionEngine")
            .field("entity_types", &self.entity_types)
            .field("min_score", &self.min_score)
            .field("max_depth", &self.max_depth)
            .field("on_detection_error", &self.on_detection_error)
            .finish_non_exhaustive()
    }
}

/// A payload the interceptor can scrub.
pub trait Redactable {
    fn redact_with(&mut self, engine: &RedactionEngine) -> Result<(), RedactionError>;

    /// Approximate number of string bytes, used to decide whether redaction
    /// is offloaded to the blocking pool.
    fn string_weight(&self) -> usize;
}

impl Redactable for Value {
    fn redact_with(&mut self, engine: &RedactionEngine) -> Result<(), RedactionError> {
        engine.redact_value(self)
    }

    fn string_weight(&self) -> usize {
        string_weight(self)
    }
}

/// Total length of string leaves and keys.
///
/// Iterative so that oversized nesting is left for the depth guard to reject
/// instead of overflowing the stack here.
pub fn string_weight(value: &Value) -> usize {
    let mut total = 0;
    let mut pending = vec![value];
    while let Some(next) = pending.pop() {
        match next {
            Value::String(text) => total += text.len(),
            Value::Array(items) => pending.extend(items.iter()),
            Value::Object(map) => {
                for (key, item) in map {
                    total += key.len();
                    pending.push(item);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
    total
}
