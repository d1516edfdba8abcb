// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Redaction configuration, loaded from TOML with every field defaulted.
//
// ```toml
// entity_types = ["EMAIL_ADDRESS", "CREDIT_CARD", "EMPLOYEE_ID"]
// max_recursion_depth = 32
//
// [replacement]
// strategy = "placeholder"
// placeholder_format = "[{entity_type}]"
//
// [[recognizers]]
// entity_type = "EMPLOYEE_ID"
// pattern = '\bEMP-\d{6}\b'
// score = 0.9
// ```

use crate::entities::EntityTypeSet;
use crate::error::ConfigError;
use crate::masking::{DEFAULT_MASK_CHAR, DEFAULT_PLACEHOLDER_FORMAT, ENTITY_TYPE_TOKEN, MaskStrategy};
use crate::patterns::Recognizer;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 50;
pub const MAX_RECURSION_DEPTH_LIMIT: usize = 1024;
pub const DEFAULT_OFFLOAD_THRESHOLD_BYTES: usize = 64 * 1024;
pub const DEFAULT_MAX_BLOCKING_REDACTIONS: usize = 4;

/// What the engine does when the detector fails on a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionFailurePolicy {
    /// Log the failure and treat the text as containing no PII.
    #[default]
    Allow,
    /// Reject the whole call.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplacementConfig {
    pub strategy: MaskStrategy,
    /// Template for placeholder tokens; `{entity_type}` is substituted.
    pub placeholder_format: String,
    /// Per-entity tokens used verbatim instead of the template.
    pub overrides: BTreeMap<String, String>,
    pub mask_char: char,
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        Self {
            strategy: MaskStrategy::Placeholder,
            placeholder_format: DEFAULT_PLACEHOLDER_FORMAT.to_string(),
            overrides: BTreeMap::new(),
            mask_char: DEFAULT_MASK_CHAR,
        }
    }
}

/// A user-supplied pattern recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecognizerConfig {
    pub entity_type: String,
    pub pattern: String,
    #[serde(default = "default_recognizer_score")]
    pub score: f64,
    #[serde(default)]
    pub context: Vec<String>,
}

fn default_recognizer_score() -> f64 {
    0.85
}

impl RecognizerConfig {
    pub fn compile(&self) -> Result<Recognizer, ConfigError> {
        let regex = Regex::new(&self.pattern).map_err(|source| ConfigError::Pattern {
            entity_type: self.entity_type.clone(),
            source,
        })?;
        Ok(Recognizer::new(self.entity_type.clone(), regex, self.score).with_context(&self.context))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RedactionConfig {
    /// Entity types the detector is asked for.
    pub entity_types: EntityTypeSet,
    /// Spans scoring below this are ignored.
    pub min_score: f64,
    pub max_recursion_depth: usize,
    pub on_detection_error: DetectionFailurePolicy,
    /// Payloads with more string bytes than this are redacted on the blocking pool.
    pub offload_threshold_bytes: usize,
    /// Concurrent blocking-pool redactions allowed.
    pub max_blocking_redactions: usize,
    pub replacement: ReplacementConfig,
    pub recognizers: Vec<RecognizerConfig>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            entity_types: EntityTypeSet::default(),
            min_score: 0.0,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            on_detection_error: DetectionFailurePolicy::Allow,
            offload_threshold_bytes: DEFAULT_OFFLOAD_THRESHOLD_BYTES,
            max_blocking_redactions: DEFAULT_MAX_BLOCKING_REDACTIONS,
            replacement: ReplacementConfig::default(),
            recognizers: Vec::new(),
        }
    }
}

impl RedactionConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entity_types.is_empty() {
            return Err(ConfigError::Invalid(
                "entity_types must name at least one entity".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(ConfigError::Invalid(format!(
                "min_score must be within [0, 1], got {}",
                self.min_score
            )));
        }
        if !(1..=MAX_RECURSION_DEPTH_LIMIT).contains(&self.max_recursion_depth) {
            return Err(ConfigError::Invalid(format!(
                "max_recursion_depth must be within 1..={MAX_RECURSION_DEPTH_LIMIT}, got {}",
                self.max_recursion_depth
            )));
        }
        if self.max_blocking_redactions == 0 {
            return Err(ConfigError::Invalid(
                "max_blocking_redactions must be at least 1".to_string(),
            ));
        }
        if self.replacement.placeholder_format.is_empty() {
            return Err(ConfigError::Invalid(
                "replacement.placeholder_format must not be empty".to_string(),
            ));
        }
        if !self.replacement.placeholder_format.contains(ENTITY_TYPE_TOKEN) {
            tracing::warn!(
                format = %self.replacement.placeholder_format,
                "placeholder_format has no {{entity_type}} token; all entities share one placeholder"
            );
        }
        for recognizer in &self.recognizers {
            if recognizer.entity_type.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "recognizer entity_type must not be empty".to_string(),
                ));
            }
            if !(0.0..=1.0).contains(&recognizer.score) {
                return Err(ConfigError::Invalid(format!(
                    "recognizer '{}' score must be within [0, 1]",
                    recognizer.entity_type
                )));
            }
            recognizer.compile()?;
        }
        Ok(())
    }

    pub fn custom_recognizers(&self) -> Result<Vec<Recognizer>, ConfigError> {
        self.recognizers.iter().map(RecognizerConfig::compile).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RedactionConfig::default();
        assert_eq!(config.entity_types, EntityTypeSet::default());
        assert_eq!(config.max_recursion_depth, 50);
        assert_eq!(config.replacement.placeholder_format, "<{entity_type}>");
        assert_eq!(config.on_detection_error, DetectionFailurePolicy::Allow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = RedactionConfig::from_toml_str("").unwrap();
        assert_eq!(config, RedactionConfig::default());
    }

    #[test]
    fn test_parse_full_document() {
        let raw = r#"
            entity_types = ["EMAIL_ADDRESS", "EMAIL_ADDRESS", "EMPLOYEE_ID"]
            min_score = 0.3
            max_recursion_depth = 8
            on_detection_error = "reject"

            [replacement]
            strategy = "hash"
            overrides = { EMAIL_ADDRESS = "[email]" }

            [[recognizers]]
            entity_type = "EMPLOYEE_ID"
            pattern = '\bEMP-\d{6}\b'
            context = ["badge"]
        "#;
        let config = RedactionConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.entity_types.len(), 2);
        assert_eq!(config.max_recursion_depth, 8);
        assert_eq!(config.on_detection_error, DetectionFailurePolicy::Reject);
        assert_eq!(config.replacement.strategy, MaskStrategy::Hash);
        assert_eq!(config.replacement.overrides["EMAIL_ADDRESS"], "[email]");
        assert_eq!(config.recognizers[0].score, 0.85);
        assert_eq!(config.custom_recognizers().unwrap().len(), 1);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(
            RedactionConfig::from_toml_str("max_depth = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_values() {
        for raw in [
            "entity_types = []",
            "min_score = 1.5",
            "max_recursion_depth = 0",
            "max_recursion_depth = 5000",
            "max_blocking_redactions = 0",
            "[replacement]\nplaceholder_format = \"\"",
        ] {
            assert!(
                matches!(RedactionConfig::from_toml_str(raw), Err(ConfigError::Invalid(_))),
                "accepted: {raw}"
            );
        }
    }

    #[test]
    fn test_rejects_bad_pattern() {
        let raw = r#"
            [[recognizers]]
            entity_type = "BROKEN"
            pattern = "(unclosed"
        "#;
        assert!(matches!(
            RedactionConfig::from_toml_str(raw),
            Err(ConfigError::Pattern { .. })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_recursion_depth = 12").unwrap();
        let config = RedactionConfig::load(file.path()).unwrap();
        assert_eq!(config.max_recursion_depth, 12);

        assert!(matches!(
            RedactionConfig::load("/nonexistent/redaction.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
