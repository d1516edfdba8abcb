// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Anonymizer capability and the masking strategies shipped with it.

use crate::config::ReplacementConfig;
use crate::error::ValidationError;
use crate::span::{Span, resolve_overlaps};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Rewrites the character ranges covered by `spans`.
///
/// Must be deterministic for identical inputs, must return `text` unchanged
/// when `spans` is empty and must reject (not clamp) spans that do not fit
/// the text.
pub trait Anonymizer: Send + Sync {
    fn anonymize(&self, text: &str, spans: &[Span]) -> Result<String, ValidationError>;
}

/// How a detected span is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskStrategy {
    /// Fixed per-entity token, `<EMAIL_ADDRESS>` by default.
    #[default]
    Placeholder,
    /// Entity token plus a short SHA-256 digest of the original value, so the
    /// same value redacts to the same token across calls.
    Hash,
    /// Every character replaced by the mask character.
    Mask,
}

pub const ENTITY_TYPE_TOKEN: &str = "{entity_type}";
pub const DEFAULT_PLACEHOLDER_FORMAT: &str = "<{entity_type}>";
pub const DEFAULT_MASK_CHAR: char = '*';
const HASH_PREFIX_BYTES: usize = 4;

#[derive(Debug, Clone)]
pub struct MaskingAnonymizer {
    strategy: MaskStrategy,
    placeholder_format: String,
    overrides: HashMap<String, String>,
    mask_char: char,
}

impl MaskingAnonymizer {
    pub fn new() -> Self {
        Self::with_strategy(MaskStrategy::Placeholder)
    }

    pub fn with_strategy(strategy: MaskStrategy) -> Self {
        Self {
            strategy,
            placeholder_format: DEFAULT_PLACEHOLDER_FORMAT.to_string(),
            overrides: HashMap::new(),
            mask_char: DEFAULT_MASK_CHAR,
        }
    }

    pub fn from_config(config: &ReplacementConfig) -> Self {
        Self {
            strategy: config.strategy,
            placeholder_format: config.placeholder_format.clone(),
            overrides: config
                .overrides
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            mask_char: config.mask_char,
        }
    }

    /// Uses `token` verbatim for `entity_type` under the placeholder strategy.
    pub fn with_override(mut self, entity_type: impl Into<String>, token: impl Into<String>) -> Self {
        self.overrides.insert(entity_type.into(), token.into());
        self
    }

    pub fn strategy(&self) -> MaskStrategy {
        self.strategy
    }

    fn replacement(&self, span: &Span, original: &str) -> String {
        match self.strategy {
            MaskStrategy::Placeholder => match self.overrides.get(&span.entity_type) {
                Some(token) => token.clone(),
                None => self
                    .placeholder_format
                    .replace(ENTITY_TYPE_TOKEN, &span.entity_type),
            },
            MaskStrategy::Hash => {
                let digest = Sha256::digest(original.as_bytes());
                let short: String = digest
                    .iter()
                    .take(HASH_PREFIX_BYTES)
                    .map(|b| format!("{b:02x}"))
                    .collect();
                format!("<{}_{}>", span.entity_type, short)
            }
            MaskStrategy::Mask => std::iter::repeat_n(self.mask_char, original.chars().count()).collect(),
        }
    }
}

impl Default for MaskingAnonymizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Anonymizer for MaskingAnonymizer {
    fn anonymize(&self, text: &str, spans: &[Span]) -> Result<String, ValidationError> {
        if spans.is_empty() {
            return Ok(text.to_string());
        }

        // byte offset of every character, plus the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_len = boundaries.len() - 1;

        for span in spans {
            span.validate(char_len)?;
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in resolve_overlaps(spans) {
            let start = boundaries[span.start];
            let end = boundaries[span.end];
            out.push_str(&text[cursor..start]);
            out.push_str(&self.replacement(&span, &text[start..end]));
            cursor = end;
        }
        out.push_str(&text[cursor..]);

        Ok(out)
    }
}
