// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Detector capability and the regex-backed implementation.

use crate::entities::EntityTypeSet;
use crate::error::DetectionError;
use crate::patterns::{BUILTIN_RECOGNIZERS, Recognizer};
use crate::span::Span;
use once_cell::sync::Lazy;
use regex::RegexSet;

/// Finds PII spans in a text.
///
/// Implementations are shared across concurrent calls and must not mutate
/// state as a side effect of detection.
pub trait Detector: Send + Sync {
    /// Returns every recognized occurrence of the requested entity types.
    /// Order is unspecified; an empty text yields no spans.
    fn detect(&self, text: &str, entity_types: &EntityTypeSet) -> Result<Vec<Span>, DetectionError>;
}

static BUILTIN_PREFILTER: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(BUILTIN_RECOGNIZERS.iter().map(|r| r.regex.as_str()))
        .expect("built-in PII patterns must form a RegexSet")
});

/// Pattern-based detector.
///
/// A `RegexSet` over all recognizers is checked first so only recognizers
/// that can match a given text run their (slower) `find_iter` pass.
#[derive(Debug, Clone)]
pub struct RegexDetector {
    recognizers: Vec<Recognizer>,
    prefilter: RegexSet,
    supported: EntityTypeSet,
}

impl RegexDetector {
    /// Detector with the built-in recognizers only.
    pub fn new() -> Self {
        Self::from_parts(BUILTIN_RECOGNIZERS.clone(), BUILTIN_PREFILTER.clone())
    }

    /// Detector with the built-in recognizers followed by `custom` ones.
    pub fn with_custom(custom: Vec<Recognizer>) -> Result<Self, regex::Error> {
        if custom.is_empty() {
            return Ok(Self::new());
        }
        let mut recognizers = BUILTIN_RECOGNIZERS.clone();
        recognizers.extend(custom);
        let prefilter = RegexSet::new(recognizers.iter().map(|r| r.regex.as_str()))?;
        Ok(Self::from_parts(recognizers, prefilter))
    }

    fn from_parts(recognizers: Vec<Recognizer>, prefilter: RegexSet) -> Self {
        let supported = EntityTypeSet::new(recognizers.iter().map(|r| r.entity_type.clone()));
        Self {
            recognizers,
            prefilter,
            supported,
        }
    }

    pub fn supported_entities(&self) -> &EntityTypeSet {
        &self.supported
    }

    pub fn supports(&self, entity_type: &str) -> bool {
        self.supported.contains(entity_type)
    }
}

impl Default for RegexDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for RegexDetector {
    fn detect(&self, text: &str, entity_types: &EntityTypeSet) -> Result<Vec<Span>, DetectionError> {
        if let Some(unsupported) = entity_types.iter().find(|t| !self.supports(t)) {
            return Err(DetectionError::UnsupportedEntity(unsupported.to_string()));
        }

        if text.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = self.prefilter.matches(text);
        if !candidates.matched_any() {
            return Ok(Vec::new());
        }

        let offsets = CharOffsets::new(text);
        let mut spans = Vec::new();

        for index in candidates.iter() {
            let recognizer = &self.recognizers[index];
            if !entity_types.contains(&recognizer.entity_type) {
                continue;
            }
            for found in recognizer.regex.find_iter(text) {
                if !recognizer.accepts(found.as_str()) {
                    continue;
                }
                spans.push(Span::new(
                    recognizer.entity_type.clone(),
                    offsets.char_index(found.start()),
                    offsets.char_index(found.end()),
                    recognizer.score_at(text, found.start()),
                ));
            }
        }

        Ok(spans)
    }
}

/// Converts regex byte offsets into character offsets.
///
/// Non-ASCII text gets a table of char start positions built once, so each
/// lookup is a binary search instead of a rescan of the prefix.
struct CharOffsets {
    starts: Option<Vec<usize>>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let starts = (!text.is_ascii()).then(|| text.char_indices().map(|(i, _)| i).collect());
        Self { starts }
    }

    fn char_index(&self, byte: usize) -> usize {
        match &self.starts {
            None => byte,
            Some(starts) => starts.partition_point(|&start| start < byte),
        }
    }
}
