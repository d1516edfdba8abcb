// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Detected PII spans and the overlap resolution applied before anonymization.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A detected PII occurrence.
///
/// `start` and `end` form a half-open range of character (Unicode scalar)
/// offsets into the text the span was detected against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

impl Span {
    pub fn new(entity_type: impl Into<String>, start: usize, end: usize, score: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            score,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Checks the span against a text of `char_len` characters.
    pub fn validate(&self, char_len: usize) -> Result<(), ValidationError> {
        if self.start > self.end {
            return Err(ValidationError::InvertedRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.end > char_len {
            return Err(ValidationError::OutOfBounds {
                end: self.end,
                len: char_len,
            });
        }
        validate_score(self.score)
    }
}

pub(crate) fn validate_score(score: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&score) {
        Ok(())
    } else {
        Err(ValidationError::ScoreOutOfRange(score))
    }
}

/// Ranking used when two spans claim the same characters: higher score,
/// then longer range, then leftmost start, then entity type name.
fn precedence(a: &Span, b: &Span) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.entity_type.cmp(&b.entity_type))
}

/// Resolves overlapping spans and returns the survivors in ascending `start`
/// order.
///
/// Spans are taken in [`precedence`] order. A span lying inside an accepted
/// one is discarded. A span that only partly overlaps accepted spans widens
/// the best of them to cover the union, keeping that span's entity type and
/// score, so no character detected as PII is left out of a replacement.
/// Empty spans are discarded as they rewrite nothing.
pub fn resolve_overlaps(spans: &[Span]) -> Vec<Span> {
    let mut ranked: Vec<&Span> = spans.iter().filter(|s| !s.is_empty()).collect();
    ranked.sort_by(|a, b| precedence(a, b));

    // kept in precedence order until the final sort
    let mut accepted: Vec<Span> = Vec::with_capacity(ranked.len());
    for span in ranked {
        let overlapping: Vec<usize> = accepted
            .iter()
            .enumerate()
            .filter(|(_, kept)| kept.overlaps(span))
            .map(|(i, _)| i)
            .collect();
        let Some((&winner, absorbed)) = overlapping.split_first() else {
            accepted.push(span.clone());
            continue;
        };

        let start = overlapping
            .iter()
            .map(|&i| accepted[i].start)
            .fold(span.start, usize::min);
        let end = overlapping
            .iter()
            .map(|&i| accepted[i].end)
            .fold(span.end, usize::max);
        accepted[winner].start = start;
        accepted[winner].end = end;
        for &i in absorbed.iter().rev() {
            accepted.remove(i);
        }
    }

    accepted.sort_by_key(|s| s.start);
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bounds() {
        assert!(Span::new("EMAIL_ADDRESS", 0, 5, 1.0).validate(5).is_ok());
        assert_eq!(
            Span::new("EMAIL_ADDRESS", 2, 6, 1.0).validate(5),
            Err(ValidationError::OutOfBounds { end: 6, len: 5 })
        );
        assert_eq!(
            Span::new("EMAIL_ADDRESS", 4, 2, 1.0).validate(5),
            Err(ValidationError::InvertedRange { start: 4, end: 2 })
        );
        assert_eq!(
            Span::new("EMAIL_ADDRESS", 0, 2, 1.5).validate(5),
            Err(ValidationError::ScoreOutOfRange(1.5))
        );
        assert!(Span::new("EMAIL_ADDRESS", 0, 2, f64::NAN).validate(5).is_err());
    }

    #[test]
    fn test_higher_score_wins_overlap() {
        let spans = vec![
            Span::new("US_BANK_NUMBER", 0, 16, 0.05),
            Span::new("CREDIT_CARD", 0, 16, 1.0),
        ];
        let resolved = resolve_overlaps(&spans);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].entity_type, "CREDIT_CARD");
    }

    #[test]
    fn test_longer_span_breaks_score_tie() {
        let spans = vec![
            Span::new("PHONE_NUMBER", 4, 10, 0.75),
            Span::new("LOCATION", 2, 14, 0.75),
        ];
        let resolved = resolve_overlaps(&spans);
        assert_eq!(resolved, vec![Span::new("LOCATION", 2, 14, 0.75)]);
    }

    #[test]
    fn test_partial_overlap_merges_into_winner() {
        // "742 Evergreen Terrace Springfield, IL 62704"
        let spans = vec![
            Span::new("LOCATION", 0, 21, 0.5),
            Span::new("LOCATION", 4, 43, 0.6),
        ];
        assert_eq!(resolve_overlaps(&spans), vec![Span::new("LOCATION", 0, 43, 0.6)]);

        let spans = vec![
            Span::new("PHONE_NUMBER", 5, 17, 0.75),
            Span::new("DATE_TIME", 12, 22, 0.6),
        ];
        assert_eq!(resolve_overlaps(&spans), vec![Span::new("PHONE_NUMBER", 5, 22, 0.75)]);
    }

    #[test]
    fn test_bridging_span_joins_accepted_spans() {
        let spans = vec![
            Span::new("EMAIL_ADDRESS", 0, 10, 1.0),
            Span::new("CREDIT_CARD", 20, 30, 0.9),
            Span::new("US_BANK_NUMBER", 8, 22, 0.05),
            Span::new("DATE_TIME", 40, 45, 0.6),
        ];
        assert_eq!(
            resolve_overlaps(&spans),
            vec![
                Span::new("EMAIL_ADDRESS", 0, 30, 1.0),
                Span::new("DATE_TIME", 40, 45, 0.6),
            ]
        );
    }

    #[test]
    fn test_entity_name_breaks_full_tie() {
        let spans = vec![
            Span::new("US_PASSPORT", 0, 9, 0.05),
            Span::new("US_BANK_NUMBER", 0, 9, 0.05),
        ];
        let resolved = resolve_overlaps(&spans);
        assert_eq!(resolved[0].entity_type, "US_BANK_NUMBER");

        // input order does not matter
        let reversed: Vec<Span> = spans.into_iter().rev().collect();
        assert_eq!(resolve_overlaps(&reversed), resolved);
    }

    #[test]
    fn test_disjoint_spans_sorted_by_start() {
        let spans = vec![
            Span::new("EMAIL_ADDRESS", 20, 30, 1.0),
            Span::new("PHONE_NUMBER", 0, 12, 0.75),
            Span::new("DATE_TIME", 12, 20, 0.6),
        ];
        let starts: Vec<usize> = resolve_overlaps(&spans).iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![0, 12, 20]);
    }

    #[test]
    fn test_empty_spans_dropped() {
        let spans = vec![Span::new("EMAIL_ADDRESS", 3, 3, 1.0)];
        assert!(resolve_overlaps(&spans).is_empty());
    }
}
