// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Built-in PII recognizers: compiled patterns, base scores, context words and
// checksum validators.

use crate::entities::{
    CREDIT_CARD, CRYPTO, DATE_TIME, EMAIL_ADDRESS, IP_ADDRESS, LOCATION, MEDICAL_LICENSE,
    PHONE_NUMBER, US_BANK_NUMBER, US_DRIVER_LICENSE, US_PASSPORT, US_SOCIAL_SECURITY_NUMBER,
};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Score bonus applied when a context word precedes a match.
pub const CONTEXT_SIMILARITY_FACTOR: f64 = 0.35;
/// Lowest score a context-enhanced match may end up with.
pub const MIN_SCORE_WITH_CONTEXT: f64 = 0.4;
/// Number of words before a match searched for context words.
pub const CONTEXT_WINDOW_WORDS: usize = 5;

/// A single pattern that recognizes one entity type.
#[derive(Debug, Clone)]
pub struct Recognizer {
    pub entity_type: String,
    pub regex: Regex,
    pub score: f64,
    /// Lowercase words that raise the score when found shortly before a match.
    pub context: Vec<String>,
    /// Rejects candidate matches that fail a checksum or range rule.
    pub validator: Option<fn(&str) -> bool>,
}

impl Recognizer {
    pub fn new(entity_type: impl Into<String>, regex: Regex, score: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            regex,
            score,
            context: Vec::new(),
            validator: None,
        }
    }

    pub fn with_context<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.context = words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn with_validator(mut self, validator: fn(&str) -> bool) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        self.validator.is_none_or(|validate| validate(candidate))
    }

    /// Score for a match beginning at byte offset `start` of `text`.
    pub fn score_at(&self, text: &str, start: usize) -> f64 {
        if self.context.is_empty() || !self.has_context_before(text, start) {
            return self.score;
        }
        (self.score + CONTEXT_SIMILARITY_FACTOR)
            .max(MIN_SCORE_WITH_CONTEXT)
            .min(1.0)
    }

    fn has_context_before(&self, text: &str, start: usize) -> bool {
        let Some(prefix) = text.get(..start) else {
            return false;
        };
        prefix
            .split_whitespace()
            .rev()
            .take(CONTEXT_WINDOW_WORDS)
            .map(|word| {
                word.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .any(|word| self.context.iter().any(|ctx| *ctx == word))
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in PII pattern must compile")
}

/// Recognizers shipped for every default entity type.
pub static BUILTIN_RECOGNIZERS: Lazy<Vec<Recognizer>> = Lazy::new(|| {
    vec![
        Recognizer::new(
            EMAIL_ADDRESS,
            compile(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
            1.0,
        ),
        // Grouped card shape: a stray digit group next to the number must not
        // widen the match past the Luhn check.
        Recognizer::new(
            CREDIT_CARD,
            compile(
                r"\b(?:4\d{3}|5[0-5]\d{2}|6\d{3}|1\d{3}|3\d{3})[- ]?\d{3,4}[- ]?\d{3,4}[- ]?\d{3,5}\b",
            ),
            1.0,
        )
        .with_validator(is_valid_credit_card),
        Recognizer::new(
            US_SOCIAL_SECURITY_NUMBER,
            compile(r"\b\d{3}[- .]\d{2}[- .]\d{4}\b"),
            0.85,
        )
        .with_validator(is_valid_ssn),
        Recognizer::new(
            PHONE_NUMBER,
            compile(r"(?:\+1[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b"),
            0.75,
        ),
        Recognizer::new(
            IP_ADDRESS,
            compile(
                r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b",
            ),
            0.6,
        ),
        Recognizer::new(
            IP_ADDRESS,
            compile(r"\b(?:[0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4}\b"),
            0.6,
        ),
        Recognizer::new(
            IP_ADDRESS,
            compile(r"\b(?:[0-9A-Fa-f]{1,4}:){1,6}:[0-9A-Fa-f]{1,4}\b"),
            0.6,
        ),
        // leading `::` (loopback, IPv4-mapped); `\B` keeps it off the tail of a word
        Recognizer::new(
            IP_ADDRESS,
            compile(
                r"\B::(?:[0-9A-Fa-f]{1,4}:){0,5}(?:(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)|[0-9A-Fa-f]{1,4})\b",
            ),
            0.6,
        ),
        // trailing `::`, e.g. a bare prefix like `fe80::`
        Recognizer::new(
            IP_ADDRESS,
            compile(r"\b(?:[0-9A-Fa-f]{1,4}:){1,7}:\B"),
            0.6,
        ),
        Recognizer::new(US_BANK_NUMBER, compile(r"\b\d{8,17}\b"), 0.05).with_context([
            "bank", "account", "acct", "checking", "savings", "routing",
        ]),
        Recognizer::new(
            US_DRIVER_LICENSE,
            compile(r"\b[A-Z](?:\d{7}|\d{12})\b"),
            0.3,
        )
        .with_context(["driver", "drivers", "license", "licence", "dl"]),
        Recognizer::new(US_PASSPORT, compile(r"\b\d{9}\b"), 0.05).with_context(["passport"]),
        Recognizer::new(US_PASSPORT, compile(r"\b[A-Z]\d{8}\b"), 0.1).with_context(["passport"]),
        Recognizer::new(
            DATE_TIME,
            compile(
                r"\b\d{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12]\d|3[01])(?:[T ](?:[01]\d|2[0-3]):[0-5]\d(?::[0-5]\d(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?\b",
            ),
            0.6,
        ),
        Recognizer::new(
            DATE_TIME,
            compile(r"\b(?:0?[1-9]|1[0-2])/(?:0?[1-9]|[12]\d|3[01])/(?:\d{4}|\d{2})\b"),
            0.6,
        ),
        Recognizer::new(
            DATE_TIME,
            compile(
                r"(?i)\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}\b",
            ),
            0.6,
        ),
        Recognizer::new(
            LOCATION,
            compile(
                r"\b\d{1,6}\s+(?:[A-Z][a-z]+\s+){1,3}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Drive|Dr|Lane|Ln|Court|Ct|Way|Place|Pl|Terrace|Parkway|Pkwy)\b",
            ),
            0.5,
        ),
        Recognizer::new(
            LOCATION,
            compile(r"\b[A-Z][a-z]+(?:\s[A-Z][a-z]+)*,\s[A-Z]{2}\s\d{5}(?:-\d{4})?\b"),
            0.6,
        ),
        Recognizer::new(
            MEDICAL_LICENSE,
            compile(r"\b[ABCDEFGHJKLMPRSTUXabcdefghjklmprstux][A-Za-z9]\d{7}\b"),
            0.4,
        )
        .with_validator(is_valid_dea_number),
        Recognizer::new(
            CRYPTO,
            compile(r"\b[13][1-9A-HJ-NP-Za-km-z]{25,34}\b"),
            1.0,
        )
        .with_validator(is_valid_base58check_address),
        Recognizer::new(CRYPTO, compile(r"\bbc1[ac-hj-np-z02-9]{11,71}\b"), 0.8),
    ]
});

fn digits_of(candidate: &str) -> Vec<u32> {
    candidate.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Luhn checksum over the digits of a card number candidate.
pub fn is_valid_credit_card(candidate: &str) -> bool {
    let digits = digits_of(candidate);
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Rejects SSN candidates with mixed separators or never-issued number ranges.
pub fn is_valid_ssn(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if !candidate.is_ascii() || bytes.len() != 11 || bytes[3] != bytes[6] {
        return false;
    }
    let area = &candidate[0..3];
    let group = &candidate[4..6];
    let serial = &candidate[7..11];
    area != "000" && area != "666" && !area.starts_with('9') && group != "00" && serial != "0000"
}

/// DEA registration number checksum.
pub fn is_valid_dea_number(candidate: &str) -> bool {
    let digits: Vec<u32> = candidate
        .get(2..)
        .map(digits_of)
        .unwrap_or_default();
    if digits.len() != 7 {
        return false;
    }
    let sum = digits[0] + digits[2] + digits[4] + 2 * (digits[1] + digits[3] + digits[5]);
    sum % 10 == digits[6]
}

const BASE58_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn base58_decode(encoded: &str) -> Option<Vec<u8>> {
    // little-endian accumulator
    let mut bytes: Vec<u8> = Vec::new();
    for c in encoded.bytes() {
        let mut carry = BASE58_ALPHABET.iter().position(|&a| a == c)? as u32;
        for byte in bytes.iter_mut() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let leading_zeros = encoded.bytes().take_while(|&c| c == b'1').count();
    bytes.extend(std::iter::repeat_n(0u8, leading_zeros));
    bytes.reverse();
    Some(bytes)
}

/// Base58Check validation for legacy (P2PKH) and script (P2SH) Bitcoin
/// addresses.
pub fn is_valid_base58check_address(candidate: &str) -> bool {
    let Some(decoded) = base58_decode(candidate) else {
        return false;
    };
    if decoded.len() != 25 || !matches!(decoded[0], 0x00 | 0x05) {
        return false;
    }
    let checksum = Sha256::digest(Sha256::digest(&decoded[..21]));
    checksum[..4] == decoded[21..]
}
