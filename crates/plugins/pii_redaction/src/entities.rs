// Copyright 2026
// SPDX-License-Identifier: Apache-2.0
//
// Entity type identifiers and the ordered set the detector is asked for.

use serde::{Deserialize, Serialize};

pub const EMAIL_ADDRESS: &str = "EMAIL_ADDRESS";
pub const CREDIT_CARD: &str = "CREDIT_CARD";
pub const US_SOCIAL_SECURITY_NUMBER: &str = "US_SOCIAL_SECURITY_NUMBER";
pub const PHONE_NUMBER: &str = "PHONE_NUMBER";
pub const IP_ADDRESS: &str = "IP_ADDRESS";
pub const US_BANK_NUMBER: &str = "US_BANK_NUMBER";
pub const US_DRIVER_LICENSE: &str = "US_DRIVER_LICENSE";
pub const US_PASSPORT: &str = "US_PASSPORT";
pub const DATE_TIME: &str = "DATE_TIME";
pub const LOCATION: &str = "LOCATION";
pub const MEDICAL_LICENSE: &str = "MEDICAL_LICENSE";
pub const CRYPTO: &str = "CRYPTO";

/// Entity types requested when configuration does not say otherwise.
pub const DEFAULT_ENTITY_TYPES: &[&str] = &[
    EMAIL_ADDRESS,
    CREDIT_CARD,
    US_SOCIAL_SECURITY_NUMBER,
    PHONE_NUMBER,
    IP_ADDRESS,
    US_BANK_NUMBER,
    US_DRIVER_LICENSE,
    US_PASSPORT,
    DATE_TIME,
    LOCATION,
    MEDICAL_LICENSE,
    CRYPTO,
];

/// Ordered, de-duplicated set of entity type identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct EntityTypeSet {
    types: Vec<String>,
}

impl EntityTypeSet {
    /// Builds a set keeping the first occurrence of each identifier.
    /// Blank identifiers are ignored.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for entity in types {
            let entity = entity.into().trim().to_string();
            if !entity.is_empty() && !out.contains(&entity) {
                out.push(entity);
            }
        }
        Self { types: out }
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.types.iter().any(|t| t == entity_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for EntityTypeSet {
    fn default() -> Self {
        Self::new(DEFAULT_ENTITY_TYPES.iter().copied())
    }
}

impl From<Vec<String>> for EntityTypeSet {
    fn from(types: Vec<String>) -> Self {
        Self::new(types)
    }
}

impl From<EntityTypeSet> for Vec<String> {
    fn from(set: EntityTypeSet) -> Self {
        set.types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set() {
        let set = EntityTypeSet::default();
        assert_eq!(set.len(), 12);
        assert_eq!(set.iter().next(), Some(EMAIL_ADDRESS));
        assert!(set.contains(CRYPTO));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let set = EntityTypeSet::new(["PHONE_NUMBER", "EMAIL_ADDRESS", "PHONE_NUMBER", " ", ""]);
        let types: Vec<&str> = set.iter().collect();
        assert_eq!(types, vec!["PHONE_NUMBER", "EMAIL_ADDRESS"]);
    }

    #[test]
    fn test_deserialize_from_list() {
        let set: EntityTypeSet = serde_json::from_str(r#"["CRYPTO", "CRYPTO", "LOCATION"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["CRYPTO","LOCATION"]"#);
    }
}
