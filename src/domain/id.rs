//! Short hash-based IDs for catalog records
//!
//! ID Format:
//! - Product IDs: `p-{7-char-hash}` (e.g., `p-7f2b4c1`)
//! - Nomenclature IDs: `n-{7-char-hash}`
//! - Stock movement IDs: `m-{7-char-hash}`
//!
//! The hash is derived from a human-facing field (product reference,
//! parent id, ...) plus the creation timestamp, so the same reference
//! created at different times produces different IDs.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid {kind} ID format: expected '{prefix}-{{7-char-hash}}', got '{input}'")]
    InvalidFormat {
        kind: &'static str,
        prefix: char,
        input: String,
    },
}

/// Generates a 7-character hash from a seed string and timestamp
fn generate_hash(seed: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", seed, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..7].to_string()
}

macro_rules! short_id {
    ($name:ident, $kind:literal, $prefix:literal) => {
        #[doc = concat!("ID in the format `", $prefix, "-{7-char-hash}`")]
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(try_from = "String", into = "String")]
        pub struct $name {
            hash: String,
        }

        impl $name {
            /// Creates a new ID from a seed string and timestamp
            pub fn new(seed: &str, timestamp: DateTime<Utc>) -> Self {
                Self {
                    hash: generate_hash(seed, timestamp),
                }
            }

            /// Returns the hash portion of the ID
            pub fn hash(&self) -> &str {
                &self.hash
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.hash)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                let invalid = || IdError::InvalidFormat {
                    kind: $kind,
                    prefix: $prefix,
                    input: s.to_string(),
                };

                let hash = s
                    .strip_prefix($prefix)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .ok_or_else(invalid)?;

                if hash.len() != 7 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(invalid());
                }

                Ok(Self {
                    hash: hash.to_string(),
                })
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.to_string()
            }
        }
    };
}

short_id!(ProductId, "product", 'p');
short_id!(NomenclatureId, "nomenclature", 'n');
short_id!(MovementId, "movement", 'm');
