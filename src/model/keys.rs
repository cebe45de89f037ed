//! Validated registry keys.
//!
//! Keys are open-ended strings checked against a character pattern when they
//! are created through the API. Deserialization accepts any string so that
//! historical data survives registry edits; whether a key still resolves is a
//! read-time question answered by the registry.

use std::borrow::Borrow;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LexgraphError, Result};

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\p{L}\p{N}_.:\-]+$").expect("Invalid key pattern"))
}

macro_rules! registry_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Trim and validate a raw key.
            pub fn parse(raw: &str) -> Result<Self> {
                let trimmed = raw.trim();
                if key_pattern().is_match(trimmed) {
                    Ok(Self(trimmed.to_string()))
                } else {
                    Err(LexgraphError::InvalidKey(raw.to_string()))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::str::FromStr for $name {
            type Err = LexgraphError;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }
    };
}

registry_key!(
    /// Key into the relation type registry, e.g. `hypernym`.
    RelationKey
);

registry_key!(
    /// Key into the part-of-speech registry, e.g. `noun`.
    PosKey
);
