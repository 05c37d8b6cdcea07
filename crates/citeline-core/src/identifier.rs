//! Identifier normalization.
//!
//! Every DOI entering the system goes through [`Identifier::parse`] before any
//! lookup or insertion, so `"10.1109/ABC"`, `" 10.1109/abc "` and
//! `"https://doi.org/10.1109/abc"` all name the same node.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Resolver URL forms that prefix a bare DOI. Matched after lower-casing.
const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// A normalized publication identifier: trimmed, lower-cased, prefix-free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Normalize a raw identifier string.
    ///
    /// Fails with [`Error::MalformedIdentifier`] when nothing is left after
    /// normalization or when the remainder contains whitespace or control
    /// characters.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut normalized = raw.trim().to_lowercase();

        for prefix in DOI_PREFIXES {
            if let Some(rest) = normalized.strip_prefix(prefix) {
                normalized = rest.trim_start().to_string();
                break;
            }
        }

        if normalized.is_empty()
            || normalized
                .chars()
                .any(|c| c.is_whitespace() || c.is_control())
        {
            return Err(Error::MalformedIdentifier(raw.to_string()));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Identifier {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl TryFrom<&str> for Identifier {
    type Error = Error;

    fn try_from(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}
