//! Record and resolution payload types.

use citeline_core::{Identifier, PublicationDate};
use serde::{Deserialize, Serialize};

/// How an identifier entered the graph.
///
/// Ordered so that `max` is the membership join: `UserSelected` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    /// Reached only as another record's reference.
    Discovered,
    /// Explicitly added by the user.
    UserSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionState {
    Pending,
    Resolved,
    Failed,
}

/// Resolved (or pending, or failed) bibliographic data for one identifier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    pub identifier: Identifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<PublicationDate>,
    /// In author order.
    pub authors: Vec<Author>,
    /// One-hop outgoing citations, deduplicated, in payload order.
    pub references: Vec<Identifier>,
    pub membership: Membership,
    pub state: ResolutionState,
    /// Why the last lookup failed: set on `Failed` records, and on
    /// `Resolved` records whose latest refresh failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Reference hops from the nearest user-selected record.
    pub depth: u32,
    /// Discovery sequence. Unique per incarnation of the identifier.
    pub seq: u64,
}

impl MetadataRecord {
    pub(crate) fn pending(identifier: Identifier, membership: Membership, depth: u32, seq: u64) -> Self {
        Self {
            identifier,
            title: None,
            published: None,
            authors: Vec::new(),
            references: Vec::new(),
            membership,
            state: ResolutionState::Pending,
            failure_reason: None,
            depth,
            seq,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state == ResolutionState::Resolved
    }

    /// Representative timestamp, if the record carries a usable date.
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.published.as_ref().and_then(|d| d.timestamp_millis())
    }

    /// Display form of the publication date.
    pub fn date_display(&self) -> Option<String> {
        self.published.as_ref().map(|d| d.display())
    }
}

/// A contributor in publication order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    /// Bare ORCID iD (`0000-0002-1825-0097`), without the URL prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orcid: Option<String>,
}

impl From<&str> for Author {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_string(),
            orcid: None,
        }
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Success payload from a metadata resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedWork {
    /// Identifier as reported by the resolver (normalized on apply).
    pub identifier: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub published: Option<PublicationDate>,
    #[serde(default)]
    pub references: Vec<String>,
}

/// Outcome of resolving one identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedWork),
    Failed { reason: String },
}

/// What `apply_resolution` did.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    /// State of the record after applying.
    pub state: ResolutionState,
    /// Identifiers newly inserted by reference expansion.
    pub discovered: Vec<Identifier>,
    /// Reason a refresh of an already-resolved record failed. The record
    /// stays `Resolved` with its earlier data.
    pub refresh_failure: Option<String>,
}

/// Record counts for status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphCounts {
    pub total: usize,
    pub resolved: usize,
    pub failed: usize,
    pub pending: usize,
    pub user_selected: usize,
    pub discovered: usize,
}
