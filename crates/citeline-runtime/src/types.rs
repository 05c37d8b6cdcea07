//! Runtime report types.

use citeline_core::Identifier;
use citeline_graph::GraphCounts;
use serde::Serialize;

/// An identifier that came back as a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedIdentifier {
    pub identifier: Identifier,
    pub reason: String,
}

/// What one resolution batch did to the graph.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// Identifiers sent to the resolver.
    pub requested: usize,
    pub resolved: Vec<Identifier>,
    pub failed: Vec<FailedIdentifier>,
    /// User-selected identifiers removed because they failed.
    pub evicted: Vec<Identifier>,
    /// Results dropped because their record was removed in flight.
    pub discarded: Vec<Identifier>,
    /// Identifiers added by reference expansion.
    pub discovered: Vec<Identifier>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.requested == 0
    }
}

/// Result of running batches until nothing is pending.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub rounds: usize,
    pub batches: Vec<BatchReport>,
    pub counts: GraphCounts,
}
