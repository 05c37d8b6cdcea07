//! Resolver trait and batch result types.

use citeline_core::{Identifier, Result};
use citeline_graph::{Resolution, ResolvedWork};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// A per-identifier error inside an otherwise successful batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionFailure {
    pub identifier: String,
    pub reason: String,
}

/// Structured result set of one batch call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub resolved: Vec<ResolvedWork>,
    pub failures: Vec<ResolutionFailure>,
}

impl BatchResponse {
    pub fn len(&self) -> usize {
        self.resolved.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into `(raw identifier, resolution)` pairs, successes first.
    pub fn into_resolutions(self) -> Vec<(String, Resolution)> {
        let resolved = self
            .resolved
            .into_iter()
            .map(|work| (work.identifier.clone(), Resolution::Resolved(work)));
        let failed = self
            .failures
            .into_iter()
            .map(|f| (f.identifier, Resolution::Failed { reason: f.reason }));
        resolved.chain(failed).collect()
    }
}

/// External metadata resolution service.
///
/// One call resolves a whole batch. An `Err` means the batch as a whole
/// could not be attempted; individual lookups that fail are reported in
/// [`BatchResponse::failures`].
pub trait MetadataResolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve_batch<'a>(
        &'a self,
        identifiers: &'a [Identifier],
    ) -> BoxFuture<'a, Result<BatchResponse>>;
}
