//! In-memory resolver answering from a fixed table.

use std::collections::HashMap;

use citeline_core::{Identifier, Result};
use citeline_graph::{Resolution, ResolvedWork};
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};

use crate::resolver::{BatchResponse, MetadataResolver, ResolutionFailure};

/// Resolves identifiers from a preloaded table; unknown identifiers fail.
///
/// Records every batch it receives, which makes it the resolver of choice
/// for offline runs and tests.
#[derive(Default)]
pub struct FixedResolver {
    entries: RwLock<HashMap<Identifier, Resolution>>,
    batches: Mutex<Vec<Vec<Identifier>>>,
}

impl FixedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a successful lookup. Malformed identifiers are ignored.
    pub fn with_work(self, work: ResolvedWork) -> Self {
        self.insert_work(work);
        self
    }

    /// Register a failing lookup.
    pub fn with_failure(self, raw: &str, reason: &str) -> Self {
        self.insert_failure(raw, reason);
        self
    }

    pub fn insert_failure(&self, raw: &str, reason: &str) {
        if let Ok(id) = Identifier::parse(raw) {
            self.entries.write().insert(
                id,
                Resolution::Failed {
                    reason: reason.to_string(),
                },
            );
        }
    }

    pub fn insert_work(&self, work: ResolvedWork) {
        if let Ok(id) = Identifier::parse(&work.identifier) {
            self.entries.write().insert(id, Resolution::Resolved(work));
        }
    }

    /// Identifiers of every batch received so far.
    pub fn batches(&self) -> Vec<Vec<Identifier>> {
        self.batches.lock().clone()
    }

    fn answer(&self, identifiers: &[Identifier]) -> BatchResponse {
        self.batches.lock().push(identifiers.to_vec());

        let entries = self.entries.read();
        let mut response = BatchResponse::default();
        for id in identifiers {
            match entries.get(id) {
                Some(Resolution::Resolved(work)) => response.resolved.push(work.clone()),
                Some(Resolution::Failed { reason }) => response.failures.push(ResolutionFailure {
                    identifier: id.to_string(),
                    reason: reason.clone(),
                }),
                None => response.failures.push(ResolutionFailure {
                    identifier: id.to_string(),
                    reason: format!("Unknown identifier {}", id),
                }),
            }
        }
        response
    }
}

impl MetadataResolver for FixedResolver {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn resolve_batch<'a>(
        &'a self,
        identifiers: &'a [Identifier],
    ) -> BoxFuture<'a, Result<BatchResponse>> {
        let response = self.answer(identifiers);
        async move { Ok(response) }.boxed()
    }
}
