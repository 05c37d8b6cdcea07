//! Resolution batch coordinator.
//!
//! Collects every pending identifier (plus forced refreshes), resolves them in
//! one resolver call and applies the results to the graph in a single
//! critical section. Only one batch runs at a time; the graph lock is never
//! held across the resolver call.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use citeline_core::{Error, Identifier, Result};
use citeline_graph::{CitationGraph, Membership, Resolution, ResolutionState};
use citeline_resolve::MetadataResolver;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::types::{BatchReport, FailedIdentifier};

pub struct ResolutionCoordinator {
    resolver: Arc<dyn MetadataResolver>,
    in_flight: tokio::sync::Mutex<()>,
    forced: Mutex<BTreeSet<Identifier>>,
}

impl ResolutionCoordinator {
    pub fn new(resolver: Arc<dyn MetadataResolver>) -> Self {
        Self {
            resolver,
            in_flight: tokio::sync::Mutex::new(()),
            forced: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn resolver_name(&self) -> &'static str {
        self.resolver.name()
    }

    /// Whether a batch is currently awaiting the resolver.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Include an already-resolved identifier in the next batch.
    pub fn force(&self, id: Identifier) {
        self.forced.lock().insert(id);
    }

    pub fn has_forced(&self) -> bool {
        !self.forced.lock().is_empty()
    }

    /// Run one batch, waiting for any batch already in flight to finish.
    pub async fn run_batch(&self, graph: &Mutex<CitationGraph>) -> Result<BatchReport> {
        let _guard = self.in_flight.lock().await;
        self.execute(graph).await
    }

    /// Run one batch, or fail with [`Error::BatchInFlight`] if one is running.
    pub async fn try_run_batch(&self, graph: &Mutex<CitationGraph>) -> Result<BatchReport> {
        let _guard = self.in_flight.try_lock().map_err(|_| Error::BatchInFlight)?;
        self.execute(graph).await
    }

    async fn execute(&self, graph: &Mutex<CitationGraph>) -> Result<BatchReport> {
        let tickets = self.collect_tickets(graph);
        if tickets.is_empty() {
            return Ok(BatchReport::default());
        }

        let batch_id = uuid::Uuid::new_v4().to_string();
        let identifiers: Vec<Identifier> = tickets.iter().map(|(id, _)| id.clone()).collect();
        info!(
            "Batch {}: resolving {} identifiers via {}",
            batch_id,
            identifiers.len(),
            self.resolver.name()
        );

        let response = match self.resolver.resolve_batch(&identifiers).await {
            Ok(response) => response,
            Err(e) => {
                error!("Batch {} failed: {}", batch_id, e);
                // Pending records stay pending; forced refreshes go back in the queue.
                let graph = graph.lock();
                let mut forced = self.forced.lock();
                for (id, _) in &tickets {
                    if graph.get(id.as_str()).map_or(false, |r| r.is_resolved()) {
                        forced.insert(id.clone());
                    }
                }
                return Err(e);
            }
        };

        let mut results: HashMap<Identifier, Resolution> = HashMap::new();
        for (raw, resolution) in response.into_resolutions() {
            match Identifier::parse(&raw) {
                Ok(id) if identifiers.contains(&id) => {
                    results.insert(id, resolution);
                }
                _ => warn!("Batch {}: ignoring unrequested result for {:?}", batch_id, raw),
            }
        }

        let mut report = BatchReport {
            batch_id: Some(batch_id.clone()),
            requested: identifiers.len(),
            ..BatchReport::default()
        };

        let mut graph = graph.lock();
        for (id, seq) in tickets {
            let resolution = results.remove(&id).unwrap_or_else(|| Resolution::Failed {
                reason: "Resolver returned no result".into(),
            });

            // Removed (or removed and re-added) while the batch was in flight.
            if graph.incarnation(&id) != Some(seq) {
                debug!("Batch {}: discarding stale result for {}", batch_id, id);
                report.discarded.push(id);
                continue;
            }

            let outcome = match graph.apply_resolution(&id, resolution) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Batch {}: could not apply result for {}: {}", batch_id, id, e);
                    continue;
                }
            };
            report.discovered.extend(outcome.discovered);

            match outcome.state {
                ResolutionState::Resolved => match outcome.refresh_failure {
                    Some(reason) => {
                        warn!("Batch {}: refresh of {} failed: {}", batch_id, id, reason);
                        report.failed.push(FailedIdentifier {
                            identifier: id,
                            reason,
                        });
                    }
                    None => report.resolved.push(id),
                },
                ResolutionState::Failed => {
                    let (reason, membership) = graph
                        .get(id.as_str())
                        .map(|r| (r.failure_reason.clone().unwrap_or_default(), r.membership))
                        .unwrap_or((String::new(), Membership::Discovered));
                    warn!("Batch {}: {} failed: {}", batch_id, id, reason);

                    if membership == Membership::UserSelected {
                        graph.remove_identifier(&id);
                        warn!("Removed failed seed {}", id);
                        report.evicted.push(id.clone());
                    }
                    report.failed.push(FailedIdentifier {
                        identifier: id,
                        reason,
                    });
                }
                ResolutionState::Pending => {}
            }
        }

        info!(
            "Batch {} done: {} resolved, {} failed, {} discovered",
            batch_id,
            report.resolved.len(),
            report.failed.len(),
            report.discovered.len()
        );
        Ok(report)
    }

    /// Pending records, then forced refreshes still present and resolved.
    fn collect_tickets(&self, graph: &Mutex<CitationGraph>) -> Vec<(Identifier, u64)> {
        let graph = graph.lock();
        let mut tickets = graph.pending();
        let forced = std::mem::take(&mut *self.forced.lock());
        for id in forced {
            if tickets.iter().any(|(t, _)| *t == id) {
                continue;
            }
            if let Some(record) = graph.get(id.as_str()).filter(|r| r.is_resolved()) {
                tickets.push((id, record.seq));
            }
        }
        tickets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citeline_graph::ResolvedWork;
    use citeline_resolve::{BatchResponse, FixedResolver};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use tokio::sync::Notify;

    fn work(doi: &str, refs: &[&str]) -> ResolvedWork {
        ResolvedWork {
            identifier: doi.into(),
            title: Some(doi.into()),
            published: Some(citeline_core::PublicationDate::parse("2021")),
            references: refs.iter().map(|r| r.to_string()).collect(),
            ..ResolvedWork::default()
        }
    }

    fn seeded(dois: &[&str]) -> Mutex<CitationGraph> {
        let mut graph = CitationGraph::default();
        for doi in dois {
            graph.upsert(doi, Membership::UserSelected).unwrap();
        }
        Mutex::new(graph)
    }

    /// Holds every batch until released.
    struct GatedResolver {
        inner: FixedResolver,
        gate: Notify,
    }

    impl MetadataResolver for GatedResolver {
        fn name(&self) -> &'static str {
            "gated"
        }

        fn resolve_batch<'a>(
            &'a self,
            identifiers: &'a [Identifier],
        ) -> BoxFuture<'a, Result<BatchResponse>> {
            async move {
                self.gate.notified().await;
                self.inner.resolve_batch(identifiers).await
            }
            .boxed()
        }
    }

    struct BrokenResolver;

    impl MetadataResolver for BrokenResolver {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn resolve_batch<'a>(
            &'a self,
            _identifiers: &'a [Identifier],
        ) -> BoxFuture<'a, Result<BatchResponse>> {
            async { Err(Error::Http("connection refused".into())) }.boxed()
        }
    }

    #[tokio::test]
    async fn test_seed_expands_to_discovered() {
        let resolver = Arc::new(
            FixedResolver::new().with_work(work("10.1000/seed", &["10.1000/refA", "10.1000/refB"])),
        );
        let coordinator = ResolutionCoordinator::new(resolver.clone());
        let graph = seeded(&["10.1000/seed"]);

        let report = coordinator.run_batch(&graph).await.unwrap();
        assert_eq!(report.requested, 1);
        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.discovered.len(), 2);

        let counts = graph.lock().counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.user_selected, 1);
        assert_eq!(counts.discovered, 2);
    }

    #[tokio::test]
    async fn test_failed_seed_is_evicted() {
        let resolver = Arc::new(
            FixedResolver::new()
                .with_work(work("10.1/good", &[]))
                .with_failure("10.1/bad", "404 Not Found"),
        );
        let coordinator = ResolutionCoordinator::new(resolver);
        let graph = seeded(&["10.1/bad", "10.1/good"]);

        let report = coordinator.run_batch(&graph).await.unwrap();
        assert_eq!(report.evicted, vec![Identifier::parse("10.1/bad").unwrap()]);
        assert_eq!(report.failed[0].reason, "404 Not Found");
        assert_eq!(report.resolved.len(), 1);

        let graph = graph.lock();
        assert!(graph.get("10.1/bad").is_none());
        assert_eq!(graph.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_discovered_is_kept() {
        let resolver = Arc::new(FixedResolver::new().with_work(work("10.1/seed", &["10.1/gone"])));
        let coordinator = ResolutionCoordinator::new(resolver);
        let graph = seeded(&["10.1/seed"]);

        coordinator.run_batch(&graph).await.unwrap();
        let report = coordinator.run_batch(&graph).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(report.evicted.is_empty());
        assert_eq!(
            graph.lock().get("10.1/gone").unwrap().state,
            ResolutionState::Failed
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_reported_as_failure() {
        let resolver = Arc::new(FixedResolver::new().with_work(work("10.1/x", &[])));
        let coordinator = ResolutionCoordinator::new(resolver.clone());
        let graph = seeded(&["10.1/x"]);
        coordinator.run_batch(&graph).await.unwrap();

        resolver.insert_failure("10.1/x", "503 upstream down");
        coordinator.force(Identifier::parse("10.1/x").unwrap());
        let report = coordinator.run_batch(&graph).await.unwrap();

        assert!(report.resolved.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].reason, "503 upstream down");
        assert!(report.evicted.is_empty());

        let graph = graph.lock();
        let record = graph.get("10.1/x").unwrap();
        assert_eq!(record.state, ResolutionState::Resolved);
        assert_eq!(record.title.as_deref(), Some("10.1/x"));
        assert_eq!(record.failure_reason.as_deref(), Some("503 upstream down"));
    }

    #[tokio::test]
    async fn test_nothing_pending_skips_resolver() {
        let resolver = Arc::new(FixedResolver::new());
        let coordinator = ResolutionCoordinator::new(resolver.clone());
        let graph = Mutex::new(CitationGraph::default());

        let report = coordinator.run_batch(&graph).await.unwrap();
        assert!(report.is_empty());
        assert!(resolver.batches().is_empty());
    }

    #[tokio::test]
    async fn test_forced_refresh_is_resent() {
        let resolver = Arc::new(FixedResolver::new().with_work(work("10.1/x", &[])));
        let coordinator = ResolutionCoordinator::new(resolver.clone());
        let graph = seeded(&["10.1/x"]);
        coordinator.run_batch(&graph).await.unwrap();

        resolver.insert_work(ResolvedWork {
            title: Some("Corrected".into()),
            ..work("10.1/x", &[])
        });
        coordinator.force(Identifier::parse("10.1/x").unwrap());
        let report = coordinator.run_batch(&graph).await.unwrap();

        assert_eq!(report.requested, 1);
        assert_eq!(
            graph.lock().get("10.1/x").unwrap().title.as_deref(),
            Some("Corrected")
        );
        assert!(!coordinator.has_forced());
    }

    #[tokio::test]
    async fn test_resolver_error_leaves_pending() {
        let coordinator = ResolutionCoordinator::new(Arc::new(BrokenResolver));
        let graph = seeded(&["10.1/x"]);

        assert!(matches!(coordinator.run_batch(&graph).await, Err(Error::Http(_))));
        assert_eq!(graph.lock().get("10.1/x").unwrap().state, ResolutionState::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_batch_rejected_and_removed_result_discarded() {
        let resolver = Arc::new(GatedResolver {
            inner: FixedResolver::new().with_work(work("10.1/x", &["10.1/ref"])),
            gate: Notify::new(),
        });
        let coordinator = Arc::new(ResolutionCoordinator::new(resolver.clone()));
        let graph = Arc::new(seeded(&["10.1/x"]));

        let task = {
            let coordinator = coordinator.clone();
            let graph = graph.clone();
            tokio::spawn(async move { coordinator.run_batch(&graph).await })
        };
        while !coordinator.is_in_flight() {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            coordinator.try_run_batch(&graph).await,
            Err(Error::BatchInFlight)
        ));

        // Remove and re-add while the first result is still outstanding.
        graph.lock().remove("10.1/x").unwrap();
        graph.lock().upsert("10.1/x", Membership::UserSelected).unwrap();

        resolver.gate.notify_one();
        let report = task.await.unwrap().unwrap();
        assert_eq!(report.discarded, vec![Identifier::parse("10.1/x").unwrap()]);
        assert!(report.discovered.is_empty());

        let graph = graph.lock();
        assert_eq!(graph.get("10.1/x").unwrap().state, ResolutionState::Pending);
        assert!(graph.get("10.1/ref").is_none());
    }
}
