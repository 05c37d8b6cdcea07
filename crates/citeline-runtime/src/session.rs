//! Session: one user's seed set, its citation graph and snapshot API.

use std::sync::Arc;

use citeline_core::{CitelineConfig, Error, Identifier, LayoutConfig, Result};
use citeline_graph::{
    CitationEdge, CitationGraph, GraphCounts, Membership, MetadataRecord, ResolutionState,
};
use citeline_layout::{build_timeline, Timeline};
use citeline_resolve::MetadataResolver;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::coordinator::ResolutionCoordinator;
use crate::types::{BatchReport, SyncReport};

/// Owns a citation graph and serializes every mutation of it.
///
/// Mutations take the graph lock briefly and never interleave with the
/// application of a batch result. Snapshot methods return owned copies.
pub struct Session {
    graph: Mutex<CitationGraph>,
    coordinator: ResolutionCoordinator,
    prune_orphans_on_remove: bool,
    max_sync_rounds: usize,
    layout: LayoutConfig,
}

impl Session {
    pub fn new(config: &CitelineConfig, resolver: Arc<dyn MetadataResolver>) -> Self {
        info!(
            "Session initialized: resolver={}, traversal_depth={}",
            resolver.name(),
            config.traversal_depth
        );
        Self {
            graph: Mutex::new(CitationGraph::new(config.traversal_depth)),
            coordinator: ResolutionCoordinator::new(resolver),
            prune_orphans_on_remove: config.prune_orphans_on_remove,
            max_sync_rounds: config.max_sync_rounds.max(1),
            layout: config.layout,
        }
    }

    // ---------------------------------------------------------------
    // Seed input
    // ---------------------------------------------------------------

    /// Add a user-selected identifier (or promote a discovered one).
    ///
    /// A promoted record whose lookup had failed goes back to `Pending`, so
    /// the next batch either resolves it or evicts it as a failed seed.
    pub fn add_seed(&self, raw: &str) -> Result<MetadataRecord> {
        let mut graph = self.graph.lock();
        let record = graph.upsert(raw, Membership::UserSelected)?.clone();
        if record.state == ResolutionState::Failed {
            graph.mark_pending(&record.identifier)?;
            info!("Seed added: {} (retrying failed lookup)", record.identifier);
            return graph
                .get(record.identifier.as_str())
                .cloned()
                .ok_or_else(|| Error::NotFound(record.identifier.to_string()));
        }
        info!("Seed added: {}", record.identifier);
        Ok(record)
    }

    /// Remove a user-selected identifier. Discovered records stay unless
    /// orphan pruning is enabled.
    pub fn remove_seed(&self, raw: &str) -> Result<MetadataRecord> {
        let id = Identifier::parse(raw)?;
        let mut graph = self.graph.lock();
        match graph.get(id.as_str()) {
            None => return Err(Error::NotFound(id.to_string())),
            Some(r) if r.membership != Membership::UserSelected => {
                return Err(Error::InvalidState(format!("{} is not a seed", id)));
            }
            Some(_) => {}
        }

        let record = graph
            .remove_identifier(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        info!("Seed removed: {}", id);

        if self.prune_orphans_on_remove {
            let pruned = graph.prune_orphans();
            debug!("Pruned {} records after removing {}", pruned.len(), id);
        }
        Ok(record)
    }

    /// Re-resolve a record on the next batch. Failed records are retried.
    pub fn refresh(&self, raw: &str) -> Result<()> {
        let id = Identifier::parse(raw)?;
        let mut graph = self.graph.lock();
        let state = graph
            .get(id.as_str())
            .map(|r| r.state)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        match state {
            ResolutionState::Failed => graph.mark_pending(&id)?,
            ResolutionState::Resolved => self.coordinator.force(id),
            ResolutionState::Pending => {}
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------

    /// Run one batch, queued behind any batch already in flight.
    pub async fn resolve_pending(&self) -> Result<BatchReport> {
        self.coordinator.run_batch(&self.graph).await
    }

    /// Run one batch, rejecting the call if one is already in flight.
    pub async fn try_resolve_pending(&self) -> Result<BatchReport> {
        self.coordinator.try_run_batch(&self.graph).await
    }

    /// Run batches until nothing is pending or the round limit is reached.
    pub async fn sync(&self) -> Result<SyncReport> {
        let mut report = SyncReport::default();
        while report.rounds < self.max_sync_rounds {
            let batch = self.resolve_pending().await?;
            if batch.is_empty() {
                break;
            }
            report.rounds += 1;
            report.batches.push(batch);

            if self.graph.lock().counts().pending == 0 && !self.coordinator.has_forced() {
                break;
            }
        }
        report.counts = self.counts();
        Ok(report)
    }

    pub fn is_resolving(&self) -> bool {
        self.coordinator.is_in_flight()
    }

    pub fn resolver_name(&self) -> &'static str {
        self.coordinator.resolver_name()
    }

    // ---------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------

    pub fn record(&self, raw: &str) -> Option<MetadataRecord> {
        self.graph.lock().get(raw).cloned()
    }

    /// Every record in discovery order.
    pub fn records(&self) -> Vec<MetadataRecord> {
        self.graph.lock().records().cloned().collect()
    }

    /// User-selected records in any resolution state.
    pub fn seeds(&self) -> Vec<MetadataRecord> {
        self.graph
            .lock()
            .records()
            .filter(|r| r.membership == Membership::UserSelected)
            .cloned()
            .collect()
    }

    pub fn counts(&self) -> GraphCounts {
        self.graph.lock().counts()
    }

    pub fn edges(&self) -> Vec<CitationEdge> {
        self.graph.lock().edges()
    }

    /// Resolved records citing `raw`.
    pub fn cited_by(&self, raw: &str) -> Result<Vec<Identifier>> {
        let id = Identifier::parse(raw)?;
        Ok(self.graph.lock().cited_by(&id))
    }

    pub fn has_citation_cycle(&self) -> bool {
        self.graph.lock().has_citation_cycle()
    }

    /// Timeline with the session's configured canvas.
    pub fn timeline(&self) -> Timeline {
        self.timeline_with(&self.layout)
    }

    pub fn timeline_with(&self, layout: &LayoutConfig) -> Timeline {
        build_timeline(&self.graph.lock(), layout)
    }

    pub fn layout(&self) -> LayoutConfig {
        self.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citeline_core::PublicationDate;
    use citeline_graph::ResolvedWork;
    use citeline_resolve::FixedResolver;

    fn work(doi: &str, date: &str, refs: &[&str]) -> ResolvedWork {
        ResolvedWork {
            identifier: doi.into(),
            title: Some(format!("Paper {}", doi)),
            authors: vec!["A. Author".into()],
            published: Some(PublicationDate::parse(date)),
            references: refs.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn library() -> Arc<FixedResolver> {
        Arc::new(
            FixedResolver::new()
                .with_work(work("10.1000/seed", "2022-03", &["10.1000/refA", "10.1000/refB"]))
                .with_work(work("10.1000/refA", "2019-06", &["10.1000/deep"]))
                .with_work(work("10.1000/refB", "2020", &[]))
                .with_failure("10.1000/missing", "404"),
        )
    }

    fn session_with(config: CitelineConfig) -> (Session, Arc<FixedResolver>) {
        let resolver = library();
        (Session::new(&config, resolver.clone()), resolver)
    }

    #[tokio::test]
    async fn test_end_to_end_seed_and_remove() {
        let (session, _) = session_with(CitelineConfig::default());
        session.add_seed("10.1000/seed").unwrap();

        let batch = session.resolve_pending().await.unwrap();
        assert_eq!(batch.resolved.len(), 1);
        let counts = session.counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.user_selected, 1);
        assert_eq!(counts.discovered, 2);

        session.remove_seed("10.1000/seed").unwrap();
        assert!(session.record("10.1000/seed").is_none());
        let refa = session.record("10.1000/refa").unwrap();
        assert_eq!(refa.membership, Membership::Discovered);
        assert!(session.record("10.1000/refb").is_some());
    }

    #[tokio::test]
    async fn test_sync_resolves_references_single_hop() {
        let (session, resolver) = session_with(CitelineConfig::default());
        session.add_seed("10.1000/SEED").unwrap();

        let report = session.sync().await.unwrap();
        assert_eq!(report.rounds, 2);
        assert_eq!(report.counts.resolved, 3);
        assert_eq!(report.counts.pending, 0);
        assert!(session.record("10.1000/deep").is_none());
        assert_eq!(resolver.batches().len(), 2);

        let timeline = session.timeline();
        let order: Vec<&str> = timeline.nodes.iter().map(|n| n.identifier.as_str()).collect();
        assert_eq!(order, vec!["10.1000/seed", "10.1000/refa", "10.1000/refb"]);
        assert_eq!(timeline.nodes[1].x, 0.0);
        assert_eq!(timeline.nodes[0].x, timeline.width);
        assert!(timeline.ticks.iter().any(|t| t.year == 2020 && t.is_major));
    }

    #[tokio::test]
    async fn test_failed_seed_absent_after_sync() {
        let (session, _) = session_with(CitelineConfig::default());
        session.add_seed("10.1000/missing").unwrap();

        let report = session.sync().await.unwrap();
        assert_eq!(report.batches[0].evicted.len(), 1);
        assert!(session.record("10.1000/missing").is_none());
        assert_eq!(session.counts().total, 0);
    }

    #[tokio::test]
    async fn test_prune_on_remove() {
        let config = CitelineConfig {
            prune_orphans_on_remove: true,
            ..CitelineConfig::default()
        };
        let (session, _) = session_with(config);
        session.add_seed("10.1000/seed").unwrap();
        session.sync().await.unwrap();

        session.remove_seed("10.1000/seed").unwrap();
        assert_eq!(session.counts().total, 0);
    }

    #[tokio::test]
    async fn test_remove_rejects_discovered_and_unknown() {
        let (session, _) = session_with(CitelineConfig::default());
        session.add_seed("10.1000/seed").unwrap();
        session.resolve_pending().await.unwrap();

        assert!(matches!(
            session.remove_seed("10.1000/refa"),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            session.remove_seed("10.1000/nope"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            session.remove_seed(""),
            Err(Error::MalformedIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_retries_failed_discovered() {
        let resolver = Arc::new(
            FixedResolver::new().with_work(work("10.1/seed", "2020", &["10.1/late"])),
        );
        let session = Session::new(&CitelineConfig::default(), resolver.clone());
        session.add_seed("10.1/seed").unwrap();
        session.sync().await.unwrap();
        assert_eq!(
            session.record("10.1/late").unwrap().state,
            ResolutionState::Failed
        );

        resolver.insert_work(work("10.1/late", "2021", &[]));
        session.refresh("10.1/late").unwrap();
        session.sync().await.unwrap();
        assert_eq!(
            session.record("10.1/late").unwrap().state,
            ResolutionState::Resolved
        );
    }

    #[tokio::test]
    async fn test_promoting_failed_discovered_retries() {
        let resolver = Arc::new(
            FixedResolver::new().with_work(work("10.1/seed", "2020", &["10.1/late"])),
        );
        let session = Session::new(&CitelineConfig::default(), resolver.clone());
        session.add_seed("10.1/seed").unwrap();
        session.sync().await.unwrap();

        let promoted = session.add_seed("10.1/late").unwrap();
        assert_eq!(promoted.membership, Membership::UserSelected);
        assert_eq!(promoted.state, ResolutionState::Pending);

        let report = session.sync().await.unwrap();
        assert_eq!(report.batches[0].evicted.len(), 1);
        assert!(session.record("10.1/late").is_none());
    }

    #[tokio::test]
    async fn test_seeds_snapshot() {
        let (session, _) = session_with(CitelineConfig::default());
        session.add_seed("10.1000/seed").unwrap();
        session.add_seed("10.1000/refB").unwrap();
        session.sync().await.unwrap();

        let seeds: Vec<String> = session
            .seeds()
            .into_iter()
            .map(|r| r.identifier.to_string())
            .collect();
        assert_eq!(seeds, vec!["10.1000/seed", "10.1000/refb"]);
        assert_eq!(session.edges().len(), 2);
    }
}
