//! Citation graph index: keyed upsert/merge, resolution, removal, snapshots.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use citeline_core::{Error, Identifier, Result};
use tracing::{debug, warn};

use crate::types::*;

/// Owns every metadata record, keyed by normalized identifier.
///
/// Records are created `Pending` the first time their identifier appears and
/// keep a discovery sequence number that fixes snapshot order.
pub struct CitationGraph {
    records: HashMap<Identifier, MetadataRecord>,
    order: BTreeMap<u64, Identifier>,
    next_seq: u64,
    traversal_depth: u32,
}

impl CitationGraph {
    /// Create an empty graph expanding references up to `traversal_depth` hops.
    pub fn new(traversal_depth: u32) -> Self {
        Self {
            records: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            traversal_depth,
        }
    }

    pub fn traversal_depth(&self) -> u32 {
        self.traversal_depth
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by raw identifier.
    pub fn get(&self, raw: &str) -> Option<&MetadataRecord> {
        let id = Identifier::parse(raw).ok()?;
        self.records.get(&id)
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.records.contains_key(id)
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Normalize and insert, or merge into the existing record.
    ///
    /// Existing fields are untouched; membership is upgraded to
    /// `UserSelected` when requested, never downgraded.
    pub fn upsert(&mut self, raw: &str, membership: Membership) -> Result<&MetadataRecord> {
        let id = Identifier::parse(raw)?;
        Ok(self.upsert_identifier(id, membership))
    }

    /// Upsert an already-normalized identifier.
    pub fn upsert_identifier(&mut self, id: Identifier, membership: Membership) -> &MetadataRecord {
        let depth = match membership {
            Membership::UserSelected => 0,
            Membership::Discovered => 1,
        };
        self.upsert_at(&id, membership, depth);
        &self.records[&id]
    }

    /// Returns true when a new record was created.
    fn upsert_at(&mut self, id: &Identifier, membership: Membership, depth: u32) -> bool {
        if let Some(record) = self.records.get_mut(id) {
            if membership > record.membership {
                debug!("Promoted {} to {:?}", id, membership);
                record.membership = membership;
            }
            let shallower = depth < record.depth;
            if shallower {
                record.depth = depth;
            }
            // A record pulled closer to a seed may now be inside the expansion radius.
            if shallower && record.is_resolved() {
                self.expand_references(id);
            }
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.insert(
            id.clone(),
            MetadataRecord::pending(id.clone(), membership, depth, seq),
        );
        self.order.insert(seq, id.clone());
        true
    }

    /// Upsert a resolved record's references as `Discovered`, when within depth.
    fn expand_references(&mut self, id: &Identifier) -> Vec<Identifier> {
        let (references, depth) = match self.records.get(id) {
            Some(r) if r.is_resolved() && r.depth < self.traversal_depth => {
                (r.references.clone(), r.depth)
            }
            _ => return Vec::new(),
        };

        let mut created = Vec::new();
        for reference in references {
            if self.upsert_at(&reference, Membership::Discovered, depth + 1) {
                created.push(reference);
            }
        }
        created
    }

    /// Apply a resolver result to an existing `Pending` or `Resolved` record.
    ///
    /// On success the record's fields are overwritten and, within the
    /// traversal depth, its references are upserted as `Discovered`. A
    /// failure marks a pending record `Failed`; a failed refresh of a
    /// resolved record keeps the earlier data.
    pub fn apply_resolution(
        &mut self,
        id: &Identifier,
        resolution: Resolution,
    ) -> Result<ApplyOutcome> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if record.state == ResolutionState::Failed {
            return Err(Error::InvalidState(format!(
                "{} is failed; reset it to pending before resolving again",
                id
            )));
        }

        match resolution {
            Resolution::Resolved(work) => {
                let mut references: Vec<Identifier> = Vec::with_capacity(work.references.len());
                for raw in &work.references {
                    match Identifier::parse(raw) {
                        Ok(r) if &r != id && !references.contains(&r) => references.push(r),
                        Ok(_) => {}
                        Err(e) => warn!("Skipping reference of {}: {}", id, e),
                    }
                }

                record.title = work.title;
                record.published = work.published;
                record.authors = work.authors;
                record.references = references;
                record.state = ResolutionState::Resolved;
                record.failure_reason = None;

                let discovered = self.expand_references(id);
                Ok(ApplyOutcome {
                    state: ResolutionState::Resolved,
                    discovered,
                    refresh_failure: None,
                })
            }
            Resolution::Failed { reason } => {
                let refresh_failure = if record.is_resolved() {
                    warn!("Refresh of {} failed, keeping previous metadata: {}", id, reason);
                    record.failure_reason = Some(reason.clone());
                    Some(reason)
                } else {
                    record.state = ResolutionState::Failed;
                    record.failure_reason = Some(reason);
                    None
                };
                Ok(ApplyOutcome {
                    state: record.state,
                    discovered: Vec::new(),
                    refresh_failure,
                })
            }
        }
    }

    /// Reset a `Failed` record to `Pending` so the next batch retries it.
    pub fn mark_pending(&mut self, id: &Identifier) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if record.state == ResolutionState::Failed {
            record.state = ResolutionState::Pending;
            record.failure_reason = None;
        }
        Ok(())
    }

    /// Delete a record outright. Records discovered through it stay.
    pub fn remove(&mut self, raw: &str) -> Result<MetadataRecord> {
        let id = Identifier::parse(raw)?;
        self.remove_identifier(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    pub fn remove_identifier(&mut self, id: &Identifier) -> Option<MetadataRecord> {
        let record = self.records.remove(id)?;
        self.order.remove(&record.seq);
        Some(record)
    }

    /// Remove `Discovered` records no longer reachable from any
    /// `UserSelected` record through resolved references.
    pub fn prune_orphans(&mut self) -> Vec<Identifier> {
        let mut reachable: HashSet<Identifier> = HashSet::new();
        let mut queue: VecDeque<&Identifier> = self
            .records
            .values()
            .filter(|r| r.membership == Membership::UserSelected)
            .map(|r| &r.identifier)
            .collect();

        while let Some(id) = queue.pop_front() {
            if !reachable.insert(id.clone()) {
                continue;
            }
            if let Some(record) = self.records.get(id) {
                if record.is_resolved() {
                    queue.extend(record.references.iter().filter(|r| self.records.contains_key(*r)));
                }
            }
        }

        let orphans: Vec<Identifier> = self
            .order
            .values()
            .filter(|id| !reachable.contains(*id))
            .cloned()
            .collect();
        for id in &orphans {
            self.remove_identifier(id);
        }
        if !orphans.is_empty() {
            debug!("Pruned {} orphaned records", orphans.len());
        }
        orphans
    }

    // ---------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------

    /// Every record in discovery order.
    pub fn records(&self) -> impl Iterator<Item = &MetadataRecord> + Clone + '_ {
        self.order.values().filter_map(move |id| self.records.get(id))
    }

    /// Resolved records in discovery order, optionally filtered by membership.
    ///
    /// The iterator is lazy and can be cloned to restart it; repeated
    /// snapshots of the same graph state yield the same sequence.
    pub fn snapshot_resolved(
        &self,
        only: Option<Membership>,
    ) -> impl Iterator<Item = &MetadataRecord> + Clone + '_ {
        self.records()
            .filter(move |r| r.is_resolved() && only.map_or(true, |m| r.membership == m))
    }

    /// Pending identifiers with their incarnation sequence, in discovery order.
    pub fn pending(&self) -> Vec<(Identifier, u64)> {
        self.records()
            .filter(|r| r.state == ResolutionState::Pending)
            .map(|r| (r.identifier.clone(), r.seq))
            .collect()
    }

    /// Sequence number of the live incarnation of `id`.
    pub fn incarnation(&self, id: &Identifier) -> Option<u64> {
        self.records.get(id).map(|r| r.seq)
    }

    pub fn counts(&self) -> GraphCounts {
        let mut counts = GraphCounts {
            total: self.records.len(),
            ..GraphCounts::default()
        };
        for record in self.records.values() {
            match record.state {
                ResolutionState::Pending => counts.pending += 1,
                ResolutionState::Resolved => counts.resolved += 1,
                ResolutionState::Failed => counts.failed += 1,
            }
            match record.membership {
                Membership::UserSelected => counts.user_selected += 1,
                Membership::Discovered => counts.discovered += 1,
            }
        }
        counts
    }
}

impl Default for CitationGraph {
    fn default() -> Self {
        Self::new(1)
    }
}
