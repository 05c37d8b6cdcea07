//! Timeline snapshot: positioned nodes, ticks and status counts.

use citeline_core::{Identifier, LayoutConfig};
use citeline_graph::{Author, CitationGraph, GraphCounts, Membership, MetadataRecord};
use serde::Serialize;
use tracing::debug;

use crate::mapper::{MappingKind, TimeDomain, TimeMapper};
use crate::ticks::{generate_ticks, Tick};
use crate::vertical::place_vertically;

/// One resolved, dated record positioned on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineNode {
    pub identifier: Identifier,
    /// Position in the ordered snapshot, used as the on-screen label.
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub membership: Membership,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub authors: Vec<Author>,
}

/// Read-only projection handed to a rendering surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub width: f64,
    pub height: f64,
    pub node_size: f64,
    pub nodes: Vec<TimelineNode>,
    pub ticks: Vec<Tick>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<TimeDomain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<MappingKind>,
    /// Resolved records left off the axis for lack of a usable date.
    pub undated: Vec<Identifier>,
    pub counts: GraphCounts,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Lay out every resolved, dated record of the graph.
pub fn build_timeline(graph: &CitationGraph, config: &LayoutConfig) -> Timeline {
    let mut dated: Vec<(&MetadataRecord, i64)> = Vec::new();
    let mut undated = Vec::new();
    for record in graph.snapshot_resolved(None) {
        match record.timestamp_millis() {
            Some(ts) => dated.push((record, ts)),
            None => undated.push(record.identifier.clone()),
        }
    }

    let mapper = TimeMapper::fit(dated.iter().map(|(_, ts)| *ts), config.width);
    let (nodes, ticks) = match &mapper {
        Some(mapper) => {
            let nodes = place_vertically(dated, config.node_size, config.height)
                .into_iter()
                .map(|placed| {
                    let (record, ts) = placed.item;
                    TimelineNode {
                        identifier: record.identifier.clone(),
                        index: placed.index,
                        x: mapper.map(ts),
                        y: placed.y,
                        membership: record.membership,
                        title: record.title.clone(),
                        date: record.date_display(),
                        authors: record.authors.clone(),
                    }
                })
                .collect();
            (nodes, generate_ticks(mapper))
        }
        None => (Vec::new(), Vec::new()),
    };

    debug!(
        "Timeline: {} nodes, {} ticks, {} undated",
        nodes.len(),
        ticks.len(),
        undated.len()
    );

    Timeline {
        width: config.width,
        height: config.height,
        node_size: config.node_size,
        nodes,
        ticks,
        domain: mapper.map(|m| m.domain()),
        mapping: mapper.map(|m| m.kind()),
        undated,
        counts: graph.counts(),
    }
}
