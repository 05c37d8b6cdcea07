//! Citation edges between records present in the graph.

use std::collections::HashMap;

use citeline_core::Identifier;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::index::CitationGraph;

/// `source` cites `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationEdge {
    pub source: Identifier,
    pub target: Identifier,
}

impl CitationGraph {
    /// Edges from resolved records to referenced records that exist in the graph.
    pub fn edges(&self) -> Vec<CitationEdge> {
        self.snapshot_resolved(None)
            .flat_map(|record| {
                record
                    .references
                    .iter()
                    .filter(|target| self.contains(target))
                    .map(|target| CitationEdge {
                        source: record.identifier.clone(),
                        target: target.clone(),
                    })
            })
            .collect()
    }

    /// Identifiers of resolved records citing `id`, in discovery order.
    pub fn cited_by(&self, id: &Identifier) -> Vec<Identifier> {
        self.snapshot_resolved(None)
            .filter(|r| r.references.contains(id))
            .map(|r| r.identifier.clone())
            .collect()
    }

    /// Every record as a node, every in-graph citation as an edge.
    pub fn citation_digraph(&self) -> DiGraph<Identifier, ()> {
        let mut graph = DiGraph::new();
        let mut nodes: HashMap<&Identifier, NodeIndex> = HashMap::new();
        for record in self.records() {
            nodes.insert(&record.identifier, graph.add_node(record.identifier.clone()));
        }
        for edge in self.edges() {
            if let (Some(&a), Some(&b)) = (nodes.get(&edge.source), nodes.get(&edge.target)) {
                graph.add_edge(a, b, ());
            }
        }
        graph
    }

    /// Whether any chain of in-graph citations leads back to its start.
    pub fn has_citation_cycle(&self) -> bool {
        is_cyclic_directed(&self.citation_digraph())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn seeded() -> CitationGraph {
        let mut graph = CitationGraph::default();
        graph.upsert("10.1/seed", Membership::UserSelected).unwrap();
        graph
            .apply_resolution(
                &Identifier::parse("10.1/seed").unwrap(),
                Resolution::Resolved(ResolvedWork {
                    identifier: "10.1/seed".into(),
                    references: vec!["10.1/a".into(), "10.1/b".into()],
                    ..ResolvedWork::default()
                }),
            )
            .unwrap();
        graph
    }

    #[test]
    fn test_edges_and_cited_by() {
        let mut graph = seeded();
        assert_eq!(graph.edges().len(), 2);

        let a = Identifier::parse("10.1/a").unwrap();
        assert_eq!(graph.cited_by(&a), vec![Identifier::parse("10.1/seed").unwrap()]);

        graph.remove("10.1/b").unwrap();
        let edges = graph.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target, a);
    }

    #[test]
    fn test_digraph() {
        let graph = seeded().citation_digraph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_citation_cycle() {
        let mut graph = seeded();
        assert!(!graph.has_citation_cycle());

        graph
            .apply_resolution(
                &Identifier::parse("10.1/a").unwrap(),
                Resolution::Resolved(ResolvedWork {
                    identifier: "10.1/a".into(),
                    references: vec!["10.1/seed".into()],
                    ..ResolvedWork::default()
                }),
            )
            .unwrap();
        assert!(graph.has_citation_cycle());
    }
}
