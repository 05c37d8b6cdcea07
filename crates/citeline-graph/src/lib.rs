//! Citeline Graph: the citation graph index.
//!
//! Owns every metadata record keyed by normalized identifier, merges
//! duplicate discoveries, applies resolution results and exposes
//! deterministic snapshots for layout.

pub mod edges;
pub mod index;
pub mod types;

pub use edges::CitationEdge;
pub use index::CitationGraph;
pub use types::*;
