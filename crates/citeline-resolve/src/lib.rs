//! Citeline Resolve: metadata resolution backends.
//!
//! The `MetadataResolver` trait resolves a batch of identifiers to
//! bibliographic metadata or per-identifier failures. `CrossrefResolver`
//! talks to the Crossref REST API; `FixedResolver` answers from memory.

pub mod crossref;
pub mod fixed;
pub mod resolver;

pub use crossref::CrossrefResolver;
pub use fixed::FixedResolver;
pub use resolver::{BatchResponse, MetadataResolver, ResolutionFailure};

use std::sync::Arc;

use citeline_core::CrossrefConfig;

/// Create the Crossref-backed resolver from configuration.
pub fn create_resolver(config: &CrossrefConfig) -> citeline_core::Result<Arc<dyn MetadataResolver>> {
    let resolver = CrossrefResolver::new(config)?;
    tracing::info!("Using Crossref resolver at {}", config.base_url);
    Ok(Arc::new(resolver))
}
