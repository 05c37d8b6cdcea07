//! Citeline Runtime: resolution batches and the session snapshot API.
//!
//! A `Session` owns one citation graph and serializes every mutation of it.
//! The `ResolutionCoordinator` drives batches against the external resolver,
//! one at a time, discarding results for records removed while in flight.

pub mod coordinator;
pub mod session;
pub mod types;

pub use coordinator::ResolutionCoordinator;
pub use session::Session;
pub use types::*;
