//! Shared application state.

use citeline_core::CitelineConfig;
use citeline_runtime::Session;

/// State accessible from all route handlers: one session per server.
pub struct AppState {
    pub config: CitelineConfig,
    pub session: Session,
}

impl AppState {
    pub fn new(config: CitelineConfig, session: Session) -> Self {
        Self { config, session }
    }
}
