use std::sync::Arc;

use crate::artifacts::engine::{ArtifactEngine, EngineOptions};
use crate::config::Config;
use crate::view_state::ViewStateStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Stateless between calls; shared by every request.
    pub engine: Arc<ArtifactEngine>,
    pub view_state: ViewStateStore,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let engine = ArtifactEngine::new(EngineOptions {
            resolve_overlaps: config.resolve_overlaps,
        });
        Self {
            config,
            engine: Arc::new(engine),
            view_state: ViewStateStore::new(),
        }
    }
}
