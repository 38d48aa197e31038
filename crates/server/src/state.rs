//! Application state shared across handlers.

use lantern_cache::KvStore;
use lantern_core::AppConfig;
use lantern_db::ContentStore;
use lantern_llm::ChatClient;
use lantern_pipeline::Orchestrator;
use lantern_retrieval::SearchClient;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Key/value cache (schema, trace, and origin entries).
    pub kv: Arc<dyn KvStore>,
    /// The explanation pipeline.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create application state from configuration and collaborators.
    ///
    /// Validates configuration up front: hard errors panic at startup,
    /// warnings are logged.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn ContentStore>,
        kv: Arc<dyn KvStore>,
        search: Arc<dyn SearchClient>,
        chat: Arc<dyn ChatClient>,
    ) -> Self {
        match config.validate() {
            Ok(warnings) => {
                for warning in warnings {
                    tracing::warn!("configuration warning: {}", warning);
                }
            }
            Err(error) => panic!("invalid configuration: {error}"),
        }

        let config = Arc::new(config);
        let orchestrator = Arc::new(Orchestrator::new(
            store,
            kv.clone(),
            search,
            chat,
            config.clone(),
        ));
        Self {
            config,
            kv,
            orchestrator,
        }
    }
}
