use std::sync::Arc;
use tracing::info;

use crate::{
    config::{Config, StoreBackend},
    error::AppResult,
    infrastructure::{GraphStore, MemoryGraphStore, SqliteGraphStore},
    services::{AccountService, ContentService, FeedService, RelationshipService},
};

/// Everything a request handler needs, wired to a single graph store.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub relationships: RelationshipService,
    pub content: ContentService,
    pub feed: FeedService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let store: Arc<dyn GraphStore> = match config.store.backend {
            StoreBackend::Sqlite => Arc::new(SqliteGraphStore::connect(&config.database).await?),
            StoreBackend::Memory => {
                info!("Using in-memory graph store; data is lost on exit");
                Arc::new(MemoryGraphStore::new())
            }
        };
        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: Arc<dyn GraphStore>, config: Config) -> Self {
        let relationships = RelationshipService::new(store.clone());
        let content = ContentService::new(store.clone());
        let feed = FeedService::new(relationships.clone(), content.clone(), config.feed.fanout);

        Self {
            accounts: AccountService::new(store),
            relationships,
            content,
            feed,
            config,
        }
    }
}
