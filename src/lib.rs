/*
 * LeetBot - LeetCode Practice Companion for Discord
 * File Path: src/lib.rs
 * Responsibility: Shared library modules and application state
 */

pub mod api;
pub mod commands;
pub mod config;
pub mod db;
pub mod discord;
pub mod embeds;
pub mod error;
pub mod problems;
pub mod reconciler;
pub mod refresh;
pub mod registry;
pub mod store;

use crate::api::CatalogClient;
use crate::config::Config;
use crate::problems::ProblemManager;
use crate::reconciler::ThreadManager;
use crate::registry::ThreadRegistry;
use crate::store::ProblemStore;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Everything the event handler needs, shared across interaction tasks.
pub struct AppState {
    pub config: Config,
    pub catalog: CatalogClient,
    pub problems: ProblemManager,
    pub registry: Arc<ThreadRegistry>,
    pub threads: ThreadManager,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let catalog = CatalogClient::new(&config.catalog.base_url);
        let store = ProblemStore::new(pool.clone());
        let problems = ProblemManager::new(store, catalog.clone());
        let registry = Arc::new(ThreadRegistry::new(pool));
        let threads = ThreadManager::new(registry.clone());
        Self {
            config,
            catalog,
            problems,
            registry,
            threads,
        }
    }
}
