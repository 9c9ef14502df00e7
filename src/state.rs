//! Application state management
//!
//! This module contains the shared state an embedding service holds on to:
//! the configuration, the rule store and the services built on top of it.

use std::sync::Arc;

use crate::config::Config;
use crate::db::{self, PgRuleStore};
use crate::error::AppResult;
use crate::services::{PayoutService, RuleService};
use crate::store::{InMemoryRuleStore, RuleStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Application configuration
    config: Config,

    /// Rule store shared by both services
    store: Arc<dyn RuleStore>,

    payouts: PayoutService,
    rules: RuleService,
}

impl AppState {
    /// Create state around an existing store
    pub fn new(store: Arc<dyn RuleStore>, config: Config) -> Self {
        let payouts = PayoutService::new(store.clone());
        let rules = RuleService::new(store.clone(), &config.engine);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                payouts,
                rules,
            }),
        }
    }

    /// Build state from configuration.
    ///
    /// Connects to PostgreSQL and applies migrations when a database is
    /// configured; otherwise rules live in memory.
    pub async fn from_config(config: Config) -> AppResult<Self> {
        let store: Arc<dyn RuleStore> = match &config.database {
            Some(database) => {
                tracing::info!("Connecting to database...");
                let pool = db::create_pool(database).await?;
                db::test_connection(&pool).await?;

                tracing::info!("Running database migrations...");
                db::run_migrations(&pool).await?;
                Arc::new(PgRuleStore::new(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory rule store");
                Arc::new(InMemoryRuleStore::new())
            }
        };

        Ok(Self::new(store, config))
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get a handle to the rule store
    pub fn store(&self) -> Arc<dyn RuleStore> {
        self.inner.store.clone()
    }

    pub fn payouts(&self) -> &PayoutService {
        &self.inner.payouts
    }

    pub fn rules(&self) -> &RuleService {
        &self.inner.rules
    }
}
