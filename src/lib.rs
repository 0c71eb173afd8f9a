//! Parlay Settlement Library
//!
//! Event lifecycle, scheduled closing and cascading parlay settlement for a
//! shared-ledger group betting backend. Storage is injected through the
//! traits in [`repositories`]; time and identifiers through [`clock`].

pub mod clock;
pub mod closer;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
use closer::EventCloser;
use repositories::{PgStore, Store};
use services::{EventService, SettlementEngine, WagerService};
use std::sync::Arc;

/// Application state containing the store and services
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub settlement: Arc<SettlementEngine>,
    pub event_service: Arc<EventService>,
    pub wager_service: Arc<WagerService>,
}

impl AppState {
    /// Wire services over any store
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        config: &AppConfig,
    ) -> Self {
        let settlement = Arc::new(SettlementEngine::new(store.clone(), clock.clone()));
        let event_service = Arc::new(
            EventService::new(store.clone(), settlement.clone(), clock.clone(), ids.clone())
                .with_default_lock_window(config.default_lock_window()),
        );
        let wager_service = Arc::new(WagerService::new(store.clone(), clock.clone(), ids));

        Self {
            store,
            clock,
            settlement,
            event_service,
            wager_service,
        }
    }

    /// Production wiring: PostgreSQL store, wall clock, random ids
    pub fn with_postgres(pool: sqlx::PgPool, config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PgStore::new(pool)),
            Arc::new(SystemClock),
            Arc::new(UuidGenerator),
            config,
        )
    }

    /// Scheduled closer sharing this state's store and clock
    pub fn closer(&self, config: &AppConfig) -> EventCloser {
        EventCloser::new(self.store.clone(), self.clock.clone()).with_interval(config.closer_interval())
    }
}
