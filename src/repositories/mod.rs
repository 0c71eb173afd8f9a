//! Storage seams used by the services.
//!
//! Each concern is its own trait so the services can be handed any backend:
//! [`PgStore`] for PostgreSQL, [`MemoryStore`] for tests and embedding.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::RepositoryError;
use crate::models::{BatchOp, BatchOutcome, Event, EventStatus, Group, GroupMember, Wager};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Event records
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: &Event) -> RepoResult<()>;

    async fn get_event(&self, id: Uuid) -> RepoResult<Option<Event>>;

    /// All events of a group, newest first
    async fn events_by_group(&self, group_id: Uuid) -> RepoResult<Vec<Event>>;

    /// Open events whose lock date is at or before `now`, across all groups
    async fn due_open_events(&self, now: DateTime<Utc>) -> RepoResult<Vec<Event>>;

    /// Persist `event`'s status, results, admission flag and update time,
    /// only if the stored status still equals `expected`.
    /// Returns false when the guard did not hold or the event is gone.
    async fn update_event_if_status(&self, expected: EventStatus, event: &Event) -> RepoResult<bool>;

    async fn delete_event(&self, id: Uuid) -> RepoResult<bool>;
}

/// Wager records
#[async_trait]
pub trait WagerStore: Send + Sync {
    async fn get_wager(&self, id: Uuid) -> RepoResult<Option<Wager>>;

    /// Every wager whose `event_ids` contains `event_id`, regardless of status
    async fn wagers_referencing_event(&self, event_id: Uuid) -> RepoResult<Vec<Wager>>;

    async fn wagers_by_user(&self, user_id: &str) -> RepoResult<Vec<Wager>>;

    /// Debit the member by `wager.risk` and insert the wager as one unit.
    /// Returns false, writing nothing, when the balance cannot cover the risk.
    async fn place_wager(&self, wager: &Wager) -> RepoResult<bool>;
}

/// Per (group, member) balances
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    async fn get_member(&self, group_id: Uuid, user_id: &str) -> RepoResult<Option<GroupMember>>;

    /// Atomically add `amount` to the member's balance, returning the new value.
    /// A missing balance record is created from zero.
    async fn increment_balance(&self, group_id: Uuid, user_id: &str, amount: Decimal) -> RepoResult<Decimal>;
}

/// Group directory (read-only here; membership is managed elsewhere)
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn get_group(&self, id: Uuid) -> RepoResult<Option<Group>>;
}

/// Atomic multi-record writes
#[async_trait]
pub trait BatchWriter: Send + Sync {
    /// Apply every operation or none. Guarded operations whose condition
    /// fails are skipped and counted in [`BatchOutcome::skipped`].
    async fn apply_batch(&self, ops: &[BatchOp], at: DateTime<Utc>) -> RepoResult<BatchOutcome>;
}

/// Everything the services need from a backend
pub trait Store: EventStore + WagerStore + BalanceLedger + GroupStore + BatchWriter {}

impl<T> Store for T where T: EventStore + WagerStore + BalanceLedger + GroupStore + BatchWriter {}
