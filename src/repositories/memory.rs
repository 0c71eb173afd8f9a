//! In-memory store with the same atomicity guarantees as [`PgStore`](super::PgStore).
//!
//! All state sits behind one mutex, so every trait call (and in particular
//! every `apply_batch`) is atomic with respect to every other. Failure
//! injection hooks let tests simulate an unavailable backend.

use super::{BalanceLedger, BatchWriter, EventStore, GroupStore, RepoResult, WagerStore};
use crate::error::RepositoryError;
use crate::models::{
    BatchOp, BatchOutcome, Event, EventStatus, Group, GroupMember, Wager, WagerStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    groups: HashMap<Uuid, Group>,
    members: HashMap<(Uuid, String), GroupMember>,
    events: HashMap<Uuid, Event>,
    wagers: HashMap<Uuid, Wager>,
    /// Events whose reads fail with a simulated outage
    unreadable_events: HashSet<Uuid>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_batches: AtomicBool,
    fail_wager_queries: AtomicBool,
}

fn unavailable(what: &str) -> RepositoryError {
    RepositoryError::Query(sqlx::Error::Protocol(format!("simulated outage: {}", what)))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_group(&self, group: Group) {
        self.state.lock().await.groups.insert(group.id, group);
    }

    pub async fn insert_member(&self, member: GroupMember) {
        self.state
            .lock()
            .await
            .members
            .insert((member.group_id, member.user_id.clone()), member);
    }

    /// Store a wager as-is, bypassing the balance debit
    pub async fn insert_wager(&self, wager: Wager) {
        self.state.lock().await.wagers.insert(wager.id, wager);
    }

    /// Overwrite an event record, bypassing lifecycle rules
    pub async fn put_event(&self, event: Event) {
        self.state.lock().await.events.insert(event.id, event);
    }

    /// Make every `apply_batch` call fail
    pub fn fail_batches(&self, fail: bool) {
        self.fail_batches.store(fail, Ordering::SeqCst);
    }

    /// Make wager lookups by event fail
    pub fn fail_wager_queries(&self, fail: bool) {
        self.fail_wager_queries.store(fail, Ordering::SeqCst);
    }

    /// Make reads of a single event fail
    pub async fn fail_event_reads(&self, event_id: Uuid) {
        self.state.lock().await.unreadable_events.insert(event_id);
    }

    pub async fn balance_of(&self, group_id: Uuid, user_id: &str) -> Option<Decimal> {
        self.state
            .lock()
            .await
            .members
            .get(&(group_id, user_id.to_string()))
            .map(|m| m.balance)
    }
}

fn credit_member(state: &mut State, group_id: Uuid, user_id: &str, amount: Decimal, at: DateTime<Utc>) -> Decimal {
    let member = state
        .members
        .entry((group_id, user_id.to_string()))
        .or_insert_with(|| GroupMember {
            group_id,
            user_id: user_id.to_string(),
            display_name: None,
            balance: Decimal::ZERO,
            joined_at: at,
        });
    member.balance += amount;
    member.balance
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: &Event) -> RepoResult<()> {
        let mut state = self.state.lock().await;
        if !state.groups.contains_key(&event.group_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "group {} does not exist",
                event.group_id
            )));
        }
        if state.events.contains_key(&event.id) {
            return Err(RepositoryError::Duplicate(format!("event {}", event.id)));
        }
        state.events.insert(event.id, event.clone());
        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> RepoResult<Option<Event>> {
        let state = self.state.lock().await;
        if state.unreadable_events.contains(&id) {
            return Err(unavailable("event read"));
        }
        Ok(state.events.get(&id).cloned())
    }

    async fn events_by_group(&self, group_id: Uuid) -> RepoResult<Vec<Event>> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn due_open_events(&self, now: DateTime<Utc>) -> RepoResult<Vec<Event>> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| e.is_due_for_close(now))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.lock_date);
        Ok(events)
    }

    async fn update_event_if_status(&self, expected: EventStatus, event: &Event) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        match state.events.get_mut(&event.id) {
            Some(stored) if stored.status == expected => {
                stored.status = event.status;
                stored.results = event.results.clone();
                stored.accepting_wagers = event.accepting_wagers;
                stored.updated_at = event.updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_event(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.state.lock().await.events.remove(&id).is_some())
    }
}

#[async_trait]
impl WagerStore for MemoryStore {
    async fn get_wager(&self, id: Uuid) -> RepoResult<Option<Wager>> {
        Ok(self.state.lock().await.wagers.get(&id).cloned())
    }

    async fn wagers_referencing_event(&self, event_id: Uuid) -> RepoResult<Vec<Wager>> {
        if self.fail_wager_queries.load(Ordering::SeqCst) {
            return Err(unavailable("wager query"));
        }
        let state = self.state.lock().await;
        let mut wagers: Vec<Wager> = state
            .wagers
            .values()
            .filter(|w| w.event_ids.contains(&event_id))
            .cloned()
            .collect();
        wagers.sort_by_key(|w| w.placed_at);
        Ok(wagers)
    }

    async fn wagers_by_user(&self, user_id: &str) -> RepoResult<Vec<Wager>> {
        let state = self.state.lock().await;
        let mut wagers: Vec<Wager> = state
            .wagers
            .values()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        wagers.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        Ok(wagers)
    }

    async fn place_wager(&self, wager: &Wager) -> RepoResult<bool> {
        let mut state = self.state.lock().await;
        if state.wagers.contains_key(&wager.id) {
            return Err(RepositoryError::Duplicate(format!("wager {}", wager.id)));
        }
        let key = (wager.group_id, wager.user_id.clone());
        match state.members.get_mut(&key) {
            Some(member) if member.can_cover(wager.risk) => {
                member.balance -= wager.risk;
            }
            _ => return Ok(false),
        }
        state.wagers.insert(wager.id, wager.clone());
        Ok(true)
    }
}

#[async_trait]
impl BalanceLedger for MemoryStore {
    async fn get_member(&self, group_id: Uuid, user_id: &str) -> RepoResult<Option<GroupMember>> {
        Ok(self
            .state
            .lock()
            .await
            .members
            .get(&(group_id, user_id.to_string()))
            .cloned())
    }

    async fn increment_balance(&self, group_id: Uuid, user_id: &str, amount: Decimal) -> RepoResult<Decimal> {
        let mut state = self.state.lock().await;
        if !state.groups.contains_key(&group_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "group {} does not exist",
                group_id
            )));
        }
        Ok(credit_member(&mut state, group_id, user_id, amount, Utc::now()))
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn get_group(&self, id: Uuid) -> RepoResult<Option<Group>> {
        Ok(self.state.lock().await.groups.get(&id).cloned())
    }
}

#[async_trait]
impl BatchWriter for MemoryStore {
    async fn apply_batch(&self, ops: &[BatchOp], at: DateTime<Utc>) -> RepoResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        if ops.is_empty() {
            return Ok(outcome);
        }
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(unavailable("batch commit"));
        }

        let mut state = self.state.lock().await;
        for op in ops {
            match op {
                BatchOp::SettleWager {
                    wager_id,
                    payout,
                    credit,
                } => {
                    let settled = match state.wagers.get_mut(wager_id) {
                        Some(wager) if wager.status == WagerStatus::Active => {
                            wager.status = WagerStatus::Settled;
                            wager.payout = Some(*payout);
                            wager.settled_at = Some(at);
                            true
                        }
                        _ => false,
                    };
                    if settled {
                        if let Some(credit) = credit {
                            credit_member(&mut state, credit.group_id, &credit.user_id, credit.amount, at);
                        }
                    }
                    outcome.record(settled);
                }
                BatchOp::CloseEvent { event_id } => {
                    let closed = match state.events.get_mut(event_id) {
                        Some(event) if event.is_open() => {
                            event.status = EventStatus::Closed;
                            event.accepting_wagers = false;
                            event.updated_at = at;
                            true
                        }
                        _ => false,
                    };
                    outcome.record(closed);
                }
            }
        }
        Ok(outcome)
    }
}
