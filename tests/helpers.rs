#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use parlay_settlement::clock::{FixedClock, SequentialIds};
use parlay_settlement::models::*;
use parlay_settlement::repositories::MemoryStore;
use parlay_settlement::services::EventUpdateOutcome;
use parlay_settlement::{AppConfig, AppResult, AppState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";
pub const CAROL: &str = "carol";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn labels(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

/// In-memory store, fixed clock and a seeded group with three members
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub state: AppState,
    pub group: Group,
}

impl Harness {
    /// Group with 1000 starting currency and members alice, bob, carol
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(start_time()));
        let state = AppState::new(
            store.clone(),
            clock.clone(),
            Arc::new(SequentialIds::new()),
            &AppConfig::default(),
        );

        let group = Group {
            id: Uuid::new_v4(),
            name: "Test Group".to_string(),
            starting_currency: dec!(1000),
        };
        store.insert_group(group.clone()).await;
        for user in [ALICE, BOB, CAROL] {
            store
                .insert_member(GroupMember::new(&group, user, start_time()))
                .await;
        }

        Self {
            store,
            clock,
            state,
            group,
        }
    }

    /// Open event in the test group, locking one hour from now
    pub async fn event(&self, event_type: EventType, options: &[&str]) -> Event {
        self.state
            .event_service
            .create_event(NewEvent {
                group_id: self.group.id,
                event_type,
                options: labels(options),
                lock_date: None,
            })
            .await
            .expect("Failed to create event")
    }

    pub async fn single(&self) -> Event {
        self.event(EventType::SingleOutcome, &["A", "B"]).await
    }

    /// Place a wager through the service; `legs` are (event, selection)
    pub async fn wager(
        &self,
        user: &str,
        legs: &[(Uuid, &str)],
        risk: Decimal,
        multiplier: Decimal,
    ) -> Wager {
        self.try_wager(user, legs, risk, multiplier)
            .await
            .expect("Failed to place wager")
    }

    pub async fn try_wager(
        &self,
        user: &str,
        legs: &[(Uuid, &str)],
        risk: Decimal,
        multiplier: Decimal,
    ) -> AppResult<Wager> {
        self.state
            .wager_service
            .place_wager(NewWager {
                group_id: self.group.id,
                user_id: user.to_string(),
                event_ids: legs.iter().map(|(id, _)| *id).collect(),
                picks: legs.iter().map(|(id, s)| Pick::new(*id, *s)).collect(),
                risk,
                multiplier,
                odds: dec!(100),
            })
            .await
    }

    pub async fn settle(&self, event_id: Uuid, results: &[&str]) -> AppResult<EventUpdateOutcome> {
        self.state
            .event_service
            .update_event(event_id, EventUpdate::settle(labels(results)))
            .await
    }

    pub async fn balance(&self, user: &str) -> Decimal {
        self.store
            .balance_of(self.group.id, user)
            .await
            .expect("member missing")
    }

    pub async fn reload(&self, wager: &Wager) -> Wager {
        self.state
            .wager_service
            .get_wager(wager.id)
            .await
            .expect("wager missing")
    }
}
