use crate::clock::{Clock, IdGenerator};
use crate::error::{AppError, AppResult};
use crate::models::wager::validate_picks;
use crate::models::{GroupMember, NewWager, Wager, WagerStatus};
use crate::repositories::Store;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Service for placing and reading wagers
pub struct WagerService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl WagerService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, clock, ids }
    }

    /// Place a parlay: validate every leg, then debit the risk and store the
    /// wager as one atomic unit.
    pub async fn place_wager(&self, new_wager: NewWager) -> AppResult<Wager> {
        info!(
            "Placing wager: group={}, user={}, legs={}, risk={}",
            new_wager.group_id,
            new_wager.user_id,
            new_wager.event_ids.len(),
            new_wager.risk
        );

        validate_picks(&new_wager.event_ids, &new_wager.picks).map_err(AppError::Validation)?;

        if new_wager.risk <= Decimal::ZERO {
            return Err(AppError::Validation("Risk must be positive".into()));
        }
        if new_wager.multiplier <= Decimal::ZERO {
            return Err(AppError::Validation("Multiplier must be positive".into()));
        }

        self.store
            .get_group(new_wager.group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", new_wager.group_id)))?;

        let member = self.member(new_wager.group_id, &new_wager.user_id).await?;

        let now = self.clock.now();
        for pick in &new_wager.picks {
            let event = self
                .store
                .get_event(pick.event_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Event {} not found", pick.event_id)))?;

            if event.group_id != new_wager.group_id {
                return Err(AppError::Validation(format!(
                    "Event {} does not belong to group {}",
                    event.id, new_wager.group_id
                )));
            }
            if !event.admits_wagers_at(now) {
                return Err(AppError::InvalidState(format!(
                    "Event {} is no longer accepting wagers",
                    event.id
                )));
            }
            if !event.has_option(&pick.selection) {
                return Err(AppError::Validation(format!(
                    "{} is not an option of event {}",
                    pick.selection, event.id
                )));
            }
        }

        if !member.can_cover(new_wager.risk) {
            return Err(AppError::InsufficientBalance(format!(
                "available {}, required {}",
                member.balance, new_wager.risk
            )));
        }

        let wager = Wager {
            id: self.ids.next_id(),
            group_id: new_wager.group_id,
            user_id: new_wager.user_id,
            event_ids: new_wager.event_ids,
            picks: new_wager.picks,
            risk: new_wager.risk,
            multiplier: new_wager.multiplier,
            odds: new_wager.odds,
            payout: None,
            status: WagerStatus::Active,
            placed_at: now,
            settled_at: None,
        };

        // The balance may have moved since it was read; the store re-checks.
        if !self.store.place_wager(&wager).await? {
            return Err(AppError::InsufficientBalance(format!(
                "balance no longer covers risk {}",
                wager.risk
            )));
        }

        info!("Placed wager {} for user {}", wager.id, wager.user_id);
        Ok(wager)
    }

    /// Get a wager by id
    pub async fn get_wager(&self, wager_id: Uuid) -> AppResult<Wager> {
        self.store
            .get_wager(wager_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Wager {} not found", wager_id)))
    }

    /// All wagers placed by a user, newest first
    pub async fn list_user_wagers(&self, user_id: &str) -> AppResult<Vec<Wager>> {
        Ok(self.store.wagers_by_user(user_id).await?)
    }

    /// Current spendable balance of a member within a group
    pub async fn member_balance(&self, group_id: Uuid, user_id: &str) -> AppResult<Decimal> {
        Ok(self.member(group_id, user_id).await?.balance)
    }

    async fn member(&self, group_id: Uuid, user_id: &str) -> AppResult<GroupMember> {
        self.store.get_member(group_id, user_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("User {} is not a member of group {}", user_id, group_id))
        })
    }
}
