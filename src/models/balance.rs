//! Batched writes applied atomically by the stores

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Atomic increment of a member's balance within a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceCredit {
    pub group_id: Uuid,
    pub user_id: String,
    pub amount: Decimal,
}

/// One staged write of a batch.
///
/// Every operation is conditional on the record still being in the state the
/// caller observed; operations whose guard fails are skipped, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BatchOp {
    /// Mark a wager settled with its final payout, only if still active.
    /// The credit, when present, is applied only if the status update was.
    SettleWager {
        wager_id: Uuid,
        payout: Decimal,
        credit: Option<BalanceCredit>,
    },
    /// Close an event and stop wagering, only if still open
    CloseEvent { event_id: Uuid },
}

impl BatchOp {
    pub fn lose(wager_id: Uuid) -> Self {
        BatchOp::SettleWager {
            wager_id,
            payout: Decimal::ZERO,
            credit: None,
        }
    }

    pub fn win(wager_id: Uuid, group_id: Uuid, user_id: impl Into<String>, winnings: Decimal) -> Self {
        BatchOp::SettleWager {
            wager_id,
            payout: winnings,
            credit: Some(BalanceCredit {
                group_id,
                user_id: user_id.into(),
                amount: winnings,
            }),
        }
    }
}

/// What a committed batch actually changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Operations whose guard held and were written
    pub applied: usize,
    /// Operations skipped because the record moved on (or vanished)
    pub skipped: usize,
}

impl BatchOutcome {
    pub fn record(&mut self, applied: bool) {
        if applied {
            self.applied += 1;
        } else {
            self.skipped += 1;
        }
    }
}
