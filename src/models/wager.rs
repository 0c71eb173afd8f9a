use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wager status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WagerStatus {
    Active,
    Settled,
}

impl WagerStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "active" => Ok(WagerStatus::Active),
            "settled" => Ok(WagerStatus::Settled),
            _ => Err(format!("Invalid wager status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            WagerStatus::Active => "active",
            WagerStatus::Settled => "settled",
        }
    }
}

/// A user's selected label for one event of a parlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    pub event_id: Uuid,
    pub selection: String,
}

impl Pick {
    pub fn new(event_id: Uuid, selection: impl Into<String>) -> Self {
        Self {
            event_id,
            selection: selection.into(),
        }
    }
}

/// Parlay wager: wins only if every pick is correct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: String,
    pub event_ids: Vec<Uuid>,
    pub picks: Vec<Pick>,
    /// Amount debited from the member's balance at placement
    pub risk: Decimal,
    pub multiplier: Decimal,
    pub odds: Decimal,
    /// Set once at settlement, zero for losers
    pub payout: Option<Decimal>,
    pub status: WagerStatus,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Wager {
    pub fn is_active(&self) -> bool {
        self.status == WagerStatus::Active
    }

    /// The pick bound to `event_id`, if any
    pub fn pick_for(&self, event_id: Uuid) -> Option<&Pick> {
        self.picks.iter().find(|p| p.event_id == event_id)
    }

    /// Winnings credited when every leg is correct: `floor(risk * multiplier)`
    pub fn winnings(&self) -> Decimal {
        (self.risk * self.multiplier).round_dp_with_strategy(0, RoundingStrategy::ToNegativeInfinity)
    }

    /// Check that every event id has exactly one pick and no pick is orphaned
    pub fn validate_picks(&self) -> Result<(), String> {
        validate_picks(&self.event_ids, &self.picks)
    }
}

/// Shared by placement and by stored wagers
pub fn validate_picks(event_ids: &[Uuid], picks: &[Pick]) -> Result<(), String> {
    if event_ids.is_empty() {
        return Err("A wager must reference at least one event".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    for id in event_ids {
        if !seen.insert(*id) {
            return Err(format!("Event {} is referenced more than once", id));
        }
        let count = picks.iter().filter(|p| p.event_id == *id).count();
        if count != 1 {
            return Err(format!("Event {} must have exactly one pick, found {}", id, count));
        }
    }

    if let Some(orphan) = picks.iter().find(|p| !seen.contains(&p.event_id)) {
        return Err(format!("Pick for event {} is not in event_ids", orphan.event_id));
    }

    if let Some(empty) = picks.iter().find(|p| p.selection.trim().is_empty()) {
        return Err(format!("Pick for event {} has an empty selection", empty.event_id));
    }

    Ok(())
}

/// Input for placing a wager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWager {
    pub group_id: Uuid,
    pub user_id: String,
    pub event_ids: Vec<Uuid>,
    pub picks: Vec<Pick>,
    pub risk: Decimal,
    pub multiplier: Decimal,
    pub odds: Decimal,
}
