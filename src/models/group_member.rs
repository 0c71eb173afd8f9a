use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A betting group; each member holds a balance scoped to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    /// Balance new members start with
    pub starting_currency: Decimal,
}

/// A user's membership in a group, carrying their spendable balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: String,
    pub display_name: Option<String>,
    pub balance: Decimal,
    pub joined_at: DateTime<Utc>,
}

impl GroupMember {
    /// Create a member seeded with the group's starting currency
    pub fn new(group: &Group, user_id: impl Into<String>, joined_at: DateTime<Utc>) -> Self {
        Self {
            group_id: group.id,
            user_id: user_id.into(),
            display_name: None,
            balance: group.starting_currency,
            joined_at,
        }
    }

    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}
