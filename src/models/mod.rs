//! Domain models for the settlement backend.
//!
//! Events, parlay wagers, groups with member balances, and the batched
//! writes the stores apply atomically.

pub mod balance;
pub mod event;
pub mod group_member;
pub mod wager;

// Re-export all models for convenient access
pub use balance::{BalanceCredit, BatchOp, BatchOutcome};
pub use event::{Event, EventStatus, EventType, EventUpdate, NewEvent};
pub use group_member::{Group, GroupMember};
pub use wager::{NewWager, Pick, Wager, WagerStatus};
