pub mod event_service;
pub mod settlement;
pub mod wager_service;

pub use event_service::{EventService, EventUpdateOutcome};
pub use settlement::{SettlementEngine, SettlementReport};
pub use wager_service::WagerService;
