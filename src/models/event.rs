use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event lifecycle status
///
/// Transitions only move forward: `Open` → `Closed` → `Settled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Open,
    Closed,
    Settled,
}

impl EventStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "open" => Ok(EventStatus::Open),
            "closed" => Ok(EventStatus::Closed),
            "settled" => Ok(EventStatus::Settled),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Open => "open",
            EventStatus::Closed => "closed",
            EventStatus::Settled => "settled",
        }
    }

    /// Whether moving from `self` to `next` respects the forward-only ordering.
    /// Staying put is allowed except on the terminal state.
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        !self.is_terminal() && next >= *self
    }

    pub fn is_terminal(&self) -> bool {
        *self == EventStatus::Settled
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluation semantics of an event's results
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EventType {
    /// Exactly one correct selection
    SingleOutcome,
    /// A set of acceptable selections
    MultiSelectOutcome,
    /// Any other tag; judged like a single-outcome event
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::SingleOutcome => "single-outcome",
            EventType::MultiSelectOutcome => "multi-select-outcome",
            EventType::Other(tag) => tag,
        }
    }

    /// Whether a picked label is correct against settled results.
    ///
    /// Multi-select events accept any label in `results`; every other type
    /// compares against the first (and only expected) result.
    pub fn is_correct(&self, results: &[String], pick: &str) -> bool {
        match self {
            EventType::MultiSelectOutcome => results.iter().any(|r| r == pick),
            _ => results.first().map(|r| r == pick).unwrap_or(false),
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "single-outcome" => EventType::SingleOutcome,
            "multi-select-outcome" => EventType::MultiSelectOutcome,
            _ => EventType::Other(s),
        }
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        EventType::from(s.to_string())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

/// A single resolvable proposition that wagers are placed against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub group_id: Uuid,
    pub event_type: EventType,
    pub options: Vec<String>,
    pub status: EventStatus,
    pub lock_date: DateTime<Utc>,
    /// Winning labels; empty until settled
    pub results: Vec<String>,
    pub accepting_wagers: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Create a new open event
    pub fn new(
        id: Uuid,
        group_id: Uuid,
        event_type: EventType,
        options: Vec<String>,
        lock_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            group_id,
            event_type,
            options,
            status: EventStatus::Open,
            lock_date,
            results: Vec::new(),
            accepting_wagers: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == EventStatus::Open
    }

    pub fn is_settled(&self) -> bool {
        self.status == EventStatus::Settled
    }

    /// Results are non-empty exactly when the event is settled
    pub fn is_consistent(&self) -> bool {
        self.is_settled() == !self.results.is_empty()
    }

    pub fn has_option(&self, label: &str) -> bool {
        self.options.iter().any(|o| o == label)
    }

    /// Whether a new wager referencing this event may be accepted at `now`
    pub fn admits_wagers_at(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.accepting_wagers && self.lock_date > now
    }

    /// Whether the scheduled closer should close this event at `now`
    pub fn is_due_for_close(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.lock_date <= now
    }

    /// Evaluate a pick against this event. `None` while the event is unsettled.
    pub fn judge(&self, pick: &str) -> Option<bool> {
        if !self.is_settled() || self.results.is_empty() {
            return None;
        }
        Some(self.event_type.is_correct(&self.results, pick))
    }
}

/// Fields a lifecycle update may carry. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub status: Option<EventStatus>,
    pub results: Option<Vec<String>>,
    pub accepting_wagers: Option<bool>,
}

impl EventUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.results.is_none() && self.accepting_wagers.is_none()
    }

    /// Settle with the given results
    pub fn settle(results: Vec<String>) -> Self {
        Self {
            status: Some(EventStatus::Settled),
            results: Some(results),
            accepting_wagers: None,
        }
    }

    pub fn close() -> Self {
        Self {
            status: Some(EventStatus::Closed),
            ..Self::default()
        }
    }
}

/// Input for creating an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub group_id: Uuid,
    pub event_type: EventType,
    pub options: Vec<String>,
    /// Defaults to one hour after creation
    pub lock_date: Option<DateTime<Utc>>,
}
