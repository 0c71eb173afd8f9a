use crate::clock::{Clock, IdGenerator};
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventStatus, EventType, EventUpdate, NewEvent};
use crate::repositories::Store;
use crate::services::settlement::{SettlementEngine, SettlementReport};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Result of a lifecycle update
#[derive(Debug, Clone, Serialize)]
pub struct EventUpdateOutcome {
    pub event: Event,
    /// Present when the update moved the event into `settled`
    pub settlement: Option<SettlementReport>,
}

/// Service for managing events and their lifecycle
pub struct EventService {
    store: Arc<dyn Store>,
    settlement: Arc<SettlementEngine>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    default_lock_window: chrono::Duration,
}

impl EventService {
    pub fn new(
        store: Arc<dyn Store>,
        settlement: Arc<SettlementEngine>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            settlement,
            clock,
            ids,
            default_lock_window: chrono::Duration::hours(1),
        }
    }

    /// Set the lock window used when an event is created without a lock date
    pub fn with_default_lock_window(mut self, window: chrono::Duration) -> Self {
        self.default_lock_window = window;
        self
    }

    /// Create a new open event
    pub async fn create_event(&self, new_event: NewEvent) -> AppResult<Event> {
        info!(
            "Creating event: group={}, type={}",
            new_event.group_id,
            new_event.event_type.as_str()
        );

        self.store
            .get_group(new_event.group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", new_event.group_id)))?;

        validate_options(&new_event.options)?;

        let now = self.clock.now();
        let lock_date = match new_event.lock_date {
            Some(lock_date) if lock_date <= now => {
                return Err(AppError::Validation(format!(
                    "Lock date {} is not in the future",
                    lock_date
                )));
            }
            Some(lock_date) => lock_date,
            None => now + self.default_lock_window,
        };

        let event = Event::new(
            self.ids.next_id(),
            new_event.group_id,
            new_event.event_type,
            new_event.options,
            lock_date,
            now,
        );

        self.store.insert_event(&event).await?;

        info!("Created event {} (locks at {})", event.id, event.lock_date);
        Ok(event)
    }

    /// Get an event by id
    pub async fn get_event(&self, event_id: Uuid) -> AppResult<Event> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))
    }

    /// Events of a group that still accept wagers
    pub async fn list_group_events(&self, group_id: Uuid) -> AppResult<Vec<Event>> {
        self.store
            .get_group(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))?;

        let events = self.store.events_by_group(group_id).await?;
        Ok(events.into_iter().filter(|e| e.accepting_wagers).collect())
    }

    /// Apply a status/results/admission update.
    ///
    /// A transition into `settled` runs the settlement engine before
    /// returning. If that pass fails, the status change stays persisted and
    /// the caller gets [`AppError::PartialFailure`].
    pub async fn update_event(&self, event_id: Uuid, update: EventUpdate) -> AppResult<EventUpdateOutcome> {
        if update.is_empty() {
            return Err(AppError::Validation("No valid fields provided to update".into()));
        }

        let current = self.get_event(event_id).await?;
        let target = update.status.unwrap_or(current.status);

        if !current.status.can_transition_to(target) {
            return Err(AppError::InvalidState(format!(
                "Event {} cannot move from {} to {}",
                event_id, current.status, target
            )));
        }

        let mut next = current.clone();

        match (&update.results, target) {
            (Some(_), status) if status != EventStatus::Settled => {
                return Err(AppError::Validation(
                    "Results can only be supplied when settling an event".into(),
                ));
            }
            (results, EventStatus::Settled) => {
                let results = results.clone().unwrap_or_default();
                validate_results(&current, &results)?;
                next.results = results;
            }
            _ => {}
        }

        if let Some(accepting) = update.accepting_wagers {
            if accepting && target != EventStatus::Open {
                return Err(AppError::InvalidState(format!(
                    "Event {} is {}; wagering cannot be reopened",
                    event_id, target
                )));
            }
            next.accepting_wagers = accepting;
        }

        if target != EventStatus::Open {
            next.accepting_wagers = false;
        }
        next.status = target;
        next.updated_at = self.clock.now();

        if !self.store.update_event_if_status(current.status, &next).await? {
            return Err(AppError::InvalidState(format!(
                "Event {} changed while being updated",
                event_id
            )));
        }

        if current.status != target {
            info!("Event {} moved from {} to {}", event_id, current.status, target);
        }

        if target != EventStatus::Settled {
            return Ok(EventUpdateOutcome {
                event: next,
                settlement: None,
            });
        }

        match self
            .settlement
            .on_event_settled(event_id, &next.results, &next.event_type)
            .await
        {
            Ok(report) => Ok(EventUpdateOutcome {
                event: next,
                settlement: Some(report),
            }),
            Err(e) => {
                error!("Event {} settled but settlement pass failed: {}", event_id, e);
                Err(AppError::PartialFailure {
                    event_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Delete an event outright. Does not settle dependent wagers.
    pub async fn delete_event(&self, event_id: Uuid) -> AppResult<()> {
        if !self.store.delete_event(event_id).await? {
            return Err(AppError::NotFound(format!("Event {} not found", event_id)));
        }

        info!("Deleted event {}", event_id);
        Ok(())
    }
}

fn validate_options(options: &[String]) -> AppResult<()> {
    if options.is_empty() {
        return Err(AppError::Validation("At least one option is required".into()));
    }

    let mut seen = HashSet::new();
    for option in options {
        if option.trim().is_empty() {
            return Err(AppError::Validation("Options must not be blank".into()));
        }
        if !seen.insert(option.as_str()) {
            return Err(AppError::Validation(format!("Duplicate option: {}", option)));
        }
    }

    Ok(())
}

fn validate_results(event: &Event, results: &[String]) -> AppResult<()> {
    if results.is_empty() {
        return Err(AppError::Validation(
            "Settling an event requires a non-empty results list".into(),
        ));
    }

    if event.event_type == EventType::SingleOutcome && results.len() != 1 {
        return Err(AppError::Validation(format!(
            "Single-outcome event {} takes exactly one result, got {}",
            event.id,
            results.len()
        )));
    }

    let mut seen = HashSet::new();
    for result in results {
        if !event.has_option(result) {
            return Err(AppError::Validation(format!(
                "Result {} is not an option of event {}",
                result, event.id
            )));
        }
        if !seen.insert(result.as_str()) {
            return Err(AppError::Validation(format!("Duplicate result: {}", result)));
        }
    }

    Ok(())
}
