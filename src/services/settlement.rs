use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::models::{BatchOp, Event, EventType, Wager};
use crate::repositories::Store;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Summary of one settlement pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub event_id: Uuid,
    /// Wagers whose state changed in this pass
    pub wagers_processed: usize,
    /// Active wagers looked at
    pub wagers_examined: usize,
    /// Winning so far but waiting on other events
    pub wagers_pending: usize,
    /// Skipped because they could not be evaluated
    pub wagers_failed: usize,
}

impl SettlementReport {
    fn new(event_id: Uuid) -> Self {
        Self {
            event_id,
            ..Self::default()
        }
    }
}

/// Verdict for one wager in one pass
#[derive(Debug, Clone, PartialEq)]
enum Resolution {
    Lost,
    Won(Decimal),
    Pending,
}

/// Resolves the wagers depending on an event once it settles.
///
/// Every pass re-evaluates the still-active wagers from scratch against the
/// stored results of every event they reference, so no partial settlement
/// state is ever persisted. Writes are staged and committed as one batch in
/// which each wager update is conditional on the wager still being active.
pub struct SettlementEngine {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl SettlementEngine {
    /// Create a new settlement engine
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Settle every wager that can now be decided because `event_id` settled.
    ///
    /// Fails fast if the stored event is missing or not settled with results.
    /// Individual wagers that cannot be evaluated are logged and skipped.
    pub async fn on_event_settled(
        &self,
        event_id: Uuid,
        results: &[String],
        event_type: &EventType,
    ) -> AppResult<SettlementReport> {
        let event = self
            .store
            .get_event(event_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))?;

        if !event.is_settled() || event.results.is_empty() {
            return Err(AppError::InvalidState(format!(
                "Event {} is {} with {} results; settlement requires a settled event with results",
                event_id,
                event.status,
                event.results.len()
            )));
        }

        if event.results != results || &event.event_type != event_type {
            warn!(
                "Settlement of event {} requested with {:?}/{} but stored record has {:?}/{}; using stored",
                event_id,
                results,
                event_type.as_str(),
                event.results,
                event.event_type.as_str()
            );
        }

        let wagers = self
            .store
            .wagers_referencing_event(event_id)
            .await
            .map_err(AppError::from)?;

        let mut report = SettlementReport::new(event_id);
        let mut ops = Vec::new();
        let mut events: HashMap<Uuid, Event> = HashMap::new();
        events.insert(event.id, event.clone());

        for wager in wagers.iter().filter(|w| w.is_active()) {
            report.wagers_examined += 1;

            match self.resolve(&event, wager, &mut events).await {
                Ok(Resolution::Lost) => {
                    debug!("Wager {} lost on event {}", wager.id, event_id);
                    ops.push(BatchOp::lose(wager.id));
                }
                Ok(Resolution::Won(winnings)) => {
                    debug!("Wager {} won {} on event {}", wager.id, winnings, event_id);
                    ops.push(BatchOp::win(wager.id, wager.group_id, wager.user_id.clone(), winnings));
                }
                Ok(Resolution::Pending) => {
                    report.wagers_pending += 1;
                }
                Err(e) => {
                    warn!("Skipping wager {} during settlement of event {}: {}", wager.id, event_id, e);
                    report.wagers_failed += 1;
                }
            }
        }

        let outcome = self
            .store
            .apply_batch(&ops, self.clock.now())
            .await
            .map_err(AppError::from)?;

        if outcome.skipped > 0 {
            debug!(
                "{} wager updates for event {} were already applied by another pass",
                outcome.skipped, event_id
            );
        }

        report.wagers_processed = outcome.applied;

        info!(
            "Settled event {}: {} wagers processed, {} pending, {} failed",
            event_id, report.wagers_processed, report.wagers_pending, report.wagers_failed
        );

        Ok(report)
    }

    /// Decide one wager against the just-settled `event`
    async fn resolve(
        &self,
        event: &Event,
        wager: &Wager,
        events: &mut HashMap<Uuid, Event>,
    ) -> AppResult<Resolution> {
        wager.validate_picks().map_err(AppError::Validation)?;

        let pick = wager.pick_for(event.id).ok_or_else(|| {
            AppError::Validation(format!("Wager {} has no pick for event {}", wager.id, event.id))
        })?;

        // A single wrong leg loses the parlay.
        if !event.event_type.is_correct(&event.results, &pick.selection) {
            return Ok(Resolution::Lost);
        }

        self.load_events(wager, events).await?;

        let mut waiting = false;
        for event_id in &wager.event_ids {
            let leg = events.get(event_id).ok_or_else(|| {
                AppError::DependencyUnavailable(format!(
                    "Event {} referenced by wager {} is missing",
                    event_id, wager.id
                ))
            })?;
            let pick = wager.pick_for(*event_id).ok_or_else(|| {
                AppError::Validation(format!("Wager {} has no pick for event {}", wager.id, event_id))
            })?;

            match leg.judge(&pick.selection) {
                Some(true) => {}
                // Left over when the pass for that leg failed to commit.
                Some(false) => return Ok(Resolution::Lost),
                None => waiting = true,
            }
        }

        if waiting {
            return Ok(Resolution::Pending);
        }
        Ok(Resolution::Won(wager.winnings()))
    }

    /// Fetch the wager's referenced events not yet read in this pass.
    /// A referenced event that no longer exists is a dependency failure.
    async fn load_events(&self, wager: &Wager, events: &mut HashMap<Uuid, Event>) -> AppResult<()> {
        let missing: Vec<Uuid> = wager
            .event_ids
            .iter()
            .filter(|id| !events.contains_key(id))
            .copied()
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        let fetched = futures::future::try_join_all(missing.iter().map(|id| self.store.get_event(*id)))
            .await
            .map_err(AppError::from)?;

        for (id, event) in missing.into_iter().zip(fetched) {
            match event {
                Some(event) => {
                    events.insert(id, event);
                }
                None => {
                    return Err(AppError::DependencyUnavailable(format!(
                        "Event {} referenced by wager {} no longer exists",
                        id, wager.id
                    )))
                }
            }
        }

        Ok(())
    }
}
