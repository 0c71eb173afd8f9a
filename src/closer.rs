use crate::clock::Clock;
use crate::error::{AppError, AppResult};
use crate::models::BatchOp;
use crate::repositories::Store;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info};

/// Background task that closes open events once their lock date passes.
///
/// Closing only stops new wagers; it never touches balances or triggers
/// settlement.
pub struct EventCloser {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl EventCloser {
    /// Create a new closer
    ///
    /// # Arguments
    /// * `store` - Event store the sweep reads from and writes to
    /// * `clock` - Source of "now" for each run
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            interval: Duration::from_secs(300),
        }
    }

    /// Set sweep interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the closer background task
    pub async fn start(self) {
        let mut interval = time::interval(self.interval);
        info!("Event closer started, sweeping every {:?}", self.interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.run_once().await {
                error!("Error closing past events: {}", e);
            }
        }
    }

    /// One sweep at the clock's current time
    pub async fn run_once(&self) -> AppResult<usize> {
        self.close_due_events(self.clock.now()).await
    }

    /// Close every open event with `lock_date <= now` in a single batch.
    /// Returns how many events were closed.
    pub async fn close_due_events(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let due = self.store.due_open_events(now).await.map_err(AppError::from)?;

        if due.is_empty() {
            debug!("No events due for closing");
            return Ok(0);
        }

        let ops: Vec<BatchOp> = due
            .iter()
            .map(|event| BatchOp::CloseEvent { event_id: event.id })
            .collect();

        let outcome = self.store.apply_batch(&ops, now).await.map_err(AppError::from)?;

        info!("Closed {} events past their lock date", outcome.applied);
        Ok(outcome.applied)
    }
}
