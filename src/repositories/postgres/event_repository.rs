use super::PgStore;
use crate::error::RepositoryError;
use crate::models::{Event, EventStatus, EventType};
use crate::repositories::{EventStore, RepoResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

const EVENT_COLUMNS: &str = r#"
    id,
    group_id,
    event_type,
    options,
    status,
    lock_date,
    results,
    accepting_wagers,
    created_at,
    updated_at
"#;

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    group_id: Uuid,
    event_type: String,
    options: Vec<String>,
    status: String,
    lock_date: DateTime<Utc>,
    results: Vec<String>,
    accepting_wagers: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = RepositoryError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = EventStatus::from_str(&row.status)
            .map_err(|e| RepositoryError::Corrupt(format!("event {}: {}", row.id, e)))?;

        Ok(Event {
            id: row.id,
            group_id: row.group_id,
            event_type: EventType::from(row.event_type),
            options: row.options,
            status,
            lock_date: row.lock_date,
            results: row.results,
            accepting_wagers: row.accepting_wagers,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_events(rows: Vec<EventRow>) -> RepoResult<Vec<Event>> {
    rows.into_iter().map(Event::try_from).collect()
}

#[async_trait]
impl EventStore for PgStore {
    async fn insert_event(&self, event: &Event) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO events
                (id, group_id, event_type, options, status, lock_date, results, accepting_wagers, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(event.id)
        .bind(event.group_id)
        .bind(event.event_type.as_str())
        .bind(&event.options)
        .bind(event.status.as_str())
        .bind(event.lock_date)
        .bind(&event.results)
        .bind(event.accepting_wagers)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(self.pool())
        .await?;

        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> RepoResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(Event::try_from).transpose()
    }

    async fn events_by_group(&self, group_id: Uuid) -> RepoResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE group_id = $1 ORDER BY created_at DESC",
            EVENT_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(self.pool())
        .await?;

        into_events(rows)
    }

    async fn due_open_events(&self, now: DateTime<Utc>) -> RepoResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE status = 'open' AND lock_date <= $1 ORDER BY lock_date ASC",
            EVENT_COLUMNS
        ))
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        into_events(rows)
    }

    async fn update_event_if_status(&self, expected: EventStatus, event: &Event) -> RepoResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE events
            SET status = $3, results = $4, accepting_wagers = $5, updated_at = $6
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(event.id)
        .bind(expected.as_str())
        .bind(event.status.as_str())
        .bind(&event.results)
        .bind(event.accepting_wagers)
        .bind(event.updated_at)
        .execute(self.pool())
        .await?
        .rows_affected();

        Ok(rows_affected == 1)
    }

    async fn delete_event(&self, id: Uuid) -> RepoResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?
            .rows_affected();

        Ok(rows_affected > 0)
    }
}
