use super::PgStore;
use crate::error::RepositoryError;
use crate::models::{Pick, Wager, WagerStatus};
use crate::repositories::{RepoResult, WagerStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

const WAGER_COLUMNS: &str = r#"
    id,
    group_id,
    user_id,
    event_ids,
    picks,
    risk,
    multiplier,
    odds,
    payout,
    status,
    placed_at,
    settled_at
"#;

#[derive(Debug, FromRow)]
struct WagerRow {
    id: Uuid,
    group_id: Uuid,
    user_id: String,
    event_ids: Vec<Uuid>,
    picks: Json<Vec<Pick>>,
    risk: Decimal,
    multiplier: Decimal,
    odds: Decimal,
    payout: Option<Decimal>,
    status: String,
    placed_at: DateTime<Utc>,
    settled_at: Option<DateTime<Utc>>,
}

impl TryFrom<WagerRow> for Wager {
    type Error = RepositoryError;

    fn try_from(row: WagerRow) -> Result<Self, Self::Error> {
        let status = WagerStatus::from_str(&row.status)
            .map_err(|e| RepositoryError::Corrupt(format!("wager {}: {}", row.id, e)))?;

        Ok(Wager {
            id: row.id,
            group_id: row.group_id,
            user_id: row.user_id,
            event_ids: row.event_ids,
            picks: row.picks.0,
            risk: row.risk,
            multiplier: row.multiplier,
            odds: row.odds,
            payout: row.payout,
            status,
            placed_at: row.placed_at,
            settled_at: row.settled_at,
        })
    }
}

fn into_wagers(rows: Vec<WagerRow>) -> RepoResult<Vec<Wager>> {
    rows.into_iter().map(Wager::try_from).collect()
}

#[async_trait]
impl WagerStore for PgStore {
    async fn get_wager(&self, id: Uuid) -> RepoResult<Option<Wager>> {
        let row = sqlx::query_as::<_, WagerRow>(&format!(
            "SELECT {} FROM wagers WHERE id = $1",
            WAGER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(Wager::try_from).transpose()
    }

    async fn wagers_referencing_event(&self, event_id: Uuid) -> RepoResult<Vec<Wager>> {
        let rows = sqlx::query_as::<_, WagerRow>(&format!(
            "SELECT {} FROM wagers WHERE event_ids @> ARRAY[$1]::uuid[] ORDER BY placed_at ASC",
            WAGER_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(self.pool())
        .await?;

        into_wagers(rows)
    }

    async fn wagers_by_user(&self, user_id: &str) -> RepoResult<Vec<Wager>> {
        let rows = sqlx::query_as::<_, WagerRow>(&format!(
            "SELECT {} FROM wagers WHERE user_id = $1 ORDER BY placed_at DESC",
            WAGER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        into_wagers(rows)
    }

    async fn place_wager(&self, wager: &Wager) -> RepoResult<bool> {
        let mut tx = self.pool().begin().await?;

        let debited = sqlx::query(
            r#"
            UPDATE group_members
            SET balance = balance - $3
            WHERE group_id = $1 AND user_id = $2 AND balance >= $3
            "#,
        )
        .bind(wager.group_id)
        .bind(&wager.user_id)
        .bind(wager.risk)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !debited {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO wagers
                (id, group_id, user_id, event_ids, picks, risk, multiplier, odds, payout, status, placed_at, settled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(wager.id)
        .bind(wager.group_id)
        .bind(&wager.user_id)
        .bind(&wager.event_ids)
        .bind(Json(&wager.picks))
        .bind(wager.risk)
        .bind(wager.multiplier)
        .bind(wager.odds)
        .bind(wager.payout)
        .bind(wager.status.as_str())
        .bind(wager.placed_at)
        .bind(wager.settled_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
