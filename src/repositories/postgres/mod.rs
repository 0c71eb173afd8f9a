//! PostgreSQL-backed store

mod balance_repository;
mod event_repository;
mod wager_repository;

use super::{BatchWriter, GroupStore, RepoResult};
use crate::models::{BatchOp, BatchOutcome, Group};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

/// Store over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new PgStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct GroupRow {
    id: Uuid,
    name: String,
    starting_currency: Decimal,
}

#[async_trait]
impl GroupStore for PgStore {
    async fn get_group(&self, id: Uuid) -> RepoResult<Option<Group>> {
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT id, name, starting_currency
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Group {
            id: r.id,
            name: r.name,
            starting_currency: r.starting_currency,
        }))
    }
}

#[async_trait]
impl BatchWriter for PgStore {
    async fn apply_batch(&self, ops: &[BatchOp], at: DateTime<Utc>) -> RepoResult<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        if ops.is_empty() {
            return Ok(outcome);
        }

        let mut tx = self.pool.begin().await?;

        for op in ops {
            match op {
                BatchOp::SettleWager {
                    wager_id,
                    payout,
                    credit,
                } => {
                    // Row lock on the wager serializes racing passes; the loser
                    // re-checks the predicate after the winner commits.
                    let settled = sqlx::query(
                        r#"
                        UPDATE wagers
                        SET status = 'settled', payout = $2, settled_at = $3
                        WHERE id = $1 AND status = 'active'
                        "#,
                    )
                    .bind(wager_id)
                    .bind(payout)
                    .bind(at)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
                        == 1;

                    if settled {
                        if let Some(credit) = credit {
                            balance_repository::credit(
                                &mut *tx,
                                credit.group_id,
                                &credit.user_id,
                                credit.amount,
                            )
                            .await?;
                        }
                    } else {
                        debug!("Wager {} no longer active, skipping", wager_id);
                    }
                    outcome.record(settled);
                }
                BatchOp::CloseEvent { event_id } => {
                    let closed = sqlx::query(
                        r#"
                        UPDATE events
                        SET status = 'closed', accepting_wagers = FALSE, updated_at = $2
                        WHERE id = $1 AND status = 'open'
                        "#,
                    )
                    .bind(event_id)
                    .bind(at)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
                        == 1;
                    outcome.record(closed);
                }
            }
        }

        tx.commit().await?;
        Ok(outcome)
    }
}
