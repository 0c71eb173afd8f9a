//! Member balances

use super::PgStore;
use crate::models::GroupMember;
use crate::repositories::{BalanceLedger, RepoResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct MemberRow {
    group_id: Uuid,
    user_id: String,
    display_name: Option<String>,
    balance: Decimal,
    joined_at: DateTime<Utc>,
}

impl From<MemberRow> for GroupMember {
    fn from(row: MemberRow) -> Self {
        Self {
            group_id: row.group_id,
            user_id: row.user_id,
            display_name: row.display_name,
            balance: row.balance,
            joined_at: row.joined_at,
        }
    }
}

/// Add `amount` to a member balance on an open connection or transaction
pub(super) async fn credit(
    conn: &mut PgConnection,
    group_id: Uuid,
    user_id: &str,
    amount: Decimal,
) -> RepoResult<Decimal> {
    let balance: Decimal = sqlx::query_scalar(
        r#"
        INSERT INTO group_members (group_id, user_id, balance)
        VALUES ($1, $2, $3)
        ON CONFLICT (group_id, user_id) DO UPDATE
        SET balance = group_members.balance + EXCLUDED.balance
        RETURNING balance
        "#,
    )
    .bind(group_id)
    .bind(user_id)
    .bind(amount)
    .fetch_one(&mut *conn)
    .await?;

    Ok(balance)
}

#[async_trait]
impl BalanceLedger for PgStore {
    async fn get_member(&self, group_id: Uuid, user_id: &str) -> RepoResult<Option<GroupMember>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT group_id, user_id, display_name, balance, joined_at
            FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(GroupMember::from))
    }

    async fn increment_balance(&self, group_id: Uuid, user_id: &str, amount: Decimal) -> RepoResult<Decimal> {
        let mut conn = self.pool().acquire().await?;
        credit(&mut *conn, group_id, user_id, amount).await
    }
}
