use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub coin_id: i64,
    pub added_at: OffsetDateTime,
}

impl WatchlistEntry {
    pub async fn page_for_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<WatchlistEntry>> {
        let rows = sqlx::query_as::<_, WatchlistEntry>(
            r#"
            SELECT id, user_id, coin_id, added_at
            FROM watchlist
            WHERE user_id = $1
            ORDER BY added_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM watchlist WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(db)
                .await?;
        Ok(count)
    }

    /// Application-level duplicate check. Not atomic with the insert:
    /// concurrent identical requests can still slip through.
    pub async fn exists(db: &PgPool, user_id: Uuid, coin_id: i64) -> anyhow::Result<bool> {
        let found: Option<Uuid> = sqlx::query_scalar(
            r#"SELECT id FROM watchlist WHERE user_id = $1 AND coin_id = $2"#,
        )
        .bind(user_id)
        .bind(coin_id)
        .fetch_optional(db)
        .await?;
        Ok(found.is_some())
    }

    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        coin_id: i64,
    ) -> anyhow::Result<WatchlistEntry> {
        let entry = sqlx::query_as::<_, WatchlistEntry>(
            r#"
            INSERT INTO watchlist (user_id, coin_id)
            VALUES ($1, $2)
            RETURNING id, user_id, coin_id, added_at
            "#,
        )
        .bind(user_id)
        .bind(coin_id)
        .fetch_one(db)
        .await?;
        Ok(entry)
    }

    /// Returns false when the coin was not on the user's watchlist.
    pub async fn remove(db: &PgPool, user_id: Uuid, coin_id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"DELETE FROM watchlist WHERE user_id = $1 AND coin_id = $2"#,
        )
        .bind(user_id)
        .bind(coin_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
