use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tip {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "id, title, description, category, image, is_active, created_at, updated_at";

impl Tip {
    /// Active tips only; what anonymous visitors see.
    pub async fn list_active(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Tip>> {
        let rows = sqlx::query_as::<_, Tip>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM tips
            WHERE is_active = TRUE
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_active(db: &PgPool) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tips WHERE is_active = TRUE")
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    /// Every tip, active or not; admin view.
    pub async fn list_all(db: &PgPool, limit: i64, offset: i64) -> anyhow::Result<Vec<Tip>> {
        let rows = sqlx::query_as::<_, Tip>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM tips
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn count_all(db: &PgPool) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tips")
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Tip>> {
        let tip = sqlx::query_as::<_, Tip>(&format!(
            r#"SELECT {COLUMNS} FROM tips WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(tip)
    }

    pub async fn create(
        db: &PgPool,
        title: &str,
        description: &str,
        category: Option<&str>,
        image: &str,
    ) -> anyhow::Result<Tip> {
        let tip = sqlx::query_as::<_, Tip>(&format!(
            r#"
            INSERT INTO tips (title, description, category, image)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(image)
        .fetch_one(db)
        .await?;
        Ok(tip)
    }

    /// Partial update: NULL arguments keep the stored value.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        image: Option<&str>,
        is_active: Option<bool>,
    ) -> anyhow::Result<Option<Tip>> {
        let tip = sqlx::query_as::<_, Tip>(&format!(
            r#"
            UPDATE tips
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                image = COALESCE($5, image),
                is_active = COALESCE($6, is_active),
                updated_at = now()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(image)
        .bind(is_active)
        .fetch_optional(db)
        .await?;
        Ok(tip)
    }

    /// Returns false when no row matched.
    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM tips WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
