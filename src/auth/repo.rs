use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Find a user by email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Slugs of every role assigned to the user.
    pub async fn role_slugs(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<String>> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.slug
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(slugs)
    }
}

/// Assign a role (by slug) to a user. Errors if the role does not exist;
/// assigning an already-held role is a no-op.
pub async fn assign_role(db: &PgPool, user_id: Uuid, slug: &str) -> anyhow::Result<()> {
    let role_id: Option<Uuid> = sqlx::query_scalar(r#"SELECT id FROM roles WHERE slug = $1"#)
        .bind(slug)
        .fetch_optional(db)
        .await?;
    let role_id = role_id.ok_or_else(|| anyhow::anyhow!("Role '{slug}' does not exist"))?;
    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(role_id)
    .execute(db)
    .await?;
    Ok(())
}

/// Insert a role if its slug is not present yet.
pub async fn ensure_role(db: &PgPool, name: &str, slug: &str) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO roles (name, slug)
        VALUES ($1, $2)
        ON CONFLICT (slug) DO NOTHING
        "#,
    )
    .bind(name)
    .bind(slug)
    .execute(db)
    .await?;
    Ok(())
}
