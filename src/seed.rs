//! Startup seeding: default roles and the admin account. Idempotent.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::repo::{assign_role, ensure_role, User};
use crate::auth::services::hash_password;
use crate::config::AppConfig;

pub async fn seed_roles(db: &PgPool) -> anyhow::Result<()> {
    ensure_role(db, "Admin", crate::auth::roles::ADMIN).await?;
    ensure_role(db, "User", crate::auth::roles::USER).await?;
    Ok(())
}

pub async fn seed_admin_user(db: &PgPool, config: &AppConfig) -> anyhow::Result<()> {
    let Some(seed) = &config.admin_seed else {
        warn!("admin seed credentials not configured; skipping admin user");
        return Ok(());
    };

    if User::find_by_email(db, &seed.email).await?.is_some() {
        info!(email = %seed.email, "admin user already exists");
        return Ok(());
    }

    let hash = hash_password(&seed.password)?;
    let user = User::create(db, &seed.name, &seed.email, &hash).await?;
    assign_role(db, user.id, crate::auth::roles::ADMIN).await?;
    info!(user_id = %user.id, email = %user.email, "admin user created");
    Ok(())
}
