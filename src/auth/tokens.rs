//! Token lifecycle bookkeeping.
//!
//! Every issued token gets exactly one `token_blocklist` row at issuance.
//! A token counts as revoked when its row is missing (fail-closed: a token
//! whose issuance record was lost is rejected) or when `revoked_at` is set.
//! Rows are never deleted here; expired ones are reaped externally.

use sqlx::PgPool;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::dto::{Claims, JwtKeys, TokenPairResponse};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Insert the blocklist row for a freshly signed token.
pub async fn record(db: &PgPool, claims: &Claims) -> anyhow::Result<()> {
    let expires = OffsetDateTime::from_unix_timestamp(claims.exp as i64)?;
    sqlx::query(
        r#"
        INSERT INTO token_blocklist (jti, token_type, user_id, expires)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(claims.jti)
    .bind(claims.kind.as_str())
    .bind(claims.sub)
    .bind(expires)
    .execute(db)
    .await?;
    debug!(jti = %claims.jti, kind = claims.kind.as_str(), "token recorded");
    Ok(())
}

/// A token with no blocklist row counts as revoked.
pub async fn is_revoked(db: &PgPool, jti: Uuid) -> anyhow::Result<bool> {
    let revoked_at: Option<Option<OffsetDateTime>> = sqlx::query_scalar(
        r#"
        SELECT revoked_at FROM token_blocklist WHERE jti = $1
        "#,
    )
    .bind(jti)
    .fetch_optional(db)
    .await?;
    Ok(match revoked_at {
        None => true,
        Some(revoked_at) => revoked_at.is_some(),
    })
}

/// Mark a token revoked. Matches both jti and user id so one user cannot
/// revoke another's token by guessing a jti.
pub async fn revoke(db: &PgPool, jti: Uuid, user_id: Uuid) -> Result<(), TokenError> {
    let result = sqlx::query(
        r#"
        UPDATE token_blocklist
        SET revoked_at = now()
        WHERE jti = $1 AND user_id = $2
        "#,
    )
    .bind(jti)
    .bind(user_id)
    .execute(db)
    .await?;
    if result.rows_affected() == 0 {
        return Err(TokenError::NotFound(jti));
    }
    info!(%jti, %user_id, "token revoked");
    Ok(())
}

/// Sign an access+refresh pair and record both in the blocklist.
pub async fn issue_pair(
    db: &PgPool,
    keys: &JwtKeys,
    user_id: Uuid,
) -> anyhow::Result<TokenPairResponse> {
    let (access_token, access_claims) = keys.sign_access(user_id)?;
    let (refresh_token, refresh_claims) = keys.sign_refresh(user_id)?;
    record(db, &access_claims).await?;
    record(db, &refresh_claims).await?;
    Ok(TokenPairResponse {
        access_token,
        refresh_token,
    })
}

/// Sign and record a new access token. Used by the refresh flow; the
/// presented refresh token stays valid (no rotation).
pub async fn issue_access(db: &PgPool, keys: &JwtKeys, user_id: Uuid) -> anyhow::Result<String> {
    let (access_token, claims) = keys.sign_access(user_id)?;
    record(db, &claims).await?;
    Ok(access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::TokenKind;
    use crate::auth::repo::User;

    #[test]
    fn not_found_error_names_the_jti() {
        let jti = Uuid::new_v4();
        let err = TokenError::NotFound(jti);
        assert!(err.to_string().contains(&jti.to_string()));
    }

    fn claims_for(user_id: Uuid) -> Claims {
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        Claims {
            sub: user_id,
            jti: Uuid::new_v4(),
            exp: now + 3600,
            iat: now,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
            kind: TokenKind::Access,
        }
    }

    async fn make_user(db: &PgPool) -> User {
        let email = format!("{}@example.com", Uuid::new_v4().simple());
        User::create(db, "Alice", &email, "hash").await.unwrap()
    }

    #[sqlx::test]
    async fn recorded_token_is_valid_until_revoked(pool: PgPool) {
        let user = make_user(&pool).await;
        let claims = claims_for(user.id);

        record(&pool, &claims).await.unwrap();
        assert!(!is_revoked(&pool, claims.jti).await.unwrap());

        revoke(&pool, claims.jti, user.id).await.unwrap();
        assert!(is_revoked(&pool, claims.jti).await.unwrap());
    }

    #[sqlx::test]
    async fn missing_blocklist_row_counts_as_revoked(pool: PgPool) {
        assert!(is_revoked(&pool, Uuid::new_v4()).await.unwrap());
    }

    #[sqlx::test]
    async fn revoke_requires_the_owning_user(pool: PgPool) {
        let owner = make_user(&pool).await;
        let other = make_user(&pool).await;
        let claims = claims_for(owner.id);
        record(&pool, &claims).await.unwrap();

        let err = revoke(&pool, claims.jti, other.id).await.unwrap_err();
        assert!(matches!(err, TokenError::NotFound(_)));
        // The owner's token stays valid.
        assert!(!is_revoked(&pool, claims.jti).await.unwrap());
    }

    #[sqlx::test]
    async fn issue_pair_records_both_tokens(pool: PgPool) {
        use axum::extract::FromRef;
        let user = make_user(&pool).await;
        let keys = JwtKeys::from_ref(&crate::state::AppState::fake());
        issue_pair(&pool, &keys, user.id).await.unwrap();

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM token_blocklist WHERE user_id = $1")
                .bind(user.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 2);
    }
}
