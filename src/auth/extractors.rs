use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::dto::{JwtKeys, TokenKind};
use super::tokens;
use crate::error::ApiError;
use crate::state::AppState;

/// Extracts and validates a bearer JWT, including the blocklist check.
/// Carries the jti so revoke handlers can act on the presented token.
pub struct AuthUser {
    pub user_id: Uuid,
    pub jti: Uuid,
}

/// Same as [`AuthUser`] but requires a refresh token.
pub struct RefreshUser {
    pub user_id: Uuid,
    pub jti: Uuid,
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;
    auth.strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))
}

async fn authenticate(
    parts: &Parts,
    state: &AppState,
    required: TokenKind,
) -> Result<(Uuid, Uuid), ApiError> {
    let keys = JwtKeys::from_ref(state);
    let token = bearer_token(parts)?;

    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    if claims.kind != required {
        return Err(ApiError::Unauthorized(match required {
            TokenKind::Access => "Access token required".into(),
            TokenKind::Refresh => "Refresh token required".into(),
        }));
    }

    // Revocation check on every authenticated request. A missing row counts
    // as revoked.
    let revoked = tokens::is_revoked(&state.db, claims.jti)
        .await
        .map_err(ApiError::Internal)?;
    if revoked {
        warn!(jti = %claims.jti, "revoked token presented");
        return Err(ApiError::Unauthorized("Token has been revoked".into()));
    }

    Ok((claims.sub, claims.jti))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (user_id, jti) = authenticate(parts, state, TokenKind::Access).await?;
        Ok(AuthUser { user_id, jti })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RefreshUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (user_id, jti) = authenticate(parts, state, TokenKind::Refresh).await?;
        Ok(RefreshUser { user_id, jti })
    }
}
