use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AccessTokenResponse, LoginRequest, PublicUser, RegisterRequest, TokenPairResponse,
        },
        extractors::{AuthUser, RefreshUser},
        repo::{self, User},
        services::{hash_password, verify_password, JwtKeys},
        tokens::{self, TokenError},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/revoke_access", delete(revoke_access))
        .route("/auth/revoke_refresh", delete(revoke_refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();
    payload.validate()?;

    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::field("email", "Email already exists"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.name, &payload.email, &hash).await?;
    repo::assign_role(&state.db, user.id, crate::auth::roles::USER).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.validate()?;

    let user = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized("Invalid email or password".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid email or password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let pair = tokens::issue_pair(&state.db, &keys, user.id).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(pair))
}

/// A valid refresh token yields a new access token with its own blocklist
/// row. The refresh token itself is not rotated.
#[instrument(skip(state, refresh_user))]
pub async fn refresh(
    State(state): State<AppState>,
    refresh_user: RefreshUser,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let access_token = tokens::issue_access(&state.db, &keys, refresh_user.user_id).await?;
    Ok(Json(AccessTokenResponse { access_token }))
}

#[instrument(skip(state, auth))]
pub async fn revoke_access(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    revoke(&state, auth.jti, auth.user_id).await
}

#[instrument(skip(state, refresh_user))]
pub async fn revoke_refresh(
    State(state): State<AppState>,
    refresh_user: RefreshUser,
) -> Result<Json<Value>, ApiError> {
    revoke(&state, refresh_user.jti, refresh_user.user_id).await
}

async fn revoke(
    state: &AppState,
    jti: uuid::Uuid,
    user_id: uuid::Uuid,
) -> Result<Json<Value>, ApiError> {
    tokens::revoke(&state.db, jti, user_id)
        .await
        .map_err(|e| match e {
            TokenError::NotFound(_) => ApiError::NotFound(e.to_string()),
            TokenError::Database(e) => ApiError::Database(e),
        })?;
    Ok(Json(json!({ "message": "token revoked" })))
}

#[instrument(skip(state, auth))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    let roles = User::role_slugs(&state.db, user.id).await?;

    Ok(Json(PublicUser {
        id: user.id,
        name: user.name,
        email: user.email,
        roles,
    }))
}

#[cfg(test)]
mod register_tests {
    use super::*;
    use sqlx::PgPool;

    fn test_state(pool: PgPool) -> AppState {
        let fake = AppState::fake();
        AppState::from_parts(pool, fake.config.clone(), fake.market.clone(), fake.cache.clone())
    }

    fn payload() -> RegisterRequest {
        RegisterRequest {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "Sup3rSecret!".into(),
        }
    }

    #[sqlx::test]
    async fn registering_an_existing_email_is_a_field_error(pool: PgPool) {
        crate::seed::seed_roles(&pool).await.unwrap();
        let state = test_state(pool.clone());

        let (status, _) = register(State(state.clone()), Json(payload())).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);

        match register(State(state), Json(payload())).await.unwrap_err() {
            ApiError::Validation(errors) => {
                assert_eq!(errors["email"][0], "Email already exists")
            }
            other => panic!("unexpected: {other:?}"),
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind("alice@example.com")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}

#[cfg(test)]
mod me_tests {
    use super::*;

    #[test]
    fn public_user_serializes_without_password() {
        let response = PublicUser {
            id: uuid::Uuid::new_v4(),
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
            roles: vec!["user".into()],
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"roles\":[\"user\"]"));
        assert!(!json.contains("password"));
    }
}
