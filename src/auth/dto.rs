use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};

use super::services::{is_strong_password, is_valid_email};

/// Token type used to distinguish Access and Refresh JWTs.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT payload. The `jti` is the join key into the token blocklist.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,       // user ID
    pub jti: Uuid,       // unique token identifier
    pub exp: usize,      // expiration time
    pub iat: usize,      // issued at
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // access or refresh
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if self.name.trim().chars().count() < 3 {
            errors.insert(
                "name".into(),
                vec!["Name must be at least 3 characters long".into()],
            );
        }
        if !is_valid_email(&self.email) {
            errors.insert("email".into(), vec!["Invalid email format".into()]);
        }
        if !is_strong_password(&self.password) {
            errors.insert(
                "password".into(),
                vec![
                    "Password must be at least 8 characters long, including 1 uppercase, \
                     1 lowercase, 1 special character, and 1 number."
                        .into(),
                ],
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if !is_valid_email(&self.email) {
            errors.insert("email".into(), vec!["Invalid email format".into()]);
        }
        if self.password.is_empty() {
            errors.insert("password".into(), vec!["Password is required".into()]);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Response returned after login.
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Response returned after a refresh.
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_register() -> RegisterRequest {
        RegisterRequest {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "Sup3rSecret!".into(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(valid_register().validate().is_ok());
    }

    #[test]
    fn short_name_is_field_keyed_error() {
        let mut payload = valid_register();
        payload.name = "Al".into();
        match payload.validate().unwrap_err() {
            ApiError::Validation(errors) => assert!(errors.contains_key("name")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn weak_passwords_are_rejected() {
        for weak in ["short1!", "alllowercase1!", "ALLUPPERCASE1!", "NoDigits!!", "NoSpecial11"] {
            let mut payload = valid_register();
            payload.password = weak.into();
            match payload.validate().unwrap_err() {
                ApiError::Validation(errors) => {
                    assert!(errors.contains_key("password"), "{weak} should fail")
                }
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn bad_email_is_rejected_on_login() {
        let payload = LoginRequest {
            email: "not-an-email".into(),
            password: "whatever".into(),
        };
        assert!(payload.validate().is_err());
    }
}
