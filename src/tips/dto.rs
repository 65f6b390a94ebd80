use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};

use super::repo::Tip;

fn is_image_ref(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://") || value.starts_with('/')
}

/// Body for creating a tip. The image is uploaded separately and referenced
/// by URL here.
#[derive(Debug, Deserialize)]
pub struct TipPayload {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub image_url: String,
}

impl TipPayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        check_length(&mut errors, "title", &self.title, 255);
        check_length(&mut errors, "description", &self.description, 1000);
        if let Some(category) = &self.category {
            check_length(&mut errors, "category", category, 255);
        }
        if !is_image_ref(&self.image_url) {
            errors.insert("image_url".into(), vec!["Invalid image URL".into()]);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Partial update body; absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct TipUpdatePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl TipUpdatePayload {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &self.title {
            check_length(&mut errors, "title", title, 255);
        }
        if let Some(description) = &self.description {
            check_length(&mut errors, "description", description, 1000);
        }
        if let Some(category) = &self.category {
            check_length(&mut errors, "category", category, 255);
        }
        if let Some(image_url) = &self.image_url {
            if !is_image_ref(image_url) {
                errors.insert("image_url".into(), vec!["Invalid image URL".into()]);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    let len = value.trim().chars().count();
    if len == 0 || len > max {
        errors.insert(
            field.into(),
            vec![format!("{field} must be between 1 and {max} characters")],
        );
    }
}

/// Canonical tip shape, identical in public and admin listings.
#[derive(Debug, Serialize)]
pub struct TipResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Tip> for TipResponse {
    fn from(tip: Tip) -> Self {
        Self {
            id: tip.id,
            title: tip.title,
            description: tip.description,
            category: tip.category,
            image: tip.image,
            is_active: tip.is_active,
            created_at: tip.created_at,
            updated_at: tip.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TipsPage {
    pub page: u32,
    pub total_pages: i64,
    pub total_items: i64,
    pub limit: u32,
    pub data: Vec<TipResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> TipPayload {
        TipPayload {
            title: "Cold storage basics".into(),
            description: "Keep your keys offline.".into(),
            category: Some("security".into()),
            image_url: "/static/uploads/abc.png".into(),
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(valid_payload().validate().is_ok());
    }

    #[test]
    fn empty_title_fails_with_field_error() {
        let mut payload = valid_payload();
        payload.title = "   ".into();
        match payload.validate().unwrap_err() {
            ApiError::Validation(errors) => assert!(errors.contains_key("title")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn overlong_description_fails() {
        let mut payload = valid_payload();
        payload.description = "x".repeat(1001);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn bad_image_url_fails() {
        let mut payload = valid_payload();
        payload.image_url = "not a url".into();
        match payload.validate().unwrap_err() {
            ApiError::Validation(errors) => assert!(errors.contains_key("image_url")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn update_payload_allows_absent_fields() {
        let payload = TipUpdatePayload {
            title: None,
            description: None,
            category: None,
            image_url: None,
            is_active: Some(false),
        };
        assert!(payload.validate().is_ok());
    }
}
