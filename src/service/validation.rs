//! Structural validation of product payloads.

use crate::error::AppError;
use crate::model::{CreateProduct, UpdateProduct};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const NAME_MAX_LENGTH: usize = 255;
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;
const METADATA_MAX_ENTRIES: usize = 50;
const METADATA_VALUE_MAX_LENGTH: usize = 500;

fn metadata_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]{1,40}$").expect("static pattern compiles"))
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create payload. `name` is required.
    pub fn validate_create(body: &CreateProduct) -> Result<(), AppError> {
        if body.name.trim().is_empty() {
            return Err(AppError::validation("name", "name is required"));
        }
        validate_name(&body.name)?;
        if let Some(description) = &body.description {
            validate_description(description)?;
        }
        validate_metadata(&body.metadata)
    }

    /// Validate only the fields present (for PATCH).
    pub fn validate_update(body: &UpdateProduct) -> Result<(), AppError> {
        if let Some(name) = &body.name {
            if name.trim().is_empty() {
                return Err(AppError::validation("name", "name must not be empty"));
            }
            validate_name(name)?;
        }
        if let Some(description) = &body.description {
            validate_description(description)?;
        }
        if let Some(metadata) = &body.metadata {
            validate_metadata(metadata)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(AppError::validation(
            "name",
            format!("name must be at most {} characters", NAME_MAX_LENGTH),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(AppError::validation(
            "description",
            format!("description must be at most {} characters", DESCRIPTION_MAX_LENGTH),
        ));
    }
    Ok(())
}

fn validate_metadata(metadata: &BTreeMap<String, String>) -> Result<(), AppError> {
    if metadata.len() > METADATA_MAX_ENTRIES {
        return Err(AppError::validation(
            "metadata",
            format!("metadata must have at most {} entries", METADATA_MAX_ENTRIES),
        ));
    }
    for (key, value) in metadata {
        if !metadata_key_pattern().is_match(key) {
            return Err(AppError::validation(
                "metadata",
                format!("metadata key '{}' is invalid", key),
            ));
        }
        if value.chars().count() > METADATA_VALUE_MAX_LENGTH {
            return Err(AppError::validation(
                "metadata",
                format!("metadata value for '{}' must be at most {} characters", key, METADATA_VALUE_MAX_LENGTH),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: AppError) -> String {
        match err {
            AppError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_requires_name() {
        let err = RequestValidator::validate_create(&CreateProduct::default()).unwrap_err();
        assert_eq!(field_of(err), "name");
    }

    #[test]
    fn create_enforces_lengths() {
        let body = CreateProduct {
            name: "x".repeat(NAME_MAX_LENGTH + 1),
            ..Default::default()
        };
        assert_eq!(field_of(RequestValidator::validate_create(&body).unwrap_err()), "name");

        let body = CreateProduct {
            name: "ok".into(),
            description: Some("d".repeat(DESCRIPTION_MAX_LENGTH + 1)),
            ..Default::default()
        };
        assert_eq!(field_of(RequestValidator::validate_create(&body).unwrap_err()), "description");
    }

    #[test]
    fn metadata_keys_are_checked() {
        let mut metadata = BTreeMap::new();
        metadata.insert("color".to_string(), "red".to_string());
        let body = CreateProduct {
            name: "ok".into(),
            metadata: metadata.clone(),
            ..Default::default()
        };
        assert!(RequestValidator::validate_create(&body).is_ok());

        metadata.insert("bad key!".to_string(), "x".to_string());
        let body = UpdateProduct {
            metadata: Some(metadata),
            ..Default::default()
        };
        assert_eq!(field_of(RequestValidator::validate_update(&body).unwrap_err()), "metadata");
    }

    #[test]
    fn update_validates_only_present_fields() {
        assert!(RequestValidator::validate_update(&UpdateProduct::default()).is_ok());
        let body = UpdateProduct {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(field_of(RequestValidator::validate_update(&body).unwrap_err()), "name");
    }
}
