//! # Configuration Validation
//!
//! Field rules come from the `validator` derives on the schema. On top of
//! those, production deployments must carry real secrets.

use crate::error::ConfigError;
use crate::schema::{ApplicationMemoryConfig, MIN_JWT_SECRET_LENGTH};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Outcome of validating a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validate a snapshot, collecting every violation.
///
/// Errors are formatted as `<dotted.path>: <code>`, sorted.
pub fn validate(config: &ApplicationMemoryConfig) -> ValidationReport {
    let mut errors = Vec::new();

    if let Err(field_errors) = config.validate() {
        flatten_errors(&field_errors, "", &mut errors);
    }

    if config.is_production() {
        errors.extend(production_errors(config));
    }

    errors.sort();
    ValidationReport::from_errors(errors)
}

/// Like [`validate`], but as a `Result`.
pub fn validate_or_err(config: &ApplicationMemoryConfig) -> Result<(), ConfigError> {
    let report = validate(config);
    if report.is_valid {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            errors: report.errors,
        })
    }
}

fn production_errors(config: &ApplicationMemoryConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if config.auth.jwt_secret.chars().count() < MIN_JWT_SECRET_LENGTH {
        errors.push(format!(
            "auth.jwt_secret: must be at least {MIN_JWT_SECRET_LENGTH} characters in production"
        ));
    }
    if config.database.password.is_empty() {
        errors.push("database.password: must be set in production".to_string());
    }
    errors
}

fn flatten_errors(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if field.as_ref() == "__all__" {
            prefix.to_string()
        } else if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    out.push(format!("{path}: {}", error.code));
                }
            }
            ValidationErrorsKind::Struct(nested) => flatten_errors(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_errors(nested, &format!("{path}.{index}"), out);
                }
            }
        }
    }
}
