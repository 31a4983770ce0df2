use crate::error::AppError;
use validator::{Validate, ValidationErrors};

pub trait FormValidateExt {
    fn validate_form(&self) -> Result<(), AppError>;
}

impl<T: Validate> FormValidateExt for T {
    fn validate_form(&self) -> Result<(), AppError> {
        self.validate()
            .map_err(|errors| AppError::Validation(describe_errors(&errors)))
    }
}

/// Flattens field errors into one line, ordered by field name so the
/// message is stable.
fn describe_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                error
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Trims a submitted value and treats an empty result as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
