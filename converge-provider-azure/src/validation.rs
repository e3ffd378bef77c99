//! Validation of declared attributes before any API call is made

use std::collections::HashMap;

use converge_core::provider::ResourceSchema;
use converge_core::resource::{Resource, Value};

/// Validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Check required attributes and string/map types of known attributes
pub fn validate_resource(schema: &ResourceSchema, resource: &Resource) -> ValidationResult {
    let mut errors: Vec<ValidationError> = schema
        .missing_required(resource)
        .into_iter()
        .map(|name| ValidationError {
            path: name.to_string(),
            message: format!("{} is required", name),
        })
        .collect();

    for attr in &schema.attributes {
        if attr.computed && resource.attributes.contains_key(attr.name) {
            errors.push(ValidationError {
                path: attr.name.to_string(),
                message: format!("{} is computed and cannot be set", attr.name),
            });
        }
    }

    if let Some(value) = resource.attributes.get("tags")
        && !matches!(value, Value::Map(_))
    {
        errors.push(ValidationError {
            path: "tags".to_string(),
            message: "tags must be a map".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate that a string attribute, if present, is one of `allowed`
pub fn validate_one_of(
    attributes: &HashMap<String, Value>,
    name: &str,
    allowed: &[&str],
) -> ValidationResult {
    match attributes.get(name) {
        None => Ok(()),
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => Ok(()),
        Some(Value::String(s)) => Err(vec![ValidationError {
            path: name.to_string(),
            message: format!(
                "{} must be one of [{}], got {:?}",
                name,
                allowed.join(", "),
                s
            ),
        }]),
        Some(_) => Err(vec![ValidationError {
            path: name.to_string(),
            message: format!("{} must be a string", name),
        }]),
    }
}

/// Run several validations and collect every error
pub fn collect(results: impl IntoIterator<Item = ValidationResult>) -> ValidationResult {
    let errors: Vec<ValidationError> = results
        .into_iter()
        .filter_map(Result::err)
        .flatten()
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
