//! Light payload contracts.
//!
//! Handlers check only what the merge protocol depends on: identity and
//! parent-id fields, plus the few enum-valued fields the producer requires.
//! The first violated constraint is reported; a general validation engine is
//! deliberately out of scope.

use serde_json::Value;

use super::ProcessError;

/// Require the payload to be a JSON object.
pub fn require_object(payload: &Value) -> Result<(), ProcessError> {
    if payload.is_object() {
        Ok(())
    } else {
        Err(ProcessError::Validation("payload must be an object".to_string()))
    }
}

/// Require `field` to be a positive integer.
pub fn require_positive_int(payload: &Value, field: &str) -> Result<i64, ProcessError> {
    match payload.get(field).and_then(Value::as_i64) {
        Some(v) if v > 0 => Ok(v),
        _ => Err(ProcessError::Validation(format!(
            "\"{}\" is required and must be a positive integer",
            field
        ))),
    }
}

/// Require `field` to be a non-empty string.
pub fn require_string<'a>(payload: &'a Value, field: &str) -> Result<&'a str, ProcessError> {
    match payload.get(field).and_then(Value::as_str) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ProcessError::Validation(format!(
            "\"{}\" is required and must be a non-empty string",
            field
        ))),
    }
}

/// Require `field` to be one of `allowed`.
pub fn require_one_of<'a>(
    payload: &'a Value,
    field: &str,
    allowed: &[&str],
) -> Result<&'a str, ProcessError> {
    let value = require_string(payload, field)?;
    if allowed.contains(&value) {
        Ok(value)
    } else {
        Err(ProcessError::Validation(format!(
            "\"{}\" must be one of [{}]",
            field,
            allowed.join(", ")
        )))
    }
}

/// Require `field` to be present and non-null, of any type.
pub fn require_present(payload: &Value, field: &str) -> Result<(), ProcessError> {
    match payload.get(field) {
        Some(Value::Null) | None => Err(ProcessError::Validation(format!(
            "\"{}\" is required",
            field
        ))),
        Some(_) => Ok(()),
    }
}

/// If `field` is present and non-null, require it to be one of `allowed`.
pub fn optional_one_of(
    payload: &Value,
    field: &str,
    allowed: &[&str],
) -> Result<(), ProcessError> {
    match payload.get(field) {
        Some(Value::Null) | None => Ok(()),
        Some(_) => require_one_of(payload, field, allowed).map(|_| ()),
    }
}

/// If `field` is present and non-null, require it to be an integer.
pub fn optional_int(payload: &Value, field: &str) -> Result<(), ProcessError> {
    match payload.get(field) {
        Some(Value::Null) | None => Ok(()),
        Some(v) if v.as_i64().is_some() => Ok(()),
        Some(_) => Err(ProcessError::Validation(format!(
            "\"{}\" must be an integer",
            field
        ))),
    }
}

/// If `field` is present and non-null, require it to be a string.
pub fn optional_string(payload: &Value, field: &str) -> Result<(), ProcessError> {
    match payload.get(field) {
        Some(Value::Null) | None => Ok(()),
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ProcessError::Validation(format!(
            "\"{}\" must be a string",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_positive_int() {
        assert_eq!(require_positive_int(&json!({"id": 5}), "id").unwrap(), 5);
        assert!(require_positive_int(&json!({"id": 0}), "id").is_err());
        assert!(require_positive_int(&json!({"id": "5"}), "id").is_err());
        assert!(require_positive_int(&json!({}), "id").is_err());
    }

    #[test]
    fn test_require_string_rejects_empty() {
        assert!(require_string(&json!({"key": ""}), "key").is_err());
        assert_eq!(require_string(&json!({"key": "k"}), "key").unwrap(), "k");
    }

    #[test]
    fn test_require_one_of() {
        let allowed = &["file", "link"];
        assert!(require_one_of(&json!({"type": "file"}), "type", allowed).is_ok());
        assert!(require_one_of(&json!({"type": "blob"}), "type", allowed).is_err());
    }

    #[test]
    fn test_optional_one_of_allows_absent_and_null() {
        let allowed = &["manager"];
        assert!(optional_one_of(&json!({}), "role", allowed).is_ok());
        assert!(optional_one_of(&json!({"role": null}), "role", allowed).is_ok());
        assert!(optional_one_of(&json!({"role": "cook"}), "role", allowed).is_err());
    }

    #[test]
    fn test_error_names_first_violated_constraint() {
        let err = require_positive_int(&json!({}), "projectId").unwrap_err();
        assert!(err.to_string().contains("projectId"));
    }
}
