//! Inbound request validation
//!
//! Checks a submission `{ "payload": {...}, "priority": N }` before anything
//! is queued. Every violated field is reported, not just the first.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::domain::Priority;
use crate::llm::CompletionRequest;

/// Inclusive temperature range
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=1.0;

/// One invalid field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field violation found in a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize)]
#[error("invalid request: {}", join(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn join(errors: &[FieldError]) -> String {
    errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
}

impl ValidationError {
    /// Names of the offending fields, in the order they were checked
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

/// A submission that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct Admitted {
    pub request: CompletionRequest,
    pub priority: Priority,
}

/// Validate a submission envelope and extract its payload and priority
pub fn admit(submission: &Value) -> Result<Admitted, ValidationError> {
    debug!("admit: called");
    let Some(envelope) = submission.as_object() else {
        return Err(ValidationError {
            errors: vec![FieldError::new("body", "must be a JSON object")],
        });
    };

    let mut errors = Vec::new();

    let priority = match envelope.get("priority") {
        None | Some(Value::Null) => Priority::default(),
        Some(value) => match value.as_i64() {
            Some(p) => Priority::new(p),
            None => {
                errors.push(FieldError::new("priority", "must be an integer"));
                Priority::default()
            }
        },
    };

    match envelope.get("payload") {
        Some(Value::Object(payload)) => errors.extend(check_payload(payload)),
        _ => errors.push(FieldError::new("payload", "must be a JSON object")),
    }

    if !errors.is_empty() {
        debug!(error_count = errors.len(), "admit: rejected");
        return Err(ValidationError { errors });
    }

    let payload = envelope.get("payload").cloned().unwrap_or(Value::Null);
    let request = serde_json::from_value(payload).map_err(|e| ValidationError {
        errors: vec![FieldError::new("payload", e.to_string())],
    })?;

    Ok(Admitted { request, priority })
}

/// Validate a bare payload, using the default priority
pub fn admit_payload(payload: &Value) -> Result<Admitted, ValidationError> {
    admit(&serde_json::json!({ "payload": payload }))
}

fn check_payload(payload: &Map<String, Value>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    match payload.get("prompt") {
        Some(Value::String(prompt)) if !prompt.trim().is_empty() => {}
        Some(Value::String(_)) => errors.push(FieldError::new("prompt", "must not be empty")),
        Some(_) => errors.push(FieldError::new("prompt", "must be a string")),
        None => errors.push(FieldError::new("prompt", "is required")),
    }

    match payload.get("model") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => errors.push(FieldError::new("model", "must be a string")),
    }

    match payload.get("temperature") {
        None | Some(Value::Null) => {}
        Some(value) => match value.as_f64() {
            Some(t) if TEMPERATURE_RANGE.contains(&t) => {}
            _ => errors.push(FieldError::new("temperature", "must be a number between 0 and 1")),
        },
    }

    match payload.get("maxTokens") {
        None | Some(Value::Null) => {}
        Some(value) => match value.as_u64() {
            Some(n) if n >= 1 => {}
            _ => errors.push(FieldError::new("maxTokens", "must be a positive integer")),
        },
    }

    match payload.get("stream") {
        None | Some(Value::Null) | Some(Value::Bool(_)) => {}
        Some(_) => errors.push(FieldError::new("stream", "must be a boolean")),
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_admit_minimal() {
        let admitted = admit(&json!({ "payload": { "prompt": "Hello" } })).unwrap();
        assert_eq!(admitted.request.prompt, "Hello");
        assert_eq!(admitted.priority, Priority::default());
    }

    #[test]
    fn test_admit_full() {
        let admitted = admit(&json!({
            "payload": {
                "prompt": "Hello",
                "model": "claude-instant-1",
                "temperature": 0.0,
                "maxTokens": 256,
                "stream": false,
                "stop_sequences": ["\n\nHuman:"]
            },
            "priority": 7
        }))
        .unwrap();

        assert_eq!(admitted.priority, Priority::new(7));
        assert_eq!(admitted.request.model.as_deref(), Some("claude-instant-1"));
        assert_eq!(admitted.request.temperature, Some(0.0));
        assert_eq!(admitted.request.max_tokens, Some(256));
        assert!(admitted.request.extra.contains_key("stop_sequences"));
    }

    #[test]
    fn test_payload_unchanged() {
        let payload = json!({ "prompt": "Hi", "temperature": 1, "custom": { "nested": true } });
        let admitted = admit_payload(&payload).unwrap();
        assert_eq!(serde_json::to_value(&admitted.request).unwrap()["custom"], payload["custom"]);
        assert_eq!(admitted.request.temperature, Some(1.0));
    }

    #[test]
    fn test_reports_every_violation() {
        let err = admit(&json!({
            "payload": { "prompt": "", "temperature": 1.5, "maxTokens": 0 }
        }))
        .unwrap_err();

        assert_eq!(err.fields(), vec!["prompt", "temperature", "maxTokens"]);
        let message = err.to_string();
        assert!(message.contains("prompt: must not be empty"));
        assert!(message.contains("temperature"));
        assert!(message.contains("maxTokens"));
    }

    #[test]
    fn test_missing_prompt() {
        let err = admit_payload(&json!({ "model": "claude-2" })).unwrap_err();
        assert_eq!(err.fields(), vec!["prompt"]);
        assert_eq!(err.errors[0].message, "is required");
    }

    #[test]
    fn test_wrong_types() {
        let err = admit(&json!({
            "payload": {
                "prompt": 42,
                "model": 3,
                "temperature": "hot",
                "maxTokens": 12.5,
                "stream": "yes"
            },
            "priority": "urgent"
        }))
        .unwrap_err();

        assert_eq!(
            err.fields(),
            vec!["priority", "prompt", "model", "temperature", "maxTokens", "stream"]
        );
    }

    #[test]
    fn test_negative_max_tokens() {
        let err = admit_payload(&json!({ "prompt": "x", "maxTokens": -4 })).unwrap_err();
        assert_eq!(err.fields(), vec!["maxTokens"]);
    }

    #[test]
    fn test_null_optionals_ignored() {
        let admitted = admit(&json!({
            "payload": { "prompt": "x", "model": null, "temperature": null },
            "priority": null
        }))
        .unwrap();
        assert_eq!(admitted.priority, Priority::default());
        assert_eq!(admitted.request.model, None);
    }

    #[test]
    fn test_non_object_inputs() {
        let err = admit(&json!("prompt")).unwrap_err();
        assert_eq!(err.fields(), vec!["body"]);

        let err = admit(&json!({ "payload": "Hello" })).unwrap_err();
        assert_eq!(err.fields(), vec!["payload"]);
    }

    #[test]
    fn test_negative_priority_allowed() {
        let admitted = admit(&json!({ "payload": { "prompt": "x" }, "priority": -3 })).unwrap();
        assert_eq!(admitted.priority, Priority::new(-3));
    }
}
