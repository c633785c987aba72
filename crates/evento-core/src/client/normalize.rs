//! Shaping of non-2xx response bodies into [`ApiError`]s.

use evento_types::{ApiError, ApiErrorKind, RawFieldErrors};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fields a server error body may override on the default error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorOverrides {
    #[serde(rename = "type")]
    kind: Option<ApiErrorKind>,
    message: Option<String>,
    messages: Option<Vec<String>>,
}

/// Merges a JSON error body over `default`.
///
/// `type`, `message` and `messages` in the body replace the default's
/// values. A body that is not a JSON object, or whose fields have the wrong
/// shape, leaves the default untouched. When the body replaces `message`
/// without sending `messages`, the list is rebuilt from the new message.
pub fn merge_error_body(default: ApiError, body: &[u8]) -> ApiError {
    let Ok(overrides) = serde_json::from_slice::<ErrorOverrides>(body) else {
        return default;
    };

    let mut error = default;
    if let Some(kind) = overrides.kind {
        error.kind = kind;
    }
    match (overrides.message, overrides.messages) {
        (Some(message), Some(messages)) => {
            error.message = message;
            error.messages = messages;
        }
        (Some(message), None) => {
            error.messages = vec![message.clone()];
            error.message = message;
        }
        (None, Some(messages)) => error.messages = messages,
        (None, None) => {}
    }
    error.normalized()
}

/// Parses a validation body (`{"field": ["message", ...]}`) into an error.
///
/// Plain string values count as a single message; other values are skipped.
/// A body that is not a JSON object yields the generic error.
pub fn validation_error(body: &[u8]) -> ApiError {
    match serde_json::from_slice::<Map<String, Value>>(body) {
        Ok(map) => ApiError::validation(collect_field_messages(map)),
        Err(_) => ApiError::something_went_wrong(),
    }
}

fn collect_field_messages(map: Map<String, Value>) -> RawFieldErrors {
    map.into_iter()
        .filter_map(|(field, value)| {
            let messages: Vec<String> = match value {
                Value::String(s) => vec![s],
                Value::Array(items) => items.into_iter().filter_map(message_text).collect(),
                _ => return None,
            };
            Some((field, messages))
        })
        .collect()
}

fn message_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Exposes `image_url` messages under `image` as well.
///
/// Events are read with an `image` field but created with `image_url`, so
/// forms look errors up by the read name.
pub fn alias_image_field(mut error: ApiError) -> ApiError {
    if let Some(raw) = error.raw.as_mut()
        && let Some(messages) = raw.get("image_url").cloned()
    {
        raw.insert("image".to_string(), messages);
    }
    error
}
