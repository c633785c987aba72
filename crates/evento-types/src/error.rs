//! Normalized API error.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const NOT_LOGGED_IN_MESSAGE: &str = "You must be logged in";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong";

/// Per-field validation messages as sent by the server (`field -> [message]`),
/// in the server's field order.
pub type RawFieldErrors = IndexMap<String, Vec<String>>;

/// Error categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Not logged in, or bad credentials
    Auth,
    /// Network failure, unexpected server error, or validation failure
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Auth => write!(f, "auth"),
            ApiErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Error half of the result envelope.
///
/// `message` is the page-level banner. `messages` is never empty once an
/// error has been built through one of the constructors. `raw` carries the
/// server's per-field messages for validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: ApiErrorKind,
    pub message: String,
    pub messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawFieldErrors>,
}

impl ApiError {
    /// Creates an error whose message list is the single banner message.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind,
            messages: vec![message.clone()],
            message,
            raw: None,
        }
    }

    /// Generic failure (network error, unreadable response).
    pub fn something_went_wrong() -> Self {
        Self::new(ApiErrorKind::Unknown, DEFAULT_ERROR_MESSAGE)
    }

    /// Returned without a request when an authenticated call has no session.
    pub fn not_logged_in() -> Self {
        Self::new(ApiErrorKind::Auth, NOT_LOGGED_IN_MESSAGE)
    }

    /// Default shape for a rejected sign-in.
    pub fn invalid_credentials() -> Self {
        Self::new(ApiErrorKind::Auth, INVALID_CREDENTIALS_MESSAGE)
    }

    /// Builds a validation error from per-field messages.
    ///
    /// Messages are flattened to `"<field> <message>"` in field order; the
    /// first one becomes the banner. An empty map falls back to the generic
    /// message.
    pub fn validation(raw: RawFieldErrors) -> Self {
        let mut messages: Vec<String> = raw
            .iter()
            .flat_map(|(field, values)| values.iter().map(move |v| format!("{field} {v}")))
            .collect();
        if messages.is_empty() {
            messages.push(DEFAULT_ERROR_MESSAGE.to_string());
        }

        Self {
            kind: ApiErrorKind::Unknown,
            message: messages[0].clone(),
            messages,
            raw: Some(raw),
        }
    }

    /// Restores the invariants after fields were overwritten: `messages` falls
    /// back to `[message]` when empty.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.messages.is_empty() {
            self.messages.push(self.message.clone());
        }
        self
    }

    /// Server messages for one field, if any.
    pub fn field_messages(&self, field: &str) -> Option<&[String]> {
        self.raw
            .as_ref()
            .and_then(|raw| raw.get(field))
            .map(Vec::as_slice)
    }

    /// First server message for one field; what a form shows under the input.
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_messages(field)
            .and_then(<[String]>::first)
            .map(String::as_str)
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ApiErrorKind::Auth
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
