//! Result envelope: `{success, payload}` or `{success, error}`.

use serde::Serialize;

use crate::error::ApiError;

/// Result type returned by every API call.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Wire form of an [`ApiResult`].
///
/// Only constructible from a result, so exactly one of `payload` and `error`
/// is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
}

impl<T> Envelope<T> {
    pub fn success(&self) -> bool {
        self.success
    }
}

impl<T> From<ApiResult<T>> for Envelope<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(payload) => Self {
                success: true,
                payload: Some(payload),
                error: None,
            },
            Err(error) => Self {
                success: false,
                payload: None,
                error: Some(error),
            },
        }
    }
}
