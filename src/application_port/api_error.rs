use crate::domain_port::{RawResponse, TransportError};
use serde_json::Value;

pub const FALLBACK_MESSAGE: &str = "Something went wrong, please try again.";

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("not authorized: {message}")]
    Authorization { message: String },
    #[error("session refresh failed: {message}")]
    RefreshFailure { message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("invalid input: {0}")]
    Validation(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Classify a non-success response. 401 is the only status treated as
    /// an authorization failure.
    pub fn from_response(response: &RawResponse) -> ApiError {
        let message = extract_message(&response.body);
        match response.status {
            401 => ApiError::Authorization { message },
            status => ApiError::Server { status, message },
        }
    }

    /// True when the caller ended up without a valid session.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            ApiError::Authorization { .. } | ApiError::RefreshFailure { .. }
        )
    }

    /// Message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Authorization { message }
            | ApiError::RefreshFailure { message }
            | ApiError::Server { message, .. }
            | ApiError::Validation(message) => message.clone(),
            ApiError::Network(_) => "Unable to reach the server, please try again.".to_string(),
            ApiError::Decode(_) => FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Pull a human-readable message out of an error body: a string `detail`,
/// the first `msg` of a validation `detail` array, or `message`.
pub fn extract_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return FALLBACK_MESSAGE.to_string();
    };

    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(detail) = non_empty(value.get("detail")) {
        return detail;
    }
    if let Some(message) = non_empty(value.get("message")) {
        return message;
    }
    if let Some(first) = value
        .get("detail")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
    {
        if let Some(msg) = non_empty(first.get("msg")) {
            return msg;
        }
    }
    FALLBACK_MESSAGE.to_string()
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        ApiError::Network(error.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::Decode(error.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        let message = fields
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .next()
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        ApiError::Validation(message)
    }
}
