//! Envelope status codes.

use crate::error::QuqiError;

/// Classification of an envelope `err` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// `0`, absent or otherwise falsy
    Success,
    /// Session token no longer accepted; re-login and retry once
    SessionExpired,
    /// Any other failure
    Other(i64),
}

impl ApiErrorCode {
    /// Classify `code` given the service's session-expired code.
    pub fn classify(code: i64, session_expired_code: i64) -> Self {
        match code {
            0 => ApiErrorCode::Success,
            c if c == session_expired_code => ApiErrorCode::SessionExpired,
            c => ApiErrorCode::Other(c),
        }
    }

    /// Get human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ApiErrorCode::Success => "Success",
            ApiErrorCode::SessionExpired => "Session expired",
            ApiErrorCode::Other(_) => "Remote API error",
        }
    }

    /// Turn a failure code into an error, preferring the server's own message.
    pub fn into_error(self, code: i64, message: &str) -> QuqiError {
        let message = if message.is_empty() {
            self.description().to_string()
        } else {
            message.to_string()
        };
        QuqiError::ApiError { code, message }
    }
}
