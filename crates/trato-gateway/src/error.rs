//! Error types for the gateway layer.

use thiserror::Error;
use trato_core::FieldErrors;

/// Everything that can go wrong between the client and the backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never completed: DNS, connect, timeout.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// A protected endpoint answered 401. The local session has already
    /// been cleared by the time this surfaces; the user must sign in
    /// again.
    #[error("session expired, sign in again")]
    SessionExpired,

    /// The authenticate endpoints answered 401. The stored session, if
    /// any, is left alone.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The entity behind the identifier does not exist (404).
    #[error("not found")]
    NotFound,

    /// The backend rejected a submission with per-field messages.
    #[error("rejected: {0}")]
    Rejected(FieldErrors),

    /// Any other non-success status.
    #[error("backend answered {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body did not decode into any accepted shape.
    #[error("undecodable response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GatewayError {
    /// True when retrying the exact same call could help (the failure
    /// was in transit, not in the request itself).
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Transport(_))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_renders_field_messages() {
        let mut errors = FieldErrors::new();
        errors.add("value", "must be greater than zero");
        let err = GatewayError::Rejected(errors);
        assert_eq!(err.to_string(), "rejected: value: must be greater than zero");
        assert!(!err.is_transient());
    }
}
