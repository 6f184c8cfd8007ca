use thiserror::Error;

use crate::services::backend::BackendError;

/// Candidate-facing failure taxonomy. `Link` is terminal; every other
/// variant leaves the session recoverable for retry.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Local precondition failure; no request was sent.
    #[error("{0}")]
    Validation(String),
    /// Access-code resolution failed; the attempt is invalid.
    #[error("{0}")]
    Link(String),
    /// Missing or expired token; verification must be repeated.
    #[error("{0}")]
    Auth(String),
    /// The backend refused the operation on a business rule.
    #[error("{0}")]
    Rejected(String),
    /// Transient transport failure on a gating call.
    #[error("{0}")]
    Network(String),
}

impl AttemptError {
    pub fn message(&self) -> &str {
        match self {
            AttemptError::Validation(message)
            | AttemptError::Link(message)
            | AttemptError::Auth(message)
            | AttemptError::Rejected(message)
            | AttemptError::Network(message) => message,
        }
    }

    /// Classify a backend failure for a gating call, falling back to a
    /// per-operation generic message when the server sent none.
    pub(crate) fn from_backend(err: BackendError, fallback: &str) -> Self {
        match err {
            BackendError::Rejected { status, message } => {
                let message = message.unwrap_or_else(|| fallback.to_string());
                if status == 401 || status == 403 {
                    AttemptError::Auth(message)
                } else {
                    AttemptError::Rejected(message)
                }
            }
            BackendError::Transport(err) => {
                tracing::debug!(error = %err, "transport failure on gating call");
                AttemptError::Network(fallback.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_wins_over_fallback() {
        let err = AttemptError::from_backend(
            BackendError::Rejected { status: 409, message: Some("Test already submitted".into()) },
            "Failed to start test. Please try again.",
        );
        assert!(matches!(err, AttemptError::Rejected(_)));
        assert_eq!(err.message(), "Test already submitted");
    }

    #[test]
    fn unauthorized_maps_to_auth() {
        let err = AttemptError::from_backend(
            BackendError::Rejected { status: 401, message: None },
            "Session expired. Please refresh and verify again.",
        );
        assert!(matches!(err, AttemptError::Auth(_)));
        assert_eq!(err.message(), "Session expired. Please refresh and verify again.");
    }

    #[test]
    fn transport_failures_surface_the_generic_message() {
        let err = AttemptError::from_backend(
            BackendError::Transport(anyhow::anyhow!("connection refused")),
            "Failed to submit test. Please try again.",
        );
        assert!(matches!(err, AttemptError::Network(_)));
        assert_eq!(err.message(), "Failed to submit test. Please try again.");
    }
}
