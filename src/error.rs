//! Failure taxonomy for everything that talks to the backend.
//!
//! Every request outcome is normalised into [`FetchError`] at the adapter
//! boundary ([`crate::api`]).  Nothing past that boundary raises: pollers
//! record the error in their cell, commands turn it into a status message.

use thiserror::Error;

/// Why a single request failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, timeout, reset, unreadable body.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u16),

    /// The body was not JSON, or not the shape the endpoint promises.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The server understood the request and reported a failure itself
    /// (`{"status": "error", "message": ...}`).
    #[error("{0}")]
    Application(String),
}

impl FetchError {
    /// Only transport failures are worth backing off for; the server telling
    /// us "no detection" will say the same thing on the next tick.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

/// Shorthand for the result of one request.
pub type FetchOutcome<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_transient() {
        assert!(FetchError::Network("refused".into()).is_transient());
        assert!(!FetchError::Http(500).is_transient());
        assert!(!FetchError::Decode("eof".into()).is_transient());
        assert!(!FetchError::Application("no detection".into()).is_transient());
    }

    #[test]
    fn application_error_displays_server_message_verbatim() {
        let e = FetchError::Application("no detection".into());
        assert_eq!(e.to_string(), "no detection");
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(FetchError::from(err), FetchError::Decode(_)));
    }
}
