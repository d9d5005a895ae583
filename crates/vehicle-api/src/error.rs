//! Vehicle Communication Error Types

use thiserror::Error;

/// Errors that can occur while talking to the remote vehicle backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommunicationError {
    /// Backend could not be reached
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// Backend answered with an error status
    #[error("Request rejected with status {status}")]
    Rejected { status: u16 },

    /// Backend refused the call because of rate limiting
    #[error("Request throttled by backend")]
    Throttled,

    /// Response could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Session expired or credentials refused
    #[error("Authentication failed: {0}")]
    Auth(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            CommunicationError::Rejected { status: 503 }.to_string(),
            "Request rejected with status 503"
        );
        assert_eq!(
            CommunicationError::Throttled.to_string(),
            "Request throttled by backend"
        );
    }
}
