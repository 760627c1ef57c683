use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckoutError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckoutError {
    /// Malformed local input, e.g. a non-positive quantity.
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Operation attempted in a state that forbids it.
    #[error("Invalid state: {0}")]
    InvalidStateError(String),
    /// Read accessor called before its prerequisite write.
    #[error("Not ready: {0}")]
    NotReadyError(String),
    /// Transport or backend failure.
    #[error("Remote error{}: {message}", status_suffix(.status))]
    RemoteError {
        status: Option<u16>,
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

impl CheckoutError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteError {
            status: None,
            message: message.into(),
        }
    }

    pub fn remote_status(status: u16, message: impl Into<String>) -> Self {
        Self::RemoteError {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for CheckoutError {
    fn from(err: reqwest::Error) -> Self {
        Self::RemoteError {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display_includes_status() {
        let err = CheckoutError::remote_status(502, "bad gateway");
        assert_eq!(err.to_string(), "Remote error (502): bad gateway");

        let err = CheckoutError::remote("connection refused");
        assert_eq!(err.to_string(), "Remote error: connection refused");
    }
}
