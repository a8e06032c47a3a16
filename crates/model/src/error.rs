use std::error::Error as StdError;
use std::fmt::{self, Display};

/// The kind of transport error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The connection could not be established or was interrupted.
    Network,
    /// The server answered with a non-success status code.
    Status,
    /// The response is not an event stream.
    ContentType,
    /// Reading the response body failed.
    Body,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "Network error"),
            ErrorKind::Status => write!(f, "Unexpected status"),
            ErrorKind::ContentType => write!(f, "Unexpected content type"),
            ErrorKind::Body => write!(f, "Body error"),
            ErrorKind::Other => write!(f, "Other error"),
        }
    }
}

/// An error raised while opening or reading a chat stream.
///
/// Transport errors are terminal for the turn they occur in, but never for
/// the session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransportError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
}

impl TransportError {
    /// Creates a new error with the given kind and message.
    #[inline]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Creates a new error for a non-success HTTP status.
    #[inline]
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Status,
            message: message.into(),
            status: Some(status),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status code, if the error was caused by one.
    #[inline]
    pub fn status_code(&self) -> Option<u16> {
        self.status
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => {
                write!(f, "{} ({status}): {}", self.kind, self.message)
            }
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl StdError for TransportError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = TransportError::new(ErrorKind::Network, "connection reset");
        assert_eq!(err.to_string(), "Network error: connection reset");
        assert_eq!(err.status_code(), None);

        let err = TransportError::status(502, "bad gateway");
        assert_eq!(err.kind(), ErrorKind::Status);
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.to_string(), "Unexpected status (502): bad gateway");
    }
}
