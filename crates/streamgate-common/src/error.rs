//! Common error types used throughout streamgate.
//!
//! Every failure in the gateway core maps to one of these variants; all of
//! them are recoverable at the request boundary. Authorization failures are
//! deliberately reason-free so clients cannot distinguish an unknown token
//! from an expired or mismatched one.

/// Common error type for streamgate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing, invalid, expired, or mismatched stream token.
    #[error("Forbidden")]
    Unauthorized,

    /// The requested asset or segment was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or unsatisfiable byte range. Carries the true resource
    /// size so clients can retry with a valid range.
    #[error("Invalid range for resource of {size} bytes")]
    InvalidRange {
        /// Total size of the resource the range was resolved against.
        size: u64,
    },

    /// The backing file or object is missing or unreadable.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new UpstreamUnavailable error.
    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    /// Create a new Internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Unauthorized;
        assert_eq!(err.to_string(), "Forbidden");

        let err = Error::not_found("asset 9");
        assert_eq!(err.to_string(), "Not found: asset 9");

        let err = Error::InvalidRange { size: 1000 };
        assert_eq!(err.to_string(), "Invalid range for resource of 1000 bytes");

        let err = Error::upstream("file vanished");
        assert_eq!(err.to_string(), "Upstream unavailable: file vanished");
    }

    #[test]
    fn test_unauthorized_is_reason_free() {
        // All rejection paths render identically to the client.
        assert_eq!(Error::Unauthorized.to_string(), "Forbidden");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_result_type() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);
    }
}
