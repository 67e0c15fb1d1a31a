//! Backend fault signal: an optional machine-readable code plus the raw text.

use std::fmt;
use std::time::Duration;

/// Machine-readable category attached to a fault when the backend can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    /// HTTP status returned by the media host.
    Http(u16),
    /// Content is restricted to other regions.
    GeoRestricted,
    /// Content was removed, deleted or never existed.
    Unavailable,
    /// Content is private.
    Private,
    /// Content needs an authenticated session.
    LoginRequired,
    /// The call exceeded the configured network timeout.
    Timeout,
}

/// Error reported by a Media Backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFault {
    pub code: Option<FaultCode>,
    pub message: String,
}

impl BackendFault {
    /// Fault with no machine-readable category.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: FaultCode, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::with_code(
            FaultCode::Timeout,
            format!("media backend did not answer within {:?}", after),
        )
    }
}

impl fmt::Display for BackendFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} ({:?})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for BackendFault {}
