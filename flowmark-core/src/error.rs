//! Error types for Flowmark

use thiserror::Error;

/// Result type alias for Flowmark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Flowmark
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Capture error
    #[error("Packet capture error: {0}")]
    Capture(String),

    /// Promiscuous mode denied by the platform or driver
    #[error("Promiscuous mode unavailable: {0}")]
    PromiscuousDenied(String),

    /// Capture filter error
    #[error("Capture filter error: {0}")]
    Filter(String),

    /// Invalid parameter error
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl Error {
    /// Create a capture error with a custom message
    pub fn capture<S: Into<String>>(msg: S) -> Self {
        Error::Capture(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
