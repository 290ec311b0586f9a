//! Error types for the FX1 ledger

use thiserror::Error;

/// Core errors raised outside the ledger state machine
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error at {path}: {message}")]
    Store { path: String, message: String },

    #[error("Address error: {0}")]
    Address(#[from] AddressParseError),
}

/// Address parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("expected 40 hex digits, found {len}")]
    InvalidLength { len: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_error_converts() {
        let err: Error = AddressParseError::InvalidLength { len: 3 }.into();
        assert_eq!(
            err.to_string(),
            "Address error: expected 40 hex digits, found 3"
        );
    }
}
