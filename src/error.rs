//! Error types for lumi-core

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Settings store I/O failure
    #[error("settings store error: {0}")]
    Store(String),

    /// Settings (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Collaborator hook failure (prompt activation, haptics)
    #[error("hook error: {0}")]
    Hook(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let error = Error::Store("disk full".to_string());
        assert_eq!(error.to_string(), "settings store error: disk full");
    }

    #[test]
    fn test_serialization_error_from() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let error: Error = json_err.into();
        assert!(error.to_string().starts_with("serialization error"));
    }
}
