use thiserror::Error;

use crate::relay::DispatchError;
use crate::rules::{PatternError, RulesError};

/// Errors that can occur while configuring or running the relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// A custom error with a free-form message.
    #[error("Custom error: {0}")]
    Custom(String),

    /// An I/O error from the standard library.
    #[error("Std Io error: {0}")]
    StdIo(#[from] std::io::Error),

    /// A rule pattern or target template could not be compiled.
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// A rule file could not be loaded.
    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),

    /// A parsed metric could not be mapped to a backend operation.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

impl From<String> for RelayError {
    fn from(value: String) -> Self {
        Self::Custom(value)
    }
}

impl From<&str> for RelayError {
    fn from(value: &str) -> Self {
        Self::Custom(value.to_string())
    }
}
