//! Error types for the ERP QA harness

use thiserror::Error;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by every harness crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
