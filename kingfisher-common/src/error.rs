//! Error types for the kingfisher transit toolkit
//!
//! Shared across the graph-building and routing crates so callers only have to
//! handle one error surface.

use std::fmt;

/// Main error type for kingfisher operations
#[derive(Debug)]
pub enum Error {
    /// Invalid configuration or parameters (out-of-range index, bad speed, ...)
    InvalidInput(String),

    /// The street graph violates a structural expectation
    GraphDefect(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {msg}")
            }
            Error::GraphDefect(msg) => {
                write!(f, "Street graph defect: {msg}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Convenience result type for kingfisher operations
pub type Result<T> = std::result::Result<T, Error>;
