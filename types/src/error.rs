//! Parse and validation errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid transaction hash: {0}")]
    InvalidHash(String),

    #[error("{0:#010b} is not a single-grade bitmask")]
    InvalidGrade(u8),
}
