//! Error taxonomy for the relay core.
//!
//! Only two things can go wrong here: a malformed payload or a lookup
//! of a message id that does not exist. An unidentified connection is
//! a legitimate state (`Option::None` from the registry), never an
//! error. Nothing in this crate is fatal to the process.

use murmur_protocol::error_codes;
use thiserror::Error;

/// Errors surfaced to the originating connection only.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed payload: wrong type, missing field, or empty value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The referenced message id does not exist.
    #[error("Message not found: {0}")]
    NotFound(u64),
}

impl RelayError {
    /// Get the wire error code for this error.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            RelayError::InvalidInput(_) => error_codes::INVALID_INPUT,
            RelayError::NotFound(_) => error_codes::NOT_FOUND,
        }
    }
}
