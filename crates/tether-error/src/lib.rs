#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Error taxonomy shared by every tether component
//!
//! Operations return [`StructuredError`], either in the application code
//! space ([`ErrorCode`]) or in the HTTP status space ([`StatusCode`]).

mod codes;
mod structured;

pub use codes::{ErrorCode, StatusCode};
pub use structured::{EnvelopeError, Payload, StructuredError};

/// Result type used across tether crates
pub type Result<T> = std::result::Result<T, StructuredError>;
