//! Framework error type.
//!
//! Sub-crates keep their own error enums and wrap `DtError` as one variant.

use thiserror::Error;

/// Errors raised by `dt-core` itself.
#[derive(Debug, Error)]
pub enum DtError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `dt-core`.
pub type DtResult<T> = Result<T, DtError>;
