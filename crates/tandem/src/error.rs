//! Top-level error type.

use tandem_core::{ConfigError, HandoffError};
use tandem_gl::PlatformError;
use thiserror::Error;

/// Errors surfaced by the frame loop and its binaries.
#[derive(Error, Debug)]
pub enum TandemError {
    /// Handoff or render thread failure.
    #[error(transparent)]
    Handoff(#[from] HandoffError),

    /// Platform layer failure.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for TANDEM operations.
pub type TandemResult<T> = Result<T, TandemError>;
