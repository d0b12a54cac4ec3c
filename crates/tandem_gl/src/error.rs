//! # Platform Error Types
//!
//! All errors that can occur while bringing up the GL platform layer.

use std::io;

use tandem_core::ConfigError;
use thiserror::Error;

/// Errors that can occur in the platform layer.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No pixel format passed the hardware, RGBA and bit-depth checks.
    #[error("no acceptable pixel format")]
    NoPixelFormat,

    /// The best pixel format is not hardware accelerated.
    #[error("no hardware accelerated pixel format")]
    NoHardwareAcceleration,

    /// A required extension is not advertised by the driver.
    #[error("required extension {0} not found")]
    MissingExtension(&'static str),

    /// An extension is advertised but one of its entry points is missing.
    #[error("{extension}: could not resolve {entry_point}")]
    MissingEntryPoint {
        /// Extension being initialized.
        extension: &'static str,
        /// Entry point that failed to resolve.
        entry_point: &'static str,
    },

    /// Multitexturing reports fewer than two units.
    #[error("GL_ARB_multitexture: {0} texture units, need at least 2")]
    TooFewTextureUnits(i32),

    /// The requested video mode does not exist.
    #[error("invalid video mode {0}")]
    InvalidMode(i32),

    /// The native backend was requested but the platform did not supply one.
    #[error("native backend requested but unavailable")]
    NativeBackendUnavailable,

    /// Invalid platform configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The GL call log could not be opened or written.
    #[error("gl log: {0}")]
    LogSink(#[from] io::Error),
}

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
