//! # Handoff Error Types
//!
//! All errors that can occur while spawning the render thread or handing the
//! rendering context between threads.

use std::fmt;
use std::io;

use thiserror::Error;

/// Errors reported by a [`RenderContext`](crate::RenderContext) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// Binding the context to the calling thread failed.
    #[error("make current failed: {0}")]
    MakeCurrent(String),

    /// Releasing the context from the calling thread failed.
    #[error("release current failed: {0}")]
    ReleaseCurrent(String),
}

/// Which half of the context boundary failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextOp {
    /// Binding the context to the calling thread.
    Bind,
    /// Unbinding the context from the calling thread.
    Unbind,
}

impl fmt::Display for ContextOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind => f.write_str("bind"),
            Self::Unbind => f.write_str("unbind"),
        }
    }
}

/// Errors that can occur in the handoff system.
#[derive(Error, Debug)]
pub enum HandoffError {
    /// The operating system refused to start the render thread.
    #[error("failed to create render thread: {0}")]
    ThreadCreation(#[source] io::Error),

    /// The render thread was already started for this coordinator.
    #[error("render thread already spawned")]
    AlreadySpawned,

    /// A context bind or unbind failed and the policy aborts the cycle.
    #[error("context {op} failed in {site}: {source}")]
    ContextBind {
        /// Bind or unbind.
        op: ContextOp,
        /// Handoff operation that observed the failure.
        site: &'static str,
        /// Error reported by the context.
        #[source]
        source: ContextError,
    },

    /// The renderer was released without a payload in the slot.
    #[error("renderer woke with an empty payload slot")]
    PayloadMissing,

    /// The render thread function panicked.
    #[error("render thread panicked: {0}")]
    RenderThreadPanicked(String),

    /// The render thread is no longer running.
    #[error("render thread has exited")]
    RendererExited,

    /// Invalid handoff configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML for the expected schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for handoff operations.
pub type HandoffResult<T> = Result<T, HandoffError>;
