//! # Rendering Context Boundary
//!
//! The graphics API's context is an opaque external resource. The handoff
//! coordinator only needs two things from it: bind to the calling thread and
//! unbind from the calling thread.
//!
//! ```text
//! Front end ──make_current──►  [ CONTEXT ]  ◄──make_current── Renderer
//!           ◄─release_current─             ─release_current─►
//! ```
//!
//! A context must never be current on two threads at once. The coordinator
//! enforces this by call order, never by a lock.

use crate::error::ContextError;

/// A rendering context that can be bound to one thread at a time.
///
/// Implementations wrap the platform call (`wglMakeCurrent`, `eglMakeCurrent`,
/// ...). Both operations act on the *calling* thread.
pub trait RenderContext: Send + Sync {
    /// Binds the context to the calling thread.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::MakeCurrent`] if the platform refuses.
    fn make_current(&self) -> Result<(), ContextError>;

    /// Unbinds the context from the calling thread.
    ///
    /// Releasing on a thread that does not hold the context is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::ReleaseCurrent`] if the platform refuses.
    fn release_current(&self) -> Result<(), ContextError>;
}

/// Context that binds nowhere.
///
/// Used when the active renderer does not go through GL at all, so the
/// handoff still runs its rendezvous but has nothing to bind.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedContext;

impl RenderContext for DetachedContext {
    #[inline]
    fn make_current(&self) -> Result<(), ContextError> {
        Ok(())
    }

    #[inline]
    fn release_current(&self) -> Result<(), ContextError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_context_always_succeeds() {
        let ctx = DetachedContext;
        assert!(ctx.make_current().is_ok());
        assert!(ctx.release_current().is_ok());
        assert!(ctx.release_current().is_ok());
    }
}
