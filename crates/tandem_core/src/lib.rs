//! # TANDEM Core
//!
//! Render-thread handoff for a two-thread renderer:
//! - A front end (game logic) thread that builds frames
//! - A renderer thread that owns the rendering context while drawing
//!
//! ## Architecture Rules
//!
//! 1. **One owner** - the context is current on at most one thread
//! 2. **One slot** - one payload per cycle, no queue
//! 3. **Blocking waits** - both sides sleep on events, nobody spins
//!
//! ## Example
//!
//! ```rust,ignore
//! use tandem_core::{HandoffCoordinator, OsThreadSpawner};
//!
//! let handoff = HandoffCoordinator::with_default_config(context);
//! let renderer = handoff.spawn_render_thread(&OsThreadSpawner, render_loop)?;
//!
//! loop {
//!     handoff.front_end_sleep()?;
//!     let frame = build_frame();
//!     handoff.wake_renderer(frame)?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod context;
pub mod error;
pub mod sync;
pub mod thread;

pub use config::{BindFailurePolicy, HandoffConfig};
pub use context::{DetachedContext, RenderContext};
pub use error::{ConfigError, ContextError, ContextOp, HandoffError, HandoffResult};
pub use sync::{HandoffCoordinator, HandoffPhase, HandoffState, HandoffStats, ManualResetEvent};
pub use thread::{OsThreadSpawner, RenderThread, ThreadEntry, ThreadSpawner};
