//! # Render-Thread Synchronization
//!
//! ## The Problem
//!
//! ```text
//! Thread 1 (Front end):  builds frame N+1, needs the context for uploads
//! Thread 2 (Renderer):   draws frame N, needs the context for draws
//!
//! Context current on both threads: UNDEFINED BEHAVIOUR in the driver
//! ```
//!
//! ## The Solution: Blocking Rendezvous
//!
//! Three manual-reset events and a single payload slot. No queue, no
//! buffering: each frame the context and one payload change hands exactly once.

mod event;
mod handoff;

pub use event::ManualResetEvent;
pub use handoff::{HandoffCoordinator, HandoffPhase, HandoffState, HandoffStats};
