//! # TANDEM
//!
//! A two-thread renderer: the front end builds frames while the renderer
//! thread draws the previous one, with the rendering context handed back
//! and forth between them.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           TANDEM                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────────┐   FramePacket   ┌──────────────────┐  │
//! │  │   FRONT END      │ ──────────────► │   RENDERER       │  │
//! │  │  • game logic    │                 │  • owns backend  │  │
//! │  │  • command lists │ ◄────────────── │  • draws frames  │  │
//! │  └────────┬─────────┘   work done     └────────┬─────────┘  │
//! │           │                                    │            │
//! │           └──────── tandem_core (handoff) ─────┘            │
//! │                              │                              │
//! │                     tandem_gl (platform)                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `frame_loop`: front end driver and renderer loop
//! - `sim`: context and driver stand-ins
//! - `config`: one TOML file for every layer

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod frame_loop;
pub mod sim;

// Re-export the layers
pub use tandem_core as core;
pub use tandem_gl as gl;

pub use config::{SimulationConfig, TandemConfig};
pub use error::{TandemError, TandemResult};
pub use frame_loop::{
    render_loop, FrameLoop, FramePacket, FrameStats, FrameStatsAccumulator, RenderCommand,
    RenderStats,
};
pub use sim::{SimulatedContext, SimulatedDriver};
