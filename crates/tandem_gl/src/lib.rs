//! # TANDEM GL
//!
//! Platform shim between the renderer and the GL driver:
//! - [`GraphicsBackend`]: the entry points the renderer calls
//! - Null and logging backends, picked once by [`select_backend`]
//! - Pixel format choice, extension probing, video modes
//!
//! ## Architecture Rules
//!
//! 1. **No driver calls** - the native backend comes from the platform
//! 2. **Decide once** - backend and capabilities are fixed at init
//! 3. **Driver order** - pixel formats are indexed as the driver lists them
//!
//! ```text
//! PlatformConfig ──► init_gl / init_null ──► PlatformInfo
//!                          │
//!                          ├─ display       (mode, window)
//!                          ├─ pixel_format  (best hardware format)
//!                          └─ extensions    (GlCapabilities)
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod backend;
pub mod config;
pub mod display;
pub mod error;
pub mod extensions;
pub mod gl;
pub mod pixel_format;
pub mod platform;

pub use backend::{select_backend, BackendKind, GraphicsBackend, LogTarget, LoggingBackend, NullBackend};
pub use config::PlatformConfig;
pub use display::{Desktop, ModeInfo, VideoMode, WindowFrame, WindowRect};
pub use error::{PlatformError, PlatformResult};
pub use extensions::{ExtensionSet, GlCapabilities, ProcLookup, TextureCompression};
pub use pixel_format::{ChosenFormat, PfdFlags, PixelFormatDescriptor, PixelFormatRequest, PixelType};
pub use platform::{init_gl, init_null, DriverStrings, PlatformInfo, Surface};
