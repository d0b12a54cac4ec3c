//! # Platform Init
//!
//! Runs the init steps in order and collects what the renderer needs to
//! know about the result.
//!
//! ```text
//!   GL:   mode ──► window ──► pixel format ──► driver strings ──► extensions
//!   Null: mode ──► window ──► placeholder capabilities
//! ```

use tracing::info;

use crate::backend::GraphicsBackend;
use crate::config::PlatformConfig;
use crate::display::{place_window, resolve_mode, Desktop, ModeInfo, WindowFrame, WindowRect};
use crate::error::PlatformResult;
use crate::extensions::{probe_backend, GlCapabilities, ProcLookup};
use crate::gl::{GL_RENDERER, GL_VENDOR, GL_VERSION};
use crate::pixel_format::{select_pixel_format, ChosenFormat, PixelFormatDescriptor, PixelFormatRequest};

/// What the window system offers for a new GL window.
pub struct Surface<'a> {
    /// Pixel formats the driver describes, in driver order.
    pub pixel_formats: &'a [PixelFormatDescriptor],
    /// Border the window manager adds to windowed mode.
    pub frame: WindowFrame,
    /// Driver entry point lookup.
    pub lookup: &'a dyn ProcLookup,
}

/// Driver identification strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStrings {
    /// `GL_VENDOR`.
    pub vendor: String,
    /// `GL_RENDERER`.
    pub renderer: String,
    /// `GL_VERSION`.
    pub version: String,
}

/// Result of platform init.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformInfo {
    /// Mode that was set.
    pub mode: ModeInfo,
    /// Outer window rectangle.
    pub window: WindowRect,
    /// Selected pixel format, `None` without a GL driver.
    pub pixel_format: Option<ChosenFormat>,
    /// Driver strings, empty without a GL driver.
    pub driver: DriverStrings,
    /// Usable features.
    pub capabilities: GlCapabilities,
}

fn set_mode(
    config: &PlatformConfig,
    desktop: &Desktop,
    frame: WindowFrame,
) -> PlatformResult<(ModeInfo, WindowRect)> {
    let mode = resolve_mode(config, desktop)?;
    let window = place_window(&mode, (config.window_x, config.window_y), frame, desktop);
    Ok((mode, window))
}

/// Brings up the GL path.
///
/// The caller has made the context current on this thread; `backend`
/// talks to it.
///
/// # Errors
///
/// Propagates the first failing step: mode lookup, pixel format selection
/// or extension probing.
pub fn init_gl(
    config: &PlatformConfig,
    desktop: &Desktop,
    surface: &Surface<'_>,
    backend: &mut dyn GraphicsBackend,
) -> PlatformResult<PlatformInfo> {
    info!("initializing GL platform");
    let (mode, window) = set_mode(config, desktop, surface.frame)?;

    let request = PixelFormatRequest::from_config(config, desktop.color_bits);
    let pixel_format = select_pixel_format(surface.pixel_formats, &request)?;

    let driver = DriverStrings {
        vendor: backend.get_string(GL_VENDOR),
        renderer: backend.get_string(GL_RENDERER),
        version: backend.get_string(GL_VERSION),
    };
    info!(vendor = %driver.vendor, renderer = %driver.renderer, version = %driver.version, "GL driver");

    let capabilities = probe_backend(backend, config, surface.lookup)?;

    Ok(PlatformInfo { mode, window, pixel_format: Some(pixel_format), driver, capabilities })
}

/// Brings up the window for a renderer that does not use GL.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidMode`](crate::PlatformError::InvalidMode)
/// if the mode cannot be looked up.
pub fn init_null(
    config: &PlatformConfig,
    desktop: &Desktop,
    frame: WindowFrame,
) -> PlatformResult<PlatformInfo> {
    info!("initializing platform without GL");
    let (mode, window) = set_mode(config, desktop, frame)?;
    Ok(PlatformInfo {
        mode,
        window,
        pixel_format: None,
        driver: DriverStrings::default(),
        capabilities: GlCapabilities::placeholder(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;
    use crate::error::PlatformError;
    use crate::pixel_format::{PfdFlags, PixelType};

    const DESKTOP: Desktop = Desktop { width: 1280, height: 1024, color_bits: 32 };

    fn any_proc(_: &str) -> bool {
        true
    }

    fn hardware_format() -> PixelFormatDescriptor {
        PixelFormatDescriptor {
            flags: PfdFlags::DRAW_TO_WINDOW | PfdFlags::SUPPORT_OPENGL | PfdFlags::DOUBLEBUFFER,
            pixel_type: PixelType::Rgba,
            color_bits: 32,
            depth_bits: 24,
            stencil_bits: 8,
        }
    }

    #[test]
    fn test_null_init_uses_placeholders() {
        let info = init_null(&PlatformConfig::default(), &DESKTOP, WindowFrame::default()).unwrap();
        assert_eq!((info.mode.width, info.mode.height), (640, 480));
        assert!(info.pixel_format.is_none());
        assert_eq!(info.capabilities, GlCapabilities::placeholder());
        assert_eq!(info.window.x, 3);
    }

    #[test]
    fn test_gl_init_stops_at_extension_probe_on_null_driver() {
        let formats = [hardware_format()];
        let surface = Surface { pixel_formats: &formats, frame: WindowFrame::default(), lookup: &any_proc };

        let err = init_gl(&PlatformConfig::default(), &DESKTOP, &surface, &mut NullBackend);
        assert!(matches!(err, Err(PlatformError::MissingExtension(_))));
    }

    #[test]
    fn test_gl_init_without_formats_fails() {
        let surface = Surface { pixel_formats: &[], frame: WindowFrame::default(), lookup: &any_proc };
        let err = init_gl(&PlatformConfig::default(), &DESKTOP, &surface, &mut NullBackend);
        assert!(matches!(err, Err(PlatformError::NoPixelFormat)));
    }
}
