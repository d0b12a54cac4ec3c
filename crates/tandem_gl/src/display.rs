//! # Display Modes
//!
//! Resolves the configured video mode against the desktop and places the
//! window.
//!
//! ```text
//!   fullscreen ──► desktop size, aspect 1.0, window at 0,0
//!   windowed   ──► mode table ──► larger than desktop? ──► DEFAULT_MODE
//!                                         │
//!                                         ▼
//!                          add frame border, keep on screen
//! ```

use tracing::{info, warn};

use crate::config::PlatformConfig;
use crate::error::{PlatformError, PlatformResult};

/// Mode index that selects the configured custom size.
pub const CUSTOM_MODE: i32 = -1;

/// Mode used when the requested window does not fit the desktop.
pub const DEFAULT_MODE: i32 = 4;

/// One entry of the video mode table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMode {
    /// Human-readable label.
    pub description: &'static str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel aspect ratio.
    pub pixel_aspect: f32,
}

const fn mode(description: &'static str, width: u32, height: u32) -> VideoMode {
    VideoMode { description, width, height, pixel_aspect: 1.0 }
}

/// Video modes `0..=11`.
pub const VIDEO_MODES: [VideoMode; 12] = [
    mode("Mode  0: 320x240", 320, 240),
    mode("Mode  1: 400x300", 400, 300),
    mode("Mode  2: 512x384", 512, 384),
    mode("Mode  3: 640x480", 640, 480),
    mode("Mode  4: 800x600", 800, 600),
    mode("Mode  5: 960x720", 960, 720),
    mode("Mode  6: 1024x768", 1024, 768),
    mode("Mode  7: 1152x864", 1152, 864),
    mode("Mode  8: 1280x1024", 1280, 1024),
    mode("Mode  9: 1600x1200", 1600, 1200),
    mode("Mode 10: 2048x1536", 2048, 1536),
    mode("Mode 11: 856x480 (wide)", 856, 480),
];

/// Size and colour depth of the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Desktop {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bits per pixel.
    pub color_bits: u8,
}

/// The mode actually set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeInfo {
    /// Mode index used, after any fallback. Fullscreen keeps the requested index.
    pub mode: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Window aspect ratio.
    pub aspect: f32,
    /// Whether the mode covers the desktop.
    pub fullscreen: bool,
}

/// Looks up a mode: `(width, height, window aspect)`.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidMode`] for indices outside the table
/// other than [`CUSTOM_MODE`].
pub fn mode_info(config: &PlatformConfig, mode: i32) -> PlatformResult<(u32, u32, f32)> {
    let (width, height, pixel_aspect) = if mode == CUSTOM_MODE {
        (config.custom_width, config.custom_height, config.custom_aspect)
    } else {
        let entry = usize::try_from(mode)
            .ok()
            .and_then(|index| VIDEO_MODES.get(index))
            .ok_or(PlatformError::InvalidMode(mode))?;
        (entry.width, entry.height, entry.pixel_aspect)
    };
    if width == 0 || height == 0 {
        return Err(PlatformError::InvalidMode(mode));
    }

    #[allow(clippy::cast_precision_loss)]
    let aspect = width as f32 * pixel_aspect / height as f32;
    Ok((width, height, aspect))
}

/// Resolves the configured mode against the desktop.
///
/// # Errors
///
/// Returns [`PlatformError::InvalidMode`] if neither the configured mode
/// nor [`DEFAULT_MODE`] can be looked up.
pub fn resolve_mode(config: &PlatformConfig, desktop: &Desktop) -> PlatformResult<ModeInfo> {
    if config.fullscreen {
        info!(width = desktop.width, height = desktop.height, "setting fullscreen mode");
        return Ok(ModeInfo {
            mode: config.mode,
            width: desktop.width,
            height: desktop.height,
            aspect: 1.0,
            fullscreen: true,
        });
    }

    let mut mode = config.mode;
    let (mut width, mut height, mut aspect) = mode_info(config, mode)?;

    if width > desktop.width || height > desktop.height {
        warn!(
            mode,
            width,
            height,
            desktop_width = desktop.width,
            desktop_height = desktop.height,
            fallback = DEFAULT_MODE,
            "mode is larger than the desktop, using default mode"
        );
        mode = DEFAULT_MODE;
        (width, height, aspect) = mode_info(config, mode)?;
    }

    info!(mode, width, height, "setting windowed mode");
    Ok(ModeInfo { mode, width, height, aspect, fullscreen: false })
}

/// Border thickness the window manager adds around a client area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowFrame {
    /// Left border.
    pub left: i32,
    /// Title bar and top border.
    pub top: i32,
    /// Right border.
    pub right: i32,
    /// Bottom border.
    pub bottom: i32,
}

/// Outer window rectangle in desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Outer width, frame included.
    pub width: i32,
    /// Outer height, frame included.
    pub height: i32,
}

/// Places the window for `mode`.
///
/// Fullscreen windows sit at the origin without a frame. Windowed ones get
/// the frame added, negative positions clamped to zero, and are pulled back
/// on screen when they fit the desktop.
#[must_use]
pub fn place_window(
    mode: &ModeInfo,
    requested: (i32, i32),
    frame: WindowFrame,
    desktop: &Desktop,
) -> WindowRect {
    let client_w = i32::try_from(mode.width).unwrap_or(i32::MAX);
    let client_h = i32::try_from(mode.height).unwrap_or(i32::MAX);

    if mode.fullscreen {
        return WindowRect { x: 0, y: 0, width: client_w, height: client_h };
    }

    let width = client_w.saturating_add(frame.left).saturating_add(frame.right);
    let height = client_h.saturating_add(frame.top).saturating_add(frame.bottom);
    let desktop_w = i32::try_from(desktop.width).unwrap_or(i32::MAX);
    let desktop_h = i32::try_from(desktop.height).unwrap_or(i32::MAX);

    let mut x = requested.0.max(0);
    let mut y = requested.1.max(0);

    if width < desktop_w && height < desktop_h {
        if x.saturating_add(width) > desktop_w {
            x = desktop_w - width;
        }
        if y.saturating_add(height) > desktop_h {
            y = desktop_h - height;
        }
    }

    let rect = WindowRect { x, y, width, height };
    info!(x, y, width, height, "window placed");
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP: Desktop = Desktop { width: 1920, height: 1080, color_bits: 32 };
    const FRAME: WindowFrame = WindowFrame { left: 3, top: 22, right: 3, bottom: 3 };

    fn windowed(mode: i32) -> PlatformConfig {
        PlatformConfig { mode, fullscreen: false, ..PlatformConfig::default() }
    }

    #[test]
    fn test_mode_table_lookup() {
        let (w, h, aspect) = mode_info(&windowed(6), 6).expect("mode 6");
        assert_eq!((w, h), (1024, 768));
        assert!((aspect - 4.0 / 3.0).abs() < 1e-6);

        assert!(matches!(mode_info(&windowed(0), 12), Err(PlatformError::InvalidMode(12))));
        assert!(matches!(mode_info(&windowed(0), -2), Err(PlatformError::InvalidMode(-2))));
    }

    #[test]
    fn test_custom_mode() {
        let config = PlatformConfig {
            mode: CUSTOM_MODE,
            custom_width: 1280,
            custom_height: 720,
            ..PlatformConfig::default()
        };
        let info = resolve_mode(&config, &DESKTOP).expect("custom");
        assert_eq!((info.width, info.height), (1280, 720));
        assert_eq!(info.mode, CUSTOM_MODE);
    }

    #[test]
    fn test_fullscreen_uses_desktop() {
        let config = PlatformConfig { fullscreen: true, mode: 3, ..PlatformConfig::default() };
        let info = resolve_mode(&config, &DESKTOP).expect("fullscreen");
        assert_eq!((info.width, info.height), (1920, 1080));
        assert!((info.aspect - 1.0).abs() < f32::EPSILON);
        assert!(info.fullscreen);
    }

    #[test]
    fn test_oversized_mode_falls_back_to_default() {
        let info = resolve_mode(&windowed(10), &DESKTOP).expect("fallback");
        assert_eq!(info.mode, DEFAULT_MODE);
        assert_eq!((info.width, info.height), (800, 600));
    }

    #[test]
    fn test_fullscreen_window_at_origin() {
        let info = ModeInfo { mode: 3, width: 1920, height: 1080, aspect: 1.0, fullscreen: true };
        let rect = place_window(&info, (100, 100), FRAME, &DESKTOP);
        assert_eq!(rect, WindowRect { x: 0, y: 0, width: 1920, height: 1080 });
    }

    #[test]
    fn test_windowed_adds_frame_and_clamps_negative() {
        let info = resolve_mode(&windowed(3), &DESKTOP).expect("mode 3");
        let rect = place_window(&info, (-50, -10), FRAME, &DESKTOP);
        assert_eq!(rect, WindowRect { x: 0, y: 0, width: 646, height: 505 });
    }

    #[test]
    fn test_windowed_pulled_back_on_screen() {
        let info = resolve_mode(&windowed(6), &DESKTOP).expect("mode 6");
        let rect = place_window(&info, (1800, 900), FRAME, &DESKTOP);
        assert_eq!(rect.x + rect.width, 1920);
        assert_eq!(rect.y + rect.height, 1080);
    }

    #[test]
    fn test_window_larger_than_desktop_not_moved() {
        let small = Desktop { width: 800, height: 600, color_bits: 16 };
        let info = ModeInfo { mode: 4, width: 800, height: 600, aspect: 4.0 / 3.0, fullscreen: false };
        let rect = place_window(&info, (40, 30), FRAME, &small);
        assert_eq!((rect.x, rect.y), (40, 30));
    }
}
