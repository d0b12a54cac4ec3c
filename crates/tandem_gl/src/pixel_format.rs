//! # Pixel Format Selection
//!
//! Picks the best hardware pixel format out of what the driver offers.
//!
//! Candidates must be accelerated, RGBA, carry every requested flag, have
//! at least 15 depth bits and, when stencil is requested, at least 4
//! stencil bits. Among survivors, in priority order:
//!
//! ```text
//!   stereo ──► color bits ──► depth bits ──► stencil bits
//! ```
//!
//! For a bit count, once the best meets the request a smaller value that
//! still meets it wins; below the request a larger value wins.

use bitflags::bitflags;
use tracing::{debug, info, warn};

use crate::config::PlatformConfig;
use crate::error::{PlatformError, PlatformResult};

/// Most descriptors ever examined.
pub const MAX_PIXEL_FORMATS: usize = 512;

/// Fewest depth bits a candidate may have.
pub const MIN_DEPTH_BITS: u8 = 15;

/// Fewest stencil bits a candidate may have when stencil is requested.
pub const MIN_STENCIL_BITS: u8 = 4;

bitflags! {
    /// Pixel format capability flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PfdFlags: u32 {
        /// Double buffered.
        const DOUBLEBUFFER = 0x0000_0001;
        /// Left and right buffers.
        const STEREO = 0x0000_0002;
        /// Can draw to a window.
        const DRAW_TO_WINDOW = 0x0000_0004;
        /// Supports GL.
        const SUPPORT_OPENGL = 0x0000_0020;
        /// Software implementation.
        const GENERIC_FORMAT = 0x0000_0040;
        /// Software implementation with partial acceleration.
        const GENERIC_ACCELERATED = 0x0000_1000;
    }
}

/// Colour model of a pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelType {
    /// Direct RGBA colour.
    #[default]
    Rgba,
    /// Palette indices.
    ColorIndex,
}

/// Description of one pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    /// Capability flags.
    pub flags: PfdFlags,
    /// Colour model.
    pub pixel_type: PixelType,
    /// Colour buffer bits.
    pub color_bits: u8,
    /// Depth buffer bits.
    pub depth_bits: u8,
    /// Stencil buffer bits.
    pub stencil_bits: u8,
}

impl PixelFormatDescriptor {
    /// Whether the format is stereo.
    #[must_use]
    pub const fn is_stereo(&self) -> bool {
        self.flags.contains(PfdFlags::STEREO)
    }

    /// Whether stereo and every bit count equal the request's.
    #[must_use]
    pub fn matches_exactly(&self, requested: &Self) -> bool {
        self.is_stereo() == requested.is_stereo()
            && self.color_bits == requested.color_bits
            && self.depth_bits == requested.depth_bits
            && self.stencil_bits == requested.stencil_bits
    }

    fn rejection(&self, requested: &Self) -> Option<&'static str> {
        if self.flags.contains(PfdFlags::GENERIC_FORMAT) {
            Some("software acceleration")
        } else if self.pixel_type != PixelType::Rgba {
            Some("not RGBA")
        } else if !self.flags.contains(requested.flags) {
            Some("improper flags")
        } else if self.depth_bits < MIN_DEPTH_BITS {
            Some("too few depth bits")
        } else if self.stencil_bits < MIN_STENCIL_BITS && requested.stencil_bits > 0 {
            Some("too few stencil bits")
        } else {
            None
        }
    }

    fn is_better_than(&self, best: &Self, requested: &Self) -> bool {
        let same_stereo = self.is_stereo() == best.is_stereo();
        let better_stereo =
            self.is_stereo() == requested.is_stereo() && best.is_stereo() != requested.is_stereo();

        let better_stencil = if requested.stencil_bits == 0 {
            self.stencil_bits == 0 && best.stencil_bits != 0
        } else {
            better_bits(self.stencil_bits, best.stencil_bits, requested.stencil_bits)
        };

        if better_stereo {
            return true;
        }
        if !same_stereo {
            return false;
        }
        if self.color_bits != best.color_bits {
            return better_bits(self.color_bits, best.color_bits, requested.color_bits);
        }
        if self.depth_bits != best.depth_bits {
            return better_bits(self.depth_bits, best.depth_bits, requested.depth_bits);
        }
        better_stencil
    }
}

fn better_bits(candidate: u8, best: u8, wanted: u8) -> bool {
    if best >= wanted {
        candidate >= wanted && candidate < best
    } else {
        candidate > best
    }
}

/// Picks a format from `available` and returns its 1-based index.
///
/// # Errors
///
/// Returns [`PlatformError::NoPixelFormat`] if nothing survives the checks
/// and [`PlatformError::NoHardwareAcceleration`] if the winner is a generic
/// format.
pub fn choose_pixel_format(
    available: &[PixelFormatDescriptor],
    requested: &PixelFormatDescriptor,
) -> PlatformResult<usize> {
    if available.len() > MAX_PIXEL_FORMATS {
        warn!(found = available.len(), max = MAX_PIXEL_FORMATS, "too many pixel formats, truncating");
    }
    let candidates = &available[..available.len().min(MAX_PIXEL_FORMATS)];
    info!(count = candidates.len(), "pixel formats found");

    let mut best: Option<usize> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        if best.is_some_and(|b| candidates[b].matches_exactly(requested)) {
            break;
        }

        if let Some(reason) = candidate.rejection(requested) {
            debug!(index = i + 1, reason, "pixel format rejected");
            continue;
        }

        match best {
            Some(b) if !candidate.is_better_than(&candidates[b], requested) => {}
            _ => best = Some(i),
        }
    }

    let best = best.ok_or(PlatformError::NoPixelFormat)?;
    let generic = PfdFlags::GENERIC_FORMAT | PfdFlags::GENERIC_ACCELERATED;
    if candidates[best].flags.intersects(generic) {
        info!("no hardware acceleration found");
        return Err(PlatformError::NoHardwareAcceleration);
    }

    info!("hardware acceleration found");
    Ok(best + 1)
}

/// What the window asks the driver for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatRequest {
    /// Colour bits, normally the desktop depth.
    pub color_bits: u8,
    /// Depth bits.
    pub depth_bits: u8,
    /// Stencil bits.
    pub stencil_bits: u8,
    /// Ask for stereo.
    pub stereo: bool,
}

impl PixelFormatRequest {
    /// Builds the request from config and the desktop colour depth.
    #[must_use]
    pub fn from_config(config: &PlatformConfig, desktop_color_bits: u8) -> Self {
        Self {
            color_bits: desktop_color_bits,
            depth_bits: config.effective_depth_bits(),
            stencil_bits: config.stencil_bits,
            stereo: config.stereo,
        }
    }

    /// The descriptor handed to [`choose_pixel_format`].
    #[must_use]
    pub fn descriptor(&self) -> PixelFormatDescriptor {
        let mut flags = PfdFlags::DRAW_TO_WINDOW | PfdFlags::SUPPORT_OPENGL | PfdFlags::DOUBLEBUFFER;
        if self.stereo {
            flags |= PfdFlags::STEREO;
        }
        PixelFormatDescriptor {
            flags,
            pixel_type: PixelType::Rgba,
            color_bits: self.color_bits,
            depth_bits: self.depth_bits,
            stencil_bits: self.stencil_bits,
        }
    }
}

/// The format that was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChosenFormat {
    /// 1-based index into the driver's list.
    pub index: usize,
    /// The selected descriptor.
    pub descriptor: PixelFormatDescriptor,
    /// Whether the selected format is stereo.
    pub stereo_enabled: bool,
}

/// Runs [`choose_pixel_format`] for `request` and reports the outcome.
///
/// # Errors
///
/// As [`choose_pixel_format`].
pub fn select_pixel_format(
    available: &[PixelFormatDescriptor],
    request: &PixelFormatRequest,
) -> PlatformResult<ChosenFormat> {
    if request.stereo {
        info!("attempting to use stereo");
    }
    let index = choose_pixel_format(available, &request.descriptor())?;
    let descriptor = available[index - 1];
    let stereo_enabled = descriptor.is_stereo();
    if request.stereo && !stereo_enabled {
        warn!("failed to select stereo pixel format");
    }

    info!(
        index,
        color_bits = descriptor.color_bits,
        depth_bits = descriptor.depth_bits,
        stencil_bits = descriptor.stencil_bits,
        stereo = stereo_enabled,
        "pixel format selected"
    );
    Ok(ChosenFormat { index, descriptor, stereo_enabled })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: PfdFlags = PfdFlags::DRAW_TO_WINDOW
        .union(PfdFlags::SUPPORT_OPENGL)
        .union(PfdFlags::DOUBLEBUFFER);

    fn pfd(color: u8, depth: u8, stencil: u8) -> PixelFormatDescriptor {
        PixelFormatDescriptor {
            flags: WINDOW,
            pixel_type: PixelType::Rgba,
            color_bits: color,
            depth_bits: depth,
            stencil_bits: stencil,
        }
    }

    fn request(color: u8, depth: u8, stencil: u8, stereo: bool) -> PixelFormatDescriptor {
        PixelFormatRequest { color_bits: color, depth_bits: depth, stencil_bits: stencil, stereo }
            .descriptor()
    }

    #[test]
    fn test_exact_match_wins() {
        let available = [pfd(16, 16, 0), pfd(32, 24, 8), pfd(32, 32, 8)];
        assert_eq!(choose_pixel_format(&available, &request(32, 24, 8, false)).unwrap(), 2);
    }

    #[test]
    fn test_stops_at_first_exact_match() {
        let available = [pfd(32, 24, 8), pfd(32, 24, 8)];
        assert_eq!(choose_pixel_format(&available, &request(32, 24, 8, false)).unwrap(), 1);
    }

    #[test]
    fn test_software_formats_rejected() {
        let mut soft = pfd(32, 24, 8);
        soft.flags |= PfdFlags::GENERIC_FORMAT;
        let available = [soft, pfd(16, 16, 8)];
        assert_eq!(choose_pixel_format(&available, &request(32, 24, 8, false)).unwrap(), 2);
    }

    #[test]
    fn test_rejects_color_index_missing_flags_and_shallow_depth() {
        let mut indexed = pfd(32, 24, 8);
        indexed.pixel_type = PixelType::ColorIndex;
        let mut single = pfd(32, 24, 8);
        single.flags.remove(PfdFlags::DOUBLEBUFFER);
        let shallow = pfd(32, 8, 8);

        let err = choose_pixel_format(&[indexed, single, shallow], &request(32, 24, 8, false));
        assert!(matches!(err, Err(PlatformError::NoPixelFormat)));
    }

    #[test]
    fn test_stencil_required_only_when_requested() {
        let available = [pfd(32, 24, 0)];
        assert!(choose_pixel_format(&available, &request(32, 24, 8, false)).is_err());
        assert_eq!(choose_pixel_format(&available, &request(32, 24, 0, false)).unwrap(), 1);
    }

    #[test]
    fn test_prefers_smallest_color_that_meets_request() {
        let available = [pfd(32, 24, 8), pfd(24, 24, 8), pfd(16, 24, 8)];
        assert_eq!(choose_pixel_format(&available, &request(16, 16, 8, false)).unwrap(), 3);
    }

    #[test]
    fn test_prefers_more_bits_below_request() {
        let available = [pfd(32, 16, 8), pfd(32, 24, 8)];
        assert_eq!(choose_pixel_format(&available, &request(32, 32, 8, false)).unwrap(), 2);
    }

    #[test]
    fn test_zero_stencil_request_prefers_zero_stencil() {
        let available = [pfd(32, 24, 8), pfd(32, 24, 0)];
        assert_eq!(choose_pixel_format(&available, &request(32, 24, 0, false)).unwrap(), 2);
    }

    #[test]
    fn test_stereo_match_outranks_color() {
        let mut stereo = pfd(32, 24, 8);
        stereo.flags |= PfdFlags::STEREO;
        let available = [stereo, pfd(16, 24, 8)];
        assert_eq!(choose_pixel_format(&available, &request(32, 24, 8, false)).unwrap(), 2);
    }

    #[test]
    fn test_stereo_request_needs_stereo_format() {
        let mut stereo = pfd(16, 24, 8);
        stereo.flags |= PfdFlags::STEREO;
        let stereo_request =
            PixelFormatRequest { color_bits: 32, depth_bits: 24, stencil_bits: 8, stereo: true };

        let chosen = select_pixel_format(&[pfd(32, 24, 8), stereo], &stereo_request).unwrap();
        assert_eq!(chosen.index, 2);
        assert!(chosen.stereo_enabled);

        let err = select_pixel_format(&[pfd(32, 24, 8)], &stereo_request);
        assert!(matches!(err, Err(PlatformError::NoPixelFormat)));
    }

    #[test]
    fn test_generic_accelerated_winner_fails() {
        let mut partial = pfd(32, 24, 8);
        partial.flags |= PfdFlags::GENERIC_ACCELERATED;
        let err = choose_pixel_format(&[partial], &request(32, 24, 8, false));
        assert!(matches!(err, Err(PlatformError::NoHardwareAcceleration)));
    }

    #[test]
    fn test_only_first_512_considered() {
        let mut available = vec![pfd(32, 8, 8); MAX_PIXEL_FORMATS];
        available.push(pfd(32, 24, 8));
        let err = choose_pixel_format(&available, &request(32, 24, 8, false));
        assert!(matches!(err, Err(PlatformError::NoPixelFormat)));
    }

    #[test]
    fn test_request_from_config_maps_zero_depth() {
        let config = PlatformConfig { depth_bits: 0, stencil_bits: 0, ..PlatformConfig::default() };
        let req = PixelFormatRequest::from_config(&config, 32);
        assert_eq!(req.depth_bits, 24);
        assert_eq!(req.stencil_bits, 0);
        assert!(!req.descriptor().is_stereo());
    }
}
