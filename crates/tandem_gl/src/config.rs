//! # Platform Configuration
//!
//! Video mode, framebuffer bits, extension toggles and backend choice.
//!
//! ```toml
//! mode = 6
//! fullscreen = false
//! depth_bits = 24
//! stencil_bits = 8
//! backend = "native"
//! log_frames = 3
//! log_path = "gl.log"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tandem_core::ConfigError;

use crate::backend::{BackendKind, LogTarget};
use crate::display::{CUSTOM_MODE, VIDEO_MODES};
use crate::error::PlatformResult;

/// Depth bits requested when the config leaves `depth_bits` at zero.
pub const DEFAULT_DEPTH_BITS: u8 = 24;

/// Platform layer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Index into the video mode table, or `-1` for the custom size.
    pub mode: i32,
    /// Width used by the custom mode.
    pub custom_width: u32,
    /// Height used by the custom mode.
    pub custom_height: u32,
    /// Pixel aspect used by the custom mode.
    pub custom_aspect: f32,
    /// Take over the whole desktop.
    pub fullscreen: bool,
    /// Depth buffer bits. `0` picks [`DEFAULT_DEPTH_BITS`].
    pub depth_bits: u8,
    /// Stencil buffer bits. `0` requests no stencil.
    pub stencil_bits: u8,
    /// Request a stereo pixel format.
    pub stereo: bool,
    /// Requested left edge of a windowed client area.
    pub window_x: i32,
    /// Requested top edge of a windowed client area.
    pub window_y: i32,
    /// Use S3TC texture compression when offered.
    pub ext_compressed_textures: bool,
    /// Use `GL_EXT_texture_env_add` when offered.
    pub ext_texture_env_add: bool,
    /// Use `GL_EXT_compiled_vertex_array` when offered.
    pub ext_compiled_vertex_array: bool,
    /// Backend to install.
    pub backend: BackendKind,
    /// Frames of GL calls to log. `0` disables the call log.
    pub log_frames: u32,
    /// File the call log is written to.
    pub log_path: PathBuf,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            mode: 3,
            custom_width: 1600,
            custom_height: 1024,
            custom_aspect: 1.0,
            fullscreen: false,
            depth_bits: 0,
            stencil_bits: 8,
            stereo: false,
            window_x: 3,
            window_y: 22,
            ext_compressed_textures: false,
            ext_texture_env_add: true,
            ext_compiled_vertex_array: true,
            backend: BackendKind::Native,
            log_frames: 0,
            log_path: PathBuf::from("gl.log"),
        }
    }
}

impl PlatformConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`PlatformConfig::from_toml_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let last_mode = i32::try_from(VIDEO_MODES.len()).unwrap_or(i32::MAX) - 1;
        if self.mode < CUSTOM_MODE || self.mode > last_mode {
            return Err(ConfigError::Invalid(format!(
                "mode {} is outside {CUSTOM_MODE}..={last_mode}",
                self.mode
            )));
        }
        if self.mode == CUSTOM_MODE && (self.custom_width == 0 || self.custom_height == 0) {
            return Err(ConfigError::Invalid("custom mode needs a non-zero size".into()));
        }
        if !(self.custom_aspect.is_finite() && self.custom_aspect > 0.0) {
            return Err(ConfigError::Invalid("custom_aspect must be positive".into()));
        }
        if self.depth_bits > 32 {
            return Err(ConfigError::Invalid(format!("depth_bits {} > 32", self.depth_bits)));
        }
        if self.stencil_bits > 8 {
            return Err(ConfigError::Invalid(format!("stencil_bits {} > 8", self.stencil_bits)));
        }
        Ok(())
    }

    /// Depth bits to request, with `0` mapped to the default.
    #[must_use]
    pub fn effective_depth_bits(&self) -> u8 {
        if self.depth_bits == 0 {
            DEFAULT_DEPTH_BITS
        } else {
            self.depth_bits
        }
    }

    /// Opens the call log when `log_frames` is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::LogSink`](crate::PlatformError::LogSink) if
    /// `log_path` cannot be created.
    pub fn log_target(&self) -> PlatformResult<Option<LogTarget>> {
        if self.log_frames == 0 {
            return Ok(None);
        }
        LogTarget::file(&self.log_path, self.log_frames).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlatformConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_depth_bits(), DEFAULT_DEPTH_BITS);
        assert!(config.log_target().expect("no log").is_none());
    }

    #[test]
    fn test_parse_partial_document() {
        let config = PlatformConfig::from_toml_str(
            r#"
            mode = -1
            custom_width = 1920
            custom_height = 1080
            fullscreen = true
            depth_bits = 16
            backend = "null"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.mode, CUSTOM_MODE);
        assert_eq!((config.custom_width, config.custom_height), (1920, 1080));
        assert!(config.fullscreen);
        assert_eq!(config.effective_depth_bits(), 16);
        assert_eq!(config.backend, BackendKind::Null);
        assert_eq!(config.stencil_bits, 8);
    }

    #[test]
    fn test_rejects_out_of_range_mode() {
        for source in ["mode = 12", "mode = -2"] {
            let err = PlatformConfig::from_toml_str(source).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{source}");
        }
    }

    #[test]
    fn test_rejects_bad_bits() {
        assert!(PlatformConfig::from_toml_str("depth_bits = 48").is_err());
        assert!(PlatformConfig::from_toml_str("stencil_bits = 16").is_err());
    }

    #[test]
    fn test_log_target_creates_file() {
        let path = std::env::temp_dir().join(format!("tandem-gl-{}.log", std::process::id()));
        let config = PlatformConfig {
            log_frames: 2,
            log_path: path.clone(),
            ..PlatformConfig::default()
        };

        let target = config.log_target().expect("open log");
        assert!(target.is_some());
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
