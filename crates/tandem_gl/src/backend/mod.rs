//! # Graphics Backend
//!
//! The GL entry points the engine calls, behind one trait. The backend is
//! chosen once at init and owned by whichever thread renders.
//!
//! ```text
//!   renderer ──► Box<dyn GraphicsBackend>
//!                    │
//!        ┌───────────┼──────────────────┐
//!        ▼           ▼                  ▼
//!     native      NullBackend     LoggingBackend ──► wrapped backend
//!   (platform)    (no-ops)        (one line per call)
//! ```

mod logging;
pub mod names;

pub use logging::{LogTarget, LoggingBackend, CLOSING_LINE};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PlatformError, PlatformResult};
use crate::gl::{GLbitfield, GLenum, GLint, GLsizei, GLuint, GL_NO_ERROR};

/// GL entry points used by the engine.
///
/// Methods take `&mut self`: a backend is driven by one thread at a time and
/// moves with the context.
pub trait GraphicsBackend: Send {
    /// `glAlphaFunc`.
    fn alpha_func(&mut self, func: GLenum, reference: f32);
    /// `glBindTexture`.
    fn bind_texture(&mut self, target: GLenum, texture: GLuint);
    /// `glBlendFunc`.
    fn blend_func(&mut self, src: GLenum, dst: GLenum);
    /// `glClear`.
    fn clear(&mut self, mask: GLbitfield);
    /// `glClearColor`.
    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32);
    /// `glColorMask`.
    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool);
    /// `glCullFace`.
    fn cull_face(&mut self, mode: GLenum);
    /// `glDeleteTextures`.
    fn delete_textures(&mut self, textures: &[GLuint]);
    /// `glDepthFunc`.
    fn depth_func(&mut self, func: GLenum);
    /// `glDepthMask`.
    fn depth_mask(&mut self, flag: bool);
    /// `glDepthRange`.
    fn depth_range(&mut self, near: f64, far: f64);
    /// `glDisable`.
    fn disable(&mut self, cap: GLenum);
    /// `glEnable`.
    fn enable(&mut self, cap: GLenum);
    /// `glDrawElements`. `indices` holds `count` indices of `index_type`.
    fn draw_elements(&mut self, mode: GLenum, count: GLsizei, index_type: GLenum, indices: &[u8]);
    /// `glFinish`.
    fn finish(&mut self);
    /// `glGetError`.
    fn get_error(&mut self) -> GLenum;
    /// `glGetIntegerv` for a single value.
    fn get_integer(&mut self, pname: GLenum) -> GLint;
    /// `glGetString`.
    fn get_string(&mut self, name: GLenum) -> String;
    /// `glPolygonOffset`.
    fn polygon_offset(&mut self, factor: f32, units: f32);
    /// `glScissor`.
    fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    /// `glViewport`.
    fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    /// `glActiveTextureARB`.
    fn active_texture(&mut self, texture: GLenum);
    /// `glClientActiveTextureARB`.
    fn client_active_texture(&mut self, texture: GLenum);

    /// Marks the end of a frame.
    fn end_frame(&mut self) {}

    /// Free-form text for backends that keep a call log.
    fn log_comment(&mut self, _comment: &str) {}
}

impl<B: GraphicsBackend + ?Sized> GraphicsBackend for Box<B> {
    fn alpha_func(&mut self, func: GLenum, reference: f32) {
        (**self).alpha_func(func, reference);
    }
    fn bind_texture(&mut self, target: GLenum, texture: GLuint) {
        (**self).bind_texture(target, texture);
    }
    fn blend_func(&mut self, src: GLenum, dst: GLenum) {
        (**self).blend_func(src, dst);
    }
    fn clear(&mut self, mask: GLbitfield) {
        (**self).clear(mask);
    }
    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        (**self).clear_color(red, green, blue, alpha);
    }
    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        (**self).color_mask(red, green, blue, alpha);
    }
    fn cull_face(&mut self, mode: GLenum) {
        (**self).cull_face(mode);
    }
    fn delete_textures(&mut self, textures: &[GLuint]) {
        (**self).delete_textures(textures);
    }
    fn depth_func(&mut self, func: GLenum) {
        (**self).depth_func(func);
    }
    fn depth_mask(&mut self, flag: bool) {
        (**self).depth_mask(flag);
    }
    fn depth_range(&mut self, near: f64, far: f64) {
        (**self).depth_range(near, far);
    }
    fn disable(&mut self, cap: GLenum) {
        (**self).disable(cap);
    }
    fn enable(&mut self, cap: GLenum) {
        (**self).enable(cap);
    }
    fn draw_elements(&mut self, mode: GLenum, count: GLsizei, index_type: GLenum, indices: &[u8]) {
        (**self).draw_elements(mode, count, index_type, indices);
    }
    fn finish(&mut self) {
        (**self).finish();
    }
    fn get_error(&mut self) -> GLenum {
        (**self).get_error()
    }
    fn get_integer(&mut self, pname: GLenum) -> GLint {
        (**self).get_integer(pname)
    }
    fn get_string(&mut self, name: GLenum) -> String {
        (**self).get_string(name)
    }
    fn polygon_offset(&mut self, factor: f32, units: f32) {
        (**self).polygon_offset(factor, units);
    }
    fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        (**self).scissor(x, y, width, height);
    }
    fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        (**self).viewport(x, y, width, height);
    }
    fn active_texture(&mut self, texture: GLenum) {
        (**self).active_texture(texture);
    }
    fn client_active_texture(&mut self, texture: GLenum) {
        (**self).client_active_texture(texture);
    }
    fn end_frame(&mut self) {
        (**self).end_frame();
    }
    fn log_comment(&mut self, comment: &str) {
        (**self).log_comment(comment);
    }
}

// ============================================================================
// NULL BACKEND
// ============================================================================

/// Backend whose calls do nothing.
///
/// Installed when another renderer owns the display.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl GraphicsBackend for NullBackend {
    fn alpha_func(&mut self, _func: GLenum, _reference: f32) {}
    fn bind_texture(&mut self, _target: GLenum, _texture: GLuint) {}
    fn blend_func(&mut self, _src: GLenum, _dst: GLenum) {}
    fn clear(&mut self, _mask: GLbitfield) {}
    fn clear_color(&mut self, _red: f32, _green: f32, _blue: f32, _alpha: f32) {}
    fn color_mask(&mut self, _red: bool, _green: bool, _blue: bool, _alpha: bool) {}
    fn cull_face(&mut self, _mode: GLenum) {}
    fn delete_textures(&mut self, _textures: &[GLuint]) {}
    fn depth_func(&mut self, _func: GLenum) {}
    fn depth_mask(&mut self, _flag: bool) {}
    fn depth_range(&mut self, _near: f64, _far: f64) {}
    fn disable(&mut self, _cap: GLenum) {}
    fn enable(&mut self, _cap: GLenum) {}
    fn draw_elements(&mut self, _mode: GLenum, _count: GLsizei, _index_type: GLenum, _indices: &[u8]) {}
    fn finish(&mut self) {}

    fn get_error(&mut self) -> GLenum {
        GL_NO_ERROR
    }

    fn get_integer(&mut self, _pname: GLenum) -> GLint {
        0
    }

    fn get_string(&mut self, _name: GLenum) -> String {
        String::new()
    }

    fn polygon_offset(&mut self, _factor: f32, _units: f32) {}
    fn scissor(&mut self, _x: GLint, _y: GLint, _width: GLsizei, _height: GLsizei) {}
    fn viewport(&mut self, _x: GLint, _y: GLint, _width: GLsizei, _height: GLsizei) {}
    fn active_texture(&mut self, _texture: GLenum) {}
    fn client_active_texture(&mut self, _texture: GLenum) {}
}

// ============================================================================
// SELECTION
// ============================================================================

/// Which backend the renderer drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// The driver backend supplied by the platform.
    #[default]
    Native,
    /// No-op backend.
    Null,
}

/// Picks the backend for this run, optionally wrapped in a call log.
///
/// # Errors
///
/// Returns [`PlatformError::NativeBackendUnavailable`] if `kind` is
/// [`BackendKind::Native`] and the platform supplied none, and
/// [`PlatformError::LogSink`] if the log header cannot be written.
pub fn select_backend(
    kind: BackendKind,
    native: Option<Box<dyn GraphicsBackend>>,
    logging: Option<LogTarget>,
) -> PlatformResult<Box<dyn GraphicsBackend>> {
    let base: Box<dyn GraphicsBackend> = match kind {
        BackendKind::Native => native.ok_or(PlatformError::NativeBackendUnavailable)?,
        BackendKind::Null => Box::new(NullBackend),
    };
    info!(backend = ?kind, logging = logging.is_some(), "graphics backend selected");

    match logging {
        Some(target) => Ok(Box::new(LoggingBackend::new(base, target)?)),
        None => Ok(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{GL_EXTENSIONS, GL_MAX_TEXTURE_UNITS_ARB};

    #[test]
    fn test_null_backend_answers() {
        let mut backend = NullBackend;
        backend.enable(crate::gl::GL_BLEND);
        assert_eq!(backend.get_error(), GL_NO_ERROR);
        assert_eq!(backend.get_string(GL_EXTENSIONS), "");
        assert_eq!(backend.get_integer(GL_MAX_TEXTURE_UNITS_ARB), 0);
    }

    #[test]
    fn test_native_without_platform_backend_fails() {
        let err = select_backend(BackendKind::Native, None, None).err();
        assert!(matches!(err, Some(PlatformError::NativeBackendUnavailable)));
    }

    #[test]
    fn test_null_kind_ignores_native() {
        let native: Box<dyn GraphicsBackend> = Box::new(NullBackend);
        let mut backend =
            select_backend(BackendKind::Null, Some(native), None).expect("null backend");
        assert_eq!(backend.get_error(), GL_NO_ERROR);
    }

    #[test]
    fn test_backend_kind_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            backend: BackendKind,
        }
        let doc: Doc = toml::from_str(r#"backend = "null""#).expect("parse");
        assert_eq!(doc.backend, BackendKind::Null);
    }
}
