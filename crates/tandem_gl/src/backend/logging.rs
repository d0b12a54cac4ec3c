//! # Call Logging
//!
//! Wraps a backend and writes one text line per GL call before forwarding
//! it. Logging runs for a fixed number of frames, then closes the log and
//! the wrapper becomes a plain pass-through.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use super::names::{blend_name, bool_name, cap_name, clear_bits, func_name, prim_name, type_name};
use super::GraphicsBackend;
use crate::error::PlatformResult;
use crate::gl::{GLbitfield, GLenum, GLint, GLsizei, GLuint, GL_BACK, GL_FRONT, GL_FRONT_AND_BACK};

/// Last line written before the log is closed.
pub const CLOSING_LINE: &str = "*** CLOSING LOG ***";

/// Where calls are logged and for how many frames.
pub struct LogTarget {
    sink: Box<dyn Write + Send>,
    frames: u32,
}

impl LogTarget {
    /// Logs to `sink` for `frames` frames.
    #[must_use]
    pub fn new(sink: Box<dyn Write + Send>, frames: u32) -> Self {
        Self { sink, frames }
    }

    /// Creates (truncating) the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::LogSink`](crate::PlatformError::LogSink) if
    /// the file cannot be created.
    pub fn file(path: impl AsRef<Path>, frames: u32) -> PlatformResult<Self> {
        let file = File::create(path.as_ref())?;
        info!(path = %path.as_ref().display(), frames, "gl call log opened");
        Ok(Self::new(Box::new(BufWriter::new(file)), frames))
    }
}

impl fmt::Debug for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogTarget").field("frames", &self.frames).finish_non_exhaustive()
    }
}

/// Backend that logs every call, then forwards it to `B`.
pub struct LoggingBackend<B> {
    inner: B,
    /// `None` once the log is closed.
    sink: Option<Box<dyn Write + Send>>,
    frames_remaining: u32,
}

impl<B: GraphicsBackend> LoggingBackend<B> {
    /// Wraps `inner` and writes the log header.
    ///
    /// A target with zero frames never opens the log.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::LogSink`](crate::PlatformError::LogSink) if
    /// the header cannot be written.
    pub fn new(inner: B, target: LogTarget) -> PlatformResult<Self> {
        let LogTarget { mut sink, frames } = target;
        if frames == 0 {
            return Ok(Self { inner, sink: None, frames_remaining: 0 });
        }

        let opened = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        writeln!(sink, "*** OPENING LOG at {opened} (unix) ***")?;

        Ok(Self { inner, sink: Some(sink), frames_remaining: frames })
    }

    /// Returns whether calls are still being logged.
    #[must_use]
    pub fn is_logging(&self) -> bool {
        self.sink.is_some()
    }

    /// Frames left before the log closes.
    #[must_use]
    pub fn frames_remaining(&self) -> u32 {
        self.frames_remaining
    }

    /// The wrapped backend.
    #[must_use]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// The wrapped backend, mutably.
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let result = sink.write_fmt(args).and_then(|()| sink.write_all(b"\n"));
        if let Err(err) = result {
            warn!(error = %err, "gl log write failed, logging stopped");
            self.sink = None;
        }
    }

    fn close(&mut self) {
        let Some(mut sink) = self.sink.take() else {
            return;
        };
        self.frames_remaining = 0;
        let result = writeln!(sink, "{CLOSING_LINE}").and_then(|()| sink.flush());
        match result {
            Ok(()) => info!("gl call log closed"),
            Err(err) => warn!(error = %err, "gl log could not be closed cleanly"),
        }
    }
}

fn face_name(mode: GLenum) -> std::borrow::Cow<'static, str> {
    match mode {
        GL_FRONT => "GL_FRONT".into(),
        GL_BACK => "GL_BACK".into(),
        GL_FRONT_AND_BACK => "GL_FRONT_AND_BACK".into(),
        other => format!("0x{other:x}").into(),
    }
}

impl<B: GraphicsBackend> GraphicsBackend for LoggingBackend<B> {
    fn alpha_func(&mut self, func: GLenum, reference: f32) {
        self.line(format_args!("glAlphaFunc( 0x{func:x}, {reference:.6} )"));
        self.inner.alpha_func(func, reference);
    }

    fn bind_texture(&mut self, target: GLenum, texture: GLuint) {
        self.line(format_args!("glBindTexture( 0x{target:x}, {texture} )"));
        self.inner.bind_texture(target, texture);
    }

    fn blend_func(&mut self, src: GLenum, dst: GLenum) {
        self.line(format_args!("glBlendFunc( {}, {} )", blend_name(src), blend_name(dst)));
        self.inner.blend_func(src, dst);
    }

    fn clear(&mut self, mask: GLbitfield) {
        self.line(format_args!("glClear( 0x{mask:x} = {} )", clear_bits(mask)));
        self.inner.clear(mask);
    }

    fn clear_color(&mut self, red: f32, green: f32, blue: f32, alpha: f32) {
        self.line(format_args!("glClearColor"));
        self.inner.clear_color(red, green, blue, alpha);
    }

    fn color_mask(&mut self, red: bool, green: bool, blue: bool, alpha: bool) {
        self.line(format_args!("glColorMask"));
        self.inner.color_mask(red, green, blue, alpha);
    }

    fn cull_face(&mut self, mode: GLenum) {
        self.line(format_args!("glCullFace( {} )", face_name(mode)));
        self.inner.cull_face(mode);
    }

    fn delete_textures(&mut self, textures: &[GLuint]) {
        self.line(format_args!("glDeleteTextures"));
        self.inner.delete_textures(textures);
    }

    fn depth_func(&mut self, func: GLenum) {
        self.line(format_args!("glDepthFunc( {} )", func_name(func)));
        self.inner.depth_func(func);
    }

    fn depth_mask(&mut self, flag: bool) {
        self.line(format_args!("glDepthMask( {} )", bool_name(flag)));
        self.inner.depth_mask(flag);
    }

    fn depth_range(&mut self, near: f64, far: f64) {
        self.line(format_args!("glDepthRange( {near:.6}, {far:.6} )"));
        self.inner.depth_range(near, far);
    }

    fn disable(&mut self, cap: GLenum) {
        self.line(format_args!("glDisable( {} )", cap_name(cap)));
        self.inner.disable(cap);
    }

    fn enable(&mut self, cap: GLenum) {
        self.line(format_args!("glEnable( {} )", cap_name(cap)));
        self.inner.enable(cap);
    }

    fn draw_elements(&mut self, mode: GLenum, count: GLsizei, index_type: GLenum, indices: &[u8]) {
        self.line(format_args!(
            "glDrawElements( {}, {count}, {}, MEM )",
            prim_name(mode),
            type_name(index_type)
        ));
        self.inner.draw_elements(mode, count, index_type, indices);
    }

    fn finish(&mut self) {
        self.line(format_args!("glFinish"));
        self.inner.finish();
    }

    fn get_error(&mut self) -> GLenum {
        self.line(format_args!("glGetError"));
        self.inner.get_error()
    }

    fn get_integer(&mut self, pname: GLenum) -> GLint {
        self.line(format_args!("glGetIntegerv"));
        self.inner.get_integer(pname)
    }

    fn get_string(&mut self, name: GLenum) -> String {
        self.line(format_args!("glGetString"));
        self.inner.get_string(name)
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.line(format_args!("glPolygonOffset"));
        self.inner.polygon_offset(factor, units);
    }

    fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.line(format_args!("glScissor( {x}, {y}, {width}, {height} )"));
        self.inner.scissor(x, y, width, height);
    }

    fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.line(format_args!("glViewport( {x}, {y}, {width}, {height} )"));
        self.inner.viewport(x, y, width, height);
    }

    fn active_texture(&mut self, texture: GLenum) {
        self.line(format_args!("glActiveTextureARB( 0x{texture:x} )"));
        self.inner.active_texture(texture);
    }

    fn client_active_texture(&mut self, texture: GLenum) {
        self.line(format_args!("glClientActiveTextureARB( 0x{texture:x} )"));
        self.inner.client_active_texture(texture);
    }

    fn end_frame(&mut self) {
        if self.sink.is_some() {
            self.frames_remaining = self.frames_remaining.saturating_sub(1);
            if self.frames_remaining == 0 {
                self.close();
            }
        }
        self.inner.end_frame();
    }

    fn log_comment(&mut self, comment: &str) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(err) = sink.write_all(comment.as_bytes()) {
                warn!(error = %err, "gl log write failed, logging stopped");
                self.sink = None;
            }
        }
        self.inner.log_comment(comment);
    }
}

impl<B> Drop for LoggingBackend<B> {
    fn drop(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            let _ = writeln!(sink, "{CLOSING_LINE}").and_then(|()| sink.flush());
        }
    }
}

impl<B: fmt::Debug> fmt::Debug for LoggingBackend<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingBackend")
            .field("inner", &self.inner)
            .field("logging", &self.sink.is_some())
            .field("frames_remaining", &self.frames_remaining)
            .finish()
    }
}
