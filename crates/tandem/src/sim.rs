//! # Simulation
//!
//! Stand-ins for a real context and GL driver, so the frame loop can run
//! on machines without a GPU.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tandem_core::{ContextError, RenderContext};
use tandem_gl::gl::{
    GLbitfield, GLenum, GLint, GLsizei, GLuint, GL_EXTENSIONS, GL_MAX_TEXTURE_UNITS_ARB,
    GL_NO_ERROR, GL_RENDERER, GL_VENDOR, GL_VERSION,
};
use tandem_gl::GraphicsBackend;

/// Context that records which thread it is current on.
///
/// Binding while another thread still holds it counts as a violation; the
/// handoff must never produce one. Every `fail_every`-th bind can be made to
/// fail to exercise the bind-failure policy.
#[derive(Debug, Default)]
pub struct SimulatedContext {
    owner: Mutex<Option<ThreadId>>,
    binds: AtomicU64,
    failed_binds: AtomicU64,
    violations: AtomicU64,
    fail_every: Option<u64>,
}

impl SimulatedContext {
    /// A context whose binds always succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose every `n`-th bind attempt fails. `0` never fails.
    #[must_use]
    pub fn failing_every(n: u64) -> Self {
        Self {
            fail_every: (n > 0).then_some(n),
            ..Self::default()
        }
    }

    /// Thread the context is current on.
    #[must_use]
    pub fn owner(&self) -> Option<ThreadId> {
        *self.owner.lock()
    }

    /// Bind attempts so far.
    #[must_use]
    pub fn binds(&self) -> u64 {
        self.binds.load(Ordering::Relaxed)
    }

    /// Injected bind failures so far.
    #[must_use]
    pub fn failed_binds(&self) -> u64 {
        self.failed_binds.load(Ordering::Relaxed)
    }

    /// Binds that found the context current on another thread.
    #[must_use]
    pub fn violations(&self) -> u64 {
        self.violations.load(Ordering::Relaxed)
    }
}

impl RenderContext for SimulatedContext {
    fn make_current(&self) -> Result<(), ContextError> {
        let attempt = self.binds.fetch_add(1, Ordering::Relaxed) + 1;
        if self.fail_every.is_some_and(|n| attempt % n == 0) {
            self.failed_binds.fetch_add(1, Ordering::Relaxed);
            return Err(ContextError::MakeCurrent(format!("simulated failure on bind {attempt}")));
        }

        let me = thread::current().id();
        let mut owner = self.owner.lock();
        if (*owner).is_some_and(|holder| holder != me) {
            self.violations.fetch_add(1, Ordering::Relaxed);
        }
        *owner = Some(me);
        Ok(())
    }

    fn release_current(&self) -> Result<(), ContextError> {
        let me = thread::current().id();
        let mut owner = self.owner.lock();
        if *owner == Some(me) {
            *owner = None;
        }
        Ok(())
    }
}

/// Call counts kept by [`SimulatedDriver`].
#[derive(Debug, Default)]
pub struct DriverCounters {
    /// Draw calls.
    pub draws: AtomicU64,
    /// Indices submitted across all draws.
    pub indices: AtomicU64,
    /// State changes (enable, blend, depth, bind...).
    pub state_changes: AtomicU64,
    /// Frames ended.
    pub frames: AtomicU64,
}

/// Driver that accepts every call and counts it.
#[derive(Debug, Clone)]
pub struct SimulatedDriver {
    counters: Arc<DriverCounters>,
}

/// Extension string advertised by [`SimulatedDriver`].
pub const SIMULATED_EXTENSIONS: &str = "GL_ARB_multitexture GL_EXT_texture_env_add \
                                        GL_S3_s3tc GL_EXT_compiled_vertex_array";

impl SimulatedDriver {
    /// A driver with fresh counters.
    #[must_use]
    pub fn new() -> Self {
        Self { counters: Arc::new(DriverCounters::default()) }
    }

    /// Shared handle to the counters, readable after the driver moves.
    #[must_use]
    pub fn counters(&self) -> Arc<DriverCounters> {
        Arc::clone(&self.counters)
    }

    fn state(&self) {
        self.counters.state_changes.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsBackend for SimulatedDriver {
    fn alpha_func(&mut self, _func: GLenum, _reference: f32) {
        self.state();
    }
    fn bind_texture(&mut self, _target: GLenum, _texture: GLuint) {
        self.state();
    }
    fn blend_func(&mut self, _src: GLenum, _dst: GLenum) {
        self.state();
    }
    fn clear(&mut self, _mask: GLbitfield) {}
    fn clear_color(&mut self, _red: f32, _green: f32, _blue: f32, _alpha: f32) {
        self.state();
    }
    fn color_mask(&mut self, _red: bool, _green: bool, _blue: bool, _alpha: bool) {
        self.state();
    }
    fn cull_face(&mut self, _mode: GLenum) {
        self.state();
    }
    fn delete_textures(&mut self, _textures: &[GLuint]) {}
    fn depth_func(&mut self, _func: GLenum) {
        self.state();
    }
    fn depth_mask(&mut self, _flag: bool) {
        self.state();
    }
    fn depth_range(&mut self, _near: f64, _far: f64) {
        self.state();
    }
    fn disable(&mut self, _cap: GLenum) {
        self.state();
    }
    fn enable(&mut self, _cap: GLenum) {
        self.state();
    }

    fn draw_elements(&mut self, _mode: GLenum, count: GLsizei, _index_type: GLenum, _indices: &[u8]) {
        self.counters.draws.fetch_add(1, Ordering::Relaxed);
        self.counters
            .indices
            .fetch_add(u64::try_from(count).unwrap_or(0), Ordering::Relaxed);
    }

    fn finish(&mut self) {}

    fn get_error(&mut self) -> GLenum {
        GL_NO_ERROR
    }

    fn get_integer(&mut self, pname: GLenum) -> GLint {
        match pname {
            GL_MAX_TEXTURE_UNITS_ARB => 4,
            _ => 0,
        }
    }

    fn get_string(&mut self, name: GLenum) -> String {
        match name {
            GL_VENDOR => "TANDEM".to_owned(),
            GL_RENDERER => "Simulated Driver".to_owned(),
            GL_VERSION => "1.3 (simulated)".to_owned(),
            GL_EXTENSIONS => SIMULATED_EXTENSIONS.to_owned(),
            _ => String::new(),
        }
    }

    fn polygon_offset(&mut self, _factor: f32, _units: f32) {
        self.state();
    }
    fn scissor(&mut self, _x: GLint, _y: GLint, _width: GLsizei, _height: GLsizei) {
        self.state();
    }
    fn viewport(&mut self, _x: GLint, _y: GLint, _width: GLsizei, _height: GLsizei) {
        self.state();
    }
    fn active_texture(&mut self, _texture: GLenum) {
        self.state();
    }
    fn client_active_texture(&mut self, _texture: GLenum) {
        self.state();
    }

    fn end_frame(&mut self) {
        self.counters.frames.fetch_add(1, Ordering::Relaxed);
    }
}

/// Entry point lookup that resolves every name.
#[must_use]
pub fn resolve_all(_name: &str) -> bool {
    true
}
