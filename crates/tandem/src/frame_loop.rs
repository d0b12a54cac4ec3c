//! # TANDEM Frame Loop
//!
//! One frame, split across two threads:
//! ```text
//! front end                                renderer thread
//! ─────────                                ───────────────
//! front_end_sleep()  ◄── work completed ── renderer_sleep()
//!   build command list                        (idle, context released)
//! wake_renderer(packet) ── commands ──────►
//!   (context released) ◄── renderer active ─  execute commands
//!   next frame's logic                        end_frame()
//! ```
//!
//! The front end never touches the backend; the renderer owns it for the
//! lifetime of the thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};
use tandem_core::{
    HandoffCoordinator, HandoffError, HandoffResult, RenderContext, RenderThread, ThreadSpawner,
};
use tandem_gl::gl::{GLbitfield, GLenum, GLint, GLsizei, GLuint, GL_NO_ERROR, GL_TEXTURE_2D};
use tandem_gl::GraphicsBackend;
use tracing::{debug, info, warn};

/// Target frame time for 60 FPS.
pub const TARGET_FRAME_TIME: Duration = Duration::from_micros(16_666);

/// One recorded GL call.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// `glViewport` and `glScissor` to the same rectangle.
    SetViewport {
        /// Left edge.
        x: GLint,
        /// Bottom edge.
        y: GLint,
        /// Width.
        width: GLsizei,
        /// Height.
        height: GLsizei,
    },
    /// `glClearColor`.
    ClearColor([f32; 4]),
    /// `glClear`.
    Clear(GLbitfield),
    /// `glEnable`.
    Enable(GLenum),
    /// `glDisable`.
    Disable(GLenum),
    /// `glBlendFunc`.
    BlendFunc(GLenum, GLenum),
    /// `glDepthFunc`.
    DepthFunc(GLenum),
    /// `glDepthMask`.
    DepthMask(bool),
    /// `glBindTexture` on `GL_TEXTURE_2D` of a texture unit.
    BindTexture {
        /// Texture unit, `GL_TEXTURE0_ARB + n`.
        unit: GLenum,
        /// Texture name.
        texture: GLuint,
    },
    /// `glDrawElements`.
    DrawElements {
        /// Primitive mode.
        mode: GLenum,
        /// Index type.
        index_type: GLenum,
        /// Number of indices.
        count: GLsizei,
        /// Raw index data.
        indices: Vec<u8>,
    },
    /// Text for the call log.
    Comment(String),
}

impl RenderCommand {
    /// Issues the command on `backend`.
    pub fn execute(&self, backend: &mut dyn GraphicsBackend) {
        match self {
            Self::SetViewport { x, y, width, height } => {
                backend.viewport(*x, *y, *width, *height);
                backend.scissor(*x, *y, *width, *height);
            }
            Self::ClearColor([r, g, b, a]) => backend.clear_color(*r, *g, *b, *a),
            Self::Clear(mask) => backend.clear(*mask),
            Self::Enable(cap) => backend.enable(*cap),
            Self::Disable(cap) => backend.disable(*cap),
            Self::BlendFunc(src, dst) => backend.blend_func(*src, *dst),
            Self::DepthFunc(func) => backend.depth_func(*func),
            Self::DepthMask(flag) => backend.depth_mask(*flag),
            Self::BindTexture { unit, texture } => {
                backend.active_texture(*unit);
                backend.bind_texture(GL_TEXTURE_2D, *texture);
            }
            Self::DrawElements { mode, index_type, count, indices } => {
                backend.draw_elements(*mode, *count, *index_type, indices);
            }
            Self::Comment(text) => backend.log_comment(text),
        }
    }
}

/// What the front end hands the renderer each cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePacket {
    /// Draw a frame.
    Draw {
        /// Frame number.
        frame: u64,
        /// Commands in issue order.
        commands: Vec<RenderCommand>,
    },
    /// Leave the render loop.
    Shutdown,
}

/// Renderer-side totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames drawn.
    pub frames_rendered: u64,
    /// Cycles skipped after a context failure or an empty slot.
    pub frames_skipped: u64,
    /// Commands executed.
    pub commands_executed: u64,
    /// Frames that ended with a GL error pending.
    pub gl_errors: u64,
    /// Last frame number drawn.
    pub last_frame: Option<u64>,
}

/// Runs on the render thread until a [`FramePacket::Shutdown`] arrives.
pub fn render_loop<C: RenderContext>(
    handoff: &HandoffCoordinator<C, FramePacket>,
    backend: &mut dyn GraphicsBackend,
) -> RenderStats {
    let mut stats = RenderStats::default();

    loop {
        match handoff.renderer_sleep() {
            Ok(FramePacket::Draw { frame, commands }) => {
                for command in &commands {
                    command.execute(backend);
                }
                let error = backend.get_error();
                if error != GL_NO_ERROR {
                    warn!(frame, error, "GL error after frame");
                    stats.gl_errors += 1;
                }
                backend.end_frame();

                stats.frames_rendered += 1;
                stats.commands_executed += commands.len() as u64;
                stats.last_frame = Some(frame);
            }
            Ok(FramePacket::Shutdown) => break,
            Err(err @ (HandoffError::ContextBind { .. } | HandoffError::PayloadMissing)) => {
                debug!(error = %err, "skipping frame");
                stats.frames_skipped += 1;
            }
            Err(err) => {
                warn!(error = %err, "render loop stopped");
                break;
            }
        }
    }

    info!(
        frames = stats.frames_rendered,
        skipped = stats.frames_skipped,
        "render loop finished"
    );
    stats
}

// ============================================================================
// FRONT END
// ============================================================================

/// Front-end timing for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Time blocked in `front_end_sleep`, in microseconds.
    pub wait_us: u64,
    /// Time blocked in `wake_renderer`, in microseconds.
    pub wake_us: u64,
    /// Whole submit, in microseconds.
    pub total_us: u64,
    /// Commands posted.
    pub commands: u32,
    /// Context failures reported to the front end this frame.
    pub context_failures: u32,
}

/// Drives the renderer thread from the front end.
pub struct FrameLoop<C: RenderContext + 'static> {
    handoff: Arc<HandoffCoordinator<C, FramePacket>>,
    /// `None` once the thread has been joined.
    renderer: Option<RenderThread>,
    exit: Receiver<RenderStats>,
    frame: u64,
    stats: FrameStatsAccumulator,
}

impl<C: RenderContext + 'static> FrameLoop<C> {
    /// Spawns the renderer thread, which takes ownership of `backend`.
    ///
    /// # Errors
    ///
    /// As [`HandoffCoordinator::spawn_render_thread`].
    pub fn start(
        handoff: Arc<HandoffCoordinator<C, FramePacket>>,
        backend: Box<dyn GraphicsBackend>,
        spawner: &dyn ThreadSpawner,
    ) -> HandoffResult<Self> {
        let (exit_tx, exit) = bounded(1);

        let renderer = handoff.spawn_render_thread(spawner, move |h| {
            let mut backend = backend;
            let stats = render_loop(h, &mut *backend);
            // receiver gone means the front end stopped caring
            let _ = exit_tx.send(stats);
        })?;

        Ok(Self {
            handoff,
            renderer: Some(renderer),
            exit,
            frame: 0,
            stats: FrameStatsAccumulator::new(),
        })
    }

    /// Waits for the renderer, then posts `commands` as the next frame.
    ///
    /// Context failures under the abort policy are counted, not returned:
    /// the rendezvous itself completed and the renderer skips the frame.
    ///
    /// # Errors
    ///
    /// - [`HandoffError::RenderThreadPanicked`] if the render thread died
    ///   since the last frame.
    /// - [`HandoffError::RendererExited`] on every call after that.
    /// - Any other [`HandoffError`] from the rendezvous.
    pub fn submit(&mut self, commands: Vec<RenderCommand>) -> HandoffResult<FrameStats> {
        let start = Instant::now();
        let mut stats = FrameStats {
            frame: self.frame,
            commands: u32::try_from(commands.len()).unwrap_or(u32::MAX),
            ..FrameStats::default()
        };

        let waited = Instant::now();
        tolerate(self.handoff.front_end_sleep(), &mut stats)?;
        stats.wait_us = micros(waited.elapsed());
        if self.handoff.is_terminated() {
            return Err(self.reap());
        }

        let woke = Instant::now();
        let packet = FramePacket::Draw { frame: self.frame, commands };
        tolerate(self.handoff.wake_renderer(packet), &mut stats)?;
        stats.wake_us = micros(woke.elapsed());

        stats.total_us = micros(start.elapsed());
        self.stats.record(stats);
        self.frame += 1;
        Ok(stats)
    }

    /// Number of frames submitted.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Front-end statistics so far.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    /// The shared coordinator.
    #[must_use]
    pub fn handoff(&self) -> &Arc<HandoffCoordinator<C, FramePacket>> {
        &self.handoff
    }

    /// Stops the renderer and returns its totals.
    ///
    /// Re-sends the shutdown packet if the renderer skipped it after a
    /// context failure. The front end holds the context afterwards.
    ///
    /// # Errors
    ///
    /// [`HandoffError::RenderThreadPanicked`] if the render thread panicked,
    /// [`HandoffError::RendererExited`] if it was already reaped by
    /// [`submit`](Self::submit), or any non-context [`HandoffError`] from the
    /// final rendezvous.
    pub fn shutdown(mut self) -> HandoffResult<RenderStats> {
        let mut scratch = FrameStats::default();
        let mut sent = 0_u32;
        loop {
            // returns once the renderer sleeps again or has exited
            tolerate(self.handoff.front_end_sleep(), &mut scratch)?;
            if self.handoff.is_terminated() {
                break;
            }
            if sent > 0 {
                debug!(sent, "renderer skipped shutdown, sending again");
            }
            tolerate(self.handoff.wake_renderer(FramePacket::Shutdown), &mut scratch)?;
            sent += 1;
        }

        let renderer = self.renderer.take().ok_or(HandoffError::RendererExited)?;
        renderer.join()?;
        // the sender is dropped by the time the thread is joined
        let stats = self.exit.try_recv().map_err(|_| HandoffError::RendererExited)?;
        info!(frames = self.frame, "frame loop shut down");
        Ok(stats)
    }

    /// Joins a render thread that exited without being asked to.
    fn reap(&mut self) -> HandoffError {
        match self.renderer.take().map(RenderThread::join) {
            Some(Err(err)) => {
                warn!(error = %err, "render thread died");
                err
            }
            _ => HandoffError::RendererExited,
        }
    }
}

fn tolerate(result: HandoffResult<()>, stats: &mut FrameStats) -> HandoffResult<()> {
    match result {
        Err(HandoffError::ContextBind { op, site, source }) => {
            debug!(%op, site, error = %source, "context failure during frame");
            stats.context_failures += 1;
            Ok(())
        }
        other => other,
    }
}

fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Accumulator for front-end frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total submit times.
    pub total_us_sum: u64,
    /// Sum of time spent waiting for the renderer.
    pub wait_us_sum: u64,
    /// Sum of time spent handing over.
    pub wake_us_sum: u64,
    /// Min submit time.
    pub min_frame_us: u64,
    /// Max submit time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    /// Context failures seen by the front end.
    pub context_failures: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            wait_us_sum: 0,
            wake_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            context_failures: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.wait_us_sum += stats.wait_us;
        self.wake_us_sum += stats.wake_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.context_failures += u64::from(stats.context_failures);

        if stats.total_us > micros(TARGET_FRAME_TIME) {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average submit time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average time blocked on the renderer in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_wait_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.wait_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Prints a summary of the statistics.
    #[allow(clippy::cast_precision_loss)]
    pub fn print_summary(&self) {
        let min = if self.frames_recorded == 0 { 0 } else { self.min_frame_us };
        println!("┌─ FRONT END ──────────────────────────────────────────────────────┐");
        println!("│ Frames Submitted:   {}", self.frames_recorded);
        println!("│ Average Submit:     {:.3} ms", self.avg_frame_ms());
        println!("│ Average Wait:       {:.3} ms", self.avg_wait_ms());
        println!("│ Min / Max Submit:   {:.3} / {:.3} ms", min as f64 / 1000.0, self.max_frame_us as f64 / 1000.0);
        println!("│ Over Budget:        {} frames ({:.1}%)", self.frames_over_budget, self.over_budget_ratio() * 100.0);
        println!("│ Context Failures:   {}", self.context_failures);
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
