//! # Frame Loop Tests
//!
//! Runs the full front end / renderer loop on real threads with the
//! simulated context and driver.
//!
//! Run with: cargo test -p tandem --test frame_loop

use std::io;
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::bounded;

use tandem::core::{
    BindFailurePolicy, HandoffConfig, HandoffCoordinator, HandoffError, OsThreadSpawner,
    ThreadEntry, ThreadSpawner,
};
use tandem::gl::gl::{
    GLbitfield, GLenum, GLint, GLsizei, GLuint, GL_COLOR_BUFFER_BIT, GL_NO_ERROR, GL_TRIANGLES,
    GL_UNSIGNED_SHORT,
};
use tandem::gl::{GraphicsBackend, NullBackend};
use tandem::{FrameLoop, FramePacket, RenderCommand, SimulatedContext, SimulatedDriver};

fn frame_commands(frame: u64) -> Vec<RenderCommand> {
    vec![
        RenderCommand::Comment(format!("frame {frame}\n")),
        RenderCommand::Clear(GL_COLOR_BUFFER_BIT),
        RenderCommand::DrawElements {
            mode: GL_TRIANGLES,
            index_type: GL_UNSIGNED_SHORT,
            count: 3,
            indices: vec![0, 0, 1, 0, 2, 0],
        },
    ]
}

fn config(policy: BindFailurePolicy) -> HandoffConfig {
    HandoffConfig {
        bind_failure_policy: policy,
        ..HandoffConfig::default()
    }
}

#[test]
fn test_every_frame_rendered_in_order() {
    const FRAMES: u64 = 50;

    let driver = SimulatedDriver::new();
    let counters = driver.counters();
    let handoff = HandoffCoordinator::with_default_config(SimulatedContext::new());

    let mut frame_loop =
        FrameLoop::start(handoff.clone(), Box::new(driver), &OsThreadSpawner).expect("start");
    for frame in 0..FRAMES {
        let stats = frame_loop.submit(frame_commands(frame)).expect("submit");
        assert_eq!(stats.frame, frame);
        assert_eq!(stats.commands, 3);
    }
    let render = frame_loop.shutdown().expect("shutdown");

    assert_eq!(render.frames_rendered, FRAMES);
    assert_eq!(render.frames_skipped, 0);
    assert_eq!(render.commands_executed, FRAMES * 3);
    assert_eq!(render.last_frame, Some(FRAMES - 1));
    assert_eq!(counters.draws.load(Ordering::Relaxed), FRAMES);
    assert_eq!(counters.frames.load(Ordering::Relaxed), FRAMES);

    assert_eq!(handoff.context().violations(), 0);
    assert_eq!(handoff.stats().handoffs, FRAMES + 1);
    assert!(handoff.is_terminated());
    // the front end takes the context back for teardown
    assert_eq!(handoff.context().owner(), Some(thread::current().id()));
}

#[test]
fn test_abort_policy_skips_frames_without_deadlock() {
    const FRAMES: u64 = 40;

    let handoff = HandoffCoordinator::new(
        SimulatedContext::failing_every(5),
        config(BindFailurePolicy::AbortCycle),
    )
    .expect("coordinator");

    let mut frame_loop =
        FrameLoop::start(handoff.clone(), Box::new(NullBackend), &OsThreadSpawner).expect("start");
    for frame in 0..FRAMES {
        frame_loop.submit(frame_commands(frame)).expect("submit");
    }
    let front_end_failures = frame_loop.stats().context_failures;
    let render = frame_loop.shutdown().expect("shutdown");
    let sync = handoff.stats();

    assert!(render.frames_skipped > 0);
    assert!(front_end_failures > 0);
    assert!(render.frames_rendered < FRAMES);
    // every renderer wake either drew, skipped, or was the shutdown
    assert_eq!(sync.handoffs, render.frames_rendered + render.frames_skipped + 1);
    assert_eq!(sync.aborted_cycles, sync.bind_failures);
    assert_eq!(handoff.context().violations(), 0);
}

#[test]
fn test_continue_policy_renders_through_failures() {
    const FRAMES: u64 = 30;

    let handoff = HandoffCoordinator::new(
        SimulatedContext::failing_every(4),
        config(BindFailurePolicy::Continue),
    )
    .expect("coordinator");

    let mut frame_loop =
        FrameLoop::start(handoff.clone(), Box::new(NullBackend), &OsThreadSpawner).expect("start");
    for frame in 0..FRAMES {
        frame_loop.submit(frame_commands(frame)).expect("submit");
    }
    assert_eq!(frame_loop.stats().context_failures, 0);
    let render = frame_loop.shutdown().expect("shutdown");

    assert_eq!(render.frames_rendered, FRAMES);
    assert_eq!(render.frames_skipped, 0);
    assert!(handoff.stats().bind_failures > 0);
    assert_eq!(handoff.stats().aborted_cycles, 0);
}

/// Bind attempts alternate front end, renderer, starting with the front
/// end. With four frames the renderer's bind for the shutdown packet is
/// attempt 10, which fails, so shutdown has to send the packet again.
#[test]
fn test_shutdown_resends_skipped_packet() {
    let handoff = HandoffCoordinator::new(
        SimulatedContext::failing_every(10),
        config(BindFailurePolicy::AbortCycle),
    )
    .expect("coordinator");

    let mut frame_loop =
        FrameLoop::start(handoff.clone(), Box::new(NullBackend), &OsThreadSpawner).expect("start");
    for frame in 0..4 {
        frame_loop.submit(frame_commands(frame)).expect("submit");
    }
    let render = frame_loop.shutdown().expect("shutdown");

    assert_eq!(render.frames_rendered, 4);
    assert_eq!(render.frames_skipped, 1);
    assert_eq!(handoff.context().failed_binds(), 1);
    assert_eq!(handoff.stats().handoffs, 6);
}

struct RefusingSpawner;

impl ThreadSpawner for RefusingSpawner {
    fn spawn(
        &self,
        _name: &str,
        _stack_size: Option<usize>,
        _entry: ThreadEntry,
    ) -> io::Result<JoinHandle<()>> {
        Err(io::Error::new(io::ErrorKind::OutOfMemory, "no threads left"))
    }
}

#[test]
fn test_start_reports_spawn_failure() {
    let handoff = HandoffCoordinator::<_, FramePacket>::with_default_config(SimulatedContext::new());

    let err = FrameLoop::start(handoff.clone(), Box::new(NullBackend), &RefusingSpawner)
        .err()
        .expect("spawn must fail");

    assert!(matches!(err, HandoffError::ThreadCreation(_)));
    assert!(!handoff.is_spawned());
}

// ============================================================================
// RENDER THREAD FAILURE
// ============================================================================

/// Backend whose `glClear` panics, as a lost device would.
struct LostDevice;

impl GraphicsBackend for LostDevice {
    fn alpha_func(&mut self, _func: GLenum, _reference: f32) {}
    fn bind_texture(&mut self, _target: GLenum, _texture: GLuint) {}
    fn blend_func(&mut self, _src: GLenum, _dst: GLenum) {}
    fn clear(&mut self, _mask: GLbitfield) {
        panic!("device lost");
    }
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

/// Runs `body` on its own thread and fails the test if it does not finish.
fn within_deadline<R: Send + 'static>(body: impl FnOnce() -> R + Send + 'static) -> R {
    let (done_tx, done_rx) = bounded(1);
    thread::spawn(move || {
        let _ = done_tx.send(body());
    });
    done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("frame loop hung after render thread died")
}

#[test]
fn test_shutdown_reports_render_thread_panic() {
    let handoff = HandoffCoordinator::with_default_config(SimulatedContext::new());
    let mut frame_loop =
        FrameLoop::start(handoff.clone(), Box::new(LostDevice), &OsThreadSpawner).expect("start");
    frame_loop
        .submit(vec![RenderCommand::Clear(GL_COLOR_BUFFER_BIT)])
        .expect("submit");

    let result = within_deadline(move || frame_loop.shutdown());

    match result {
        Err(HandoffError::RenderThreadPanicked(msg)) => assert_eq!(msg, "device lost"),
        other => panic!("unexpected shutdown result: {other:?}"),
    }
    assert!(handoff.is_terminated());
}

#[test]
fn test_submit_after_render_thread_panic_fails() {
    let handoff = HandoffCoordinator::with_default_config(SimulatedContext::new());
    let mut frame_loop =
        FrameLoop::start(handoff, Box::new(LostDevice), &OsThreadSpawner).expect("start");
    frame_loop
        .submit(vec![RenderCommand::Clear(GL_COLOR_BUFFER_BIT)])
        .expect("submit");

    let (first, second, shutdown) = within_deadline(move || {
        let first = frame_loop.submit(frame_commands(1)).map(|_| ());
        let second = frame_loop.submit(frame_commands(2)).map(|_| ());
        (first, second, frame_loop.shutdown().map(|_| ()))
    });

    assert!(matches!(first, Err(HandoffError::RenderThreadPanicked(_))));
    assert!(matches!(second, Err(HandoffError::RendererExited)));
    assert!(matches!(shutdown, Err(HandoffError::RendererExited)));
}
