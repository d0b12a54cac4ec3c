//! # Context Handoff Coordinator
//!
//! Hands one rendering context and one payload back and forth between the
//! front end (game logic) and the renderer thread.
//!
//! ## State Machine
//!
//! ```text
//!  state  commands  completed  active   meaning
//!  ─────  ────────  ─────────  ──────   ─────────────────────────────────
//!   S0       0          0        0      renderer idle, context unbound
//!   S1       1          0        0      payload posted, renderer not resumed
//!   S2       0          0        1      renderer owns context, working
//!   S3       0          1        0      renderer done, waiting for commands
//! ```
//!
//! ## Frame Timeline
//!
//! ```text
//!  FRONT END                                   RENDERER
//!  ─────────                                   ────────
//!  front_end_sleep()  ◄── work_completed ───   renderer_sleep()
//!    bind context                                unbind context
//!  ... build frame N+1 ...                       ... blocked ...
//!  wake_renderer(p)
//!    store p, unbind   ── commands_pending ──►   bind context, take p
//!    ... blocked ...   ◄── renderer_active ───   return p
//!  ... simulate ...                            ... draw frame N+1 ...
//! ```
//!
//! ## Rules
//!
//! 1. Exactly one front end and one renderer.
//! 2. Calls strictly alternate. Two `wake_renderer` calls without an
//!    intervening `renderer_sleep` are a protocol violation: the second
//!    payload overwrites the first.
//! 3. Every wait is infinite. A hang in one party hangs the other. When the
//!    render thread's work function ends, by returning or unwinding, both
//!    front-end waits are released and [`HandoffCoordinator::is_terminated`]
//!    reports it.
//! 4. A failed bind or unbind never skips a signal, so it cannot deadlock the
//!    rendezvous. [`BindFailurePolicy`] decides whether it is reported.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use crate::config::{BindFailurePolicy, HandoffConfig};
use crate::context::RenderContext;
use crate::error::{ContextError, ContextOp, HandoffError, HandoffResult};
use crate::sync::event::ManualResetEvent;
use crate::thread::{RenderThread, ThreadSpawner};

/// Observable phase of the handoff, derived from the three signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffPhase {
    /// S0: nothing signalled.
    Idle,
    /// S1: payload posted, renderer not resumed yet.
    CommandsPosted,
    /// S2: renderer owns the context.
    RendererActive,
    /// S3: renderer finished its slice and waits for commands.
    WorkCompleted,
    /// Any other combination, only seen mid-transition.
    Transitional,
}

/// Snapshot of the three handoff signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandoffState {
    /// Front end posted commands.
    pub commands_pending: bool,
    /// Renderer finished its slice.
    pub work_completed: bool,
    /// Renderer owns the context.
    pub renderer_active: bool,
}

impl HandoffState {
    /// Maps the signals onto the state table.
    #[must_use]
    pub const fn phase(self) -> HandoffPhase {
        match (self.commands_pending, self.work_completed, self.renderer_active) {
            (false, false, false) => HandoffPhase::Idle,
            (true, false, false) => HandoffPhase::CommandsPosted,
            (false, false, true) => HandoffPhase::RendererActive,
            (false, true, false) => HandoffPhase::WorkCompleted,
            _ => HandoffPhase::Transitional,
        }
    }

    /// Returns whether any signal is set.
    #[must_use]
    pub const fn any_signaled(self) -> bool {
        self.commands_pending || self.work_completed || self.renderer_active
    }
}

/// Handoff statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandoffStats {
    /// Times the renderer resumed from `renderer_sleep`.
    pub handoffs: u64,
    /// Failed context binds.
    pub bind_failures: u64,
    /// Failed context unbinds.
    pub unbind_failures: u64,
    /// Operations that returned an error under [`BindFailurePolicy::AbortCycle`].
    pub aborted_cycles: u64,
}

impl HandoffStats {
    /// Total failed context operations.
    #[must_use]
    pub const fn context_failures(&self) -> u64 {
        self.bind_failures + self.unbind_failures
    }
}

#[derive(Debug, Default)]
struct HandoffCounters {
    handoffs: AtomicU64,
    bind_failures: AtomicU64,
    unbind_failures: AtomicU64,
    aborted_cycles: AtomicU64,
}

/// Mediates exclusive ownership of one rendering context between the front
/// end and the renderer thread.
///
/// ## Usage
///
/// ```rust,ignore
/// let handoff = HandoffCoordinator::new(context, HandoffConfig::default())?;
///
/// let renderer = handoff.spawn_render_thread(&OsThreadSpawner, |handoff| loop {
///     match handoff.renderer_sleep() {
///         Ok(Some(frame)) => draw(frame),
///         Ok(None) => break,
///         Err(_) => continue, // cycle aborted, sleep again
///     }
/// })?;
///
/// // Front end, once per frame
/// handoff.front_end_sleep()?;
/// let frame = build_frame();
/// handoff.wake_renderer(Some(frame))?;
/// ```
pub struct HandoffCoordinator<C, T> {
    context: C,
    /// Front end posted a payload.
    commands_pending: ManualResetEvent,
    /// Renderer released the context and waits for commands.
    work_completed: ManualResetEvent,
    /// Renderer bound the context and took the payload.
    renderer_active: ManualResetEvent,
    /// Single payload slot. Written by the front end, taken by the renderer.
    payload: Mutex<Option<T>>,
    config: HandoffConfig,
    spawned: AtomicBool,
    terminated: AtomicBool,
    counters: HandoffCounters,
}

impl<C: RenderContext, T: Send> HandoffCoordinator<C, T> {
    /// Creates a coordinator in state S0.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Config`] if `config` does not validate.
    pub fn new(context: C, config: HandoffConfig) -> HandoffResult<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self::build(context, config)))
    }

    /// Creates a coordinator with [`HandoffConfig::default`].
    #[must_use]
    pub fn with_default_config(context: C) -> Arc<Self> {
        Arc::new(Self::build(context, HandoffConfig::default()))
    }

    fn build(context: C, config: HandoffConfig) -> Self {
        Self {
            context,
            commands_pending: ManualResetEvent::new(false),
            work_completed: ManualResetEvent::new(false),
            renderer_active: ManualResetEvent::new(false),
            payload: Mutex::new(None),
            config,
            spawned: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            counters: HandoffCounters::default(),
        }
    }

    /// Starts the renderer thread running `work`.
    ///
    /// `work` receives the coordinator and is expected to loop on
    /// [`renderer_sleep`](Self::renderer_sleep). When it returns (or unwinds)
    /// the context is released once more and the front end's waits return
    /// immediately from then on.
    ///
    /// # Errors
    ///
    /// - [`HandoffError::AlreadySpawned`] if a render thread is running.
    /// - [`HandoffError::ThreadCreation`] if the spawner fails. No signal is
    ///   touched and a later retry is allowed.
    pub fn spawn_render_thread<F>(
        self: &Arc<Self>,
        spawner: &dyn ThreadSpawner,
        work: F,
    ) -> HandoffResult<RenderThread>
    where
        F: FnOnce(&Self) + Send + 'static,
        C: 'static,
        T: 'static,
    {
        if self.spawned.swap(true, Ordering::AcqRel) {
            return Err(HandoffError::AlreadySpawned);
        }

        let coordinator = Arc::clone(self);
        let entry = Box::new(move || {
            let _exit = RendererExitGuard {
                coordinator: &coordinator,
            };
            work(&coordinator);
        });

        match spawner.spawn(&self.config.thread_name, self.config.stack_size, entry) {
            Ok(handle) => {
                let thread = RenderThread::new(handle);
                info!(
                    thread = %self.config.thread_name,
                    id = ?thread.id(),
                    "render thread spawned"
                );
                Ok(thread)
            }
            Err(err) => {
                self.spawned.store(false, Ordering::Release);
                warn!(thread = %self.config.thread_name, error = %err, "render thread creation failed");
                Err(HandoffError::ThreadCreation(err))
            }
        }
    }

    /// Renderer: releases the context and blocks until the front end posts
    /// the next payload.
    ///
    /// Always re-binds the context before returning, so the renderer owns it
    /// for the whole slice up to its next call.
    ///
    /// # Errors
    ///
    /// - [`HandoffError::ContextBind`] under [`BindFailurePolicy::AbortCycle`]
    ///   if the unbind or re-bind failed. The payload stays in the slot; skip
    ///   the frame and call `renderer_sleep` again.
    /// - [`HandoffError::PayloadMissing`] if the slot was empty on wake.
    pub fn renderer_sleep(&self) -> HandoffResult<T> {
        let unbind = self.observe(ContextOp::Unbind, "renderer_sleep", self.context.release_current());

        self.renderer_active.clear();

        // after this, the front end can leave front_end_sleep
        self.work_completed.signal();
        trace!("renderer idle, waiting for commands");

        self.commands_pending.wait();

        let bind = self.observe(ContextOp::Bind, "renderer_sleep", self.context.make_current());

        self.work_completed.clear();
        self.commands_pending.clear();

        let failure = unbind.or(bind);
        let payload = if failure.is_some() && self.aborts() {
            None
        } else {
            self.payload.lock().take()
        };

        let handoff = self.counters.handoffs.fetch_add(1, Ordering::Relaxed) + 1;

        // after this, the front end can leave wake_renderer
        self.renderer_active.signal();
        debug!(handoff, "renderer resumed");

        self.conclude(failure)?;
        payload.ok_or(HandoffError::PayloadMissing)
    }

    /// Front end: blocks until the renderer finishes its slice, then binds the
    /// context to the calling thread.
    ///
    /// # Errors
    ///
    /// [`HandoffError::ContextBind`] under [`BindFailurePolicy::AbortCycle`]
    /// if the bind failed.
    pub fn front_end_sleep(&self) -> HandoffResult<()> {
        trace!("front end waiting for renderer");
        self.work_completed.wait();

        let bind = self.observe(ContextOp::Bind, "front_end_sleep", self.context.make_current());
        self.conclude(bind)
    }

    /// Front end: posts `payload`, releases the context and blocks until the
    /// renderer has taken ownership.
    ///
    /// # Errors
    ///
    /// [`HandoffError::ContextBind`] under [`BindFailurePolicy::AbortCycle`]
    /// if the unbind failed. The renderer was still released.
    pub fn wake_renderer(&self, payload: T) -> HandoffResult<()> {
        {
            let mut slot = self.payload.lock();
            if slot.is_some() {
                warn!("payload slot still full, previous payload overwritten");
            }
            *slot = Some(payload);
        }

        let unbind = self.observe(ContextOp::Unbind, "wake_renderer", self.context.release_current());

        // after this, the renderer can continue through renderer_sleep
        self.commands_pending.signal();
        trace!("front end waiting for renderer to take the context");

        self.renderer_active.wait();
        self.conclude(unbind)
    }

    /// Returns a snapshot of the three signals.
    #[must_use]
    pub fn state(&self) -> HandoffState {
        HandoffState {
            commands_pending: self.commands_pending.is_signaled(),
            work_completed: self.work_completed.is_signaled(),
            renderer_active: self.renderer_active.is_signaled(),
        }
    }

    /// Returns the handoff statistics.
    #[must_use]
    pub fn stats(&self) -> HandoffStats {
        HandoffStats {
            handoffs: self.counters.handoffs.load(Ordering::Relaxed),
            bind_failures: self.counters.bind_failures.load(Ordering::Relaxed),
            unbind_failures: self.counters.unbind_failures.load(Ordering::Relaxed),
            aborted_cycles: self.counters.aborted_cycles.load(Ordering::Relaxed),
        }
    }

    /// Returns the managed context.
    #[must_use]
    pub fn context(&self) -> &C {
        &self.context
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &HandoffConfig {
        &self.config
    }

    /// Returns whether a render thread has been started.
    #[must_use]
    pub fn is_spawned(&self) -> bool {
        self.spawned.load(Ordering::Acquire)
    }

    /// Returns whether the render thread's work function has returned.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    #[inline]
    fn aborts(&self) -> bool {
        self.config.bind_failure_policy == BindFailurePolicy::AbortCycle
    }

    /// Counts and logs a context failure. Returns it as an error for later.
    fn observe(
        &self,
        op: ContextOp,
        site: &'static str,
        result: Result<(), ContextError>,
    ) -> Option<HandoffError> {
        let source = result.err()?;
        let counter = match op {
            ContextOp::Bind => &self.counters.bind_failures,
            ContextOp::Unbind => &self.counters.unbind_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        warn!(%op, site, error = %source, "context operation failed");
        Some(HandoffError::ContextBind { op, site, source })
    }

    /// Applies the bind failure policy once the signals have been sent.
    fn conclude(&self, failure: Option<HandoffError>) -> HandoffResult<()> {
        match failure {
            Some(err) if self.aborts() => {
                self.counters.aborted_cycles.fetch_add(1, Ordering::Relaxed);
                Err(err)
            }
            _ => Ok(()),
        }
    }
}

impl<C, T> std::fmt::Debug for HandoffCoordinator<C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffCoordinator")
            .field("commands_pending", &self.commands_pending.is_signaled())
            .field("work_completed", &self.work_completed.is_signaled())
            .field("renderer_active", &self.renderer_active.is_signaled())
            .field("config", &self.config)
            .field("spawned", &self.spawned.load(Ordering::Relaxed))
            .field("terminated", &self.terminated.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Runs the terminal transition when the render thread's work function ends,
/// including by unwinding.
struct RendererExitGuard<'a, C: RenderContext, T: Send> {
    coordinator: &'a HandoffCoordinator<C, T>,
}

impl<C: RenderContext, T: Send> Drop for RendererExitGuard<'_, C, T> {
    fn drop(&mut self) {
        let coordinator = self.coordinator;
        // unbind the context before the thread dies
        let _ = coordinator.observe(
            ContextOp::Unbind,
            "render_thread_exit",
            coordinator.context.release_current(),
        );
        coordinator.terminated.store(true, Ordering::Release);
        // release a front end blocked in front_end_sleep or wake_renderer
        coordinator.work_completed.signal();
        coordinator.renderer_active.signal();
        info!(
            handoffs = coordinator.counters.handoffs.load(Ordering::Relaxed),
            "render thread exited"
        );
    }
}
