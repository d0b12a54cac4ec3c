//! # Render Thread
//!
//! Thread creation goes through [`ThreadSpawner`] so the coordinator never
//! calls the OS directly. Production uses [`OsThreadSpawner`]; tests swap in
//! spawners that fail on demand.

use std::any::Any;
use std::io;
use std::thread::{self, JoinHandle, ThreadId};

use crate::error::{HandoffError, HandoffResult};

/// Entry point handed to a spawner.
pub type ThreadEntry = Box<dyn FnOnce() + Send + 'static>;

/// Starts OS threads.
pub trait ThreadSpawner {
    /// Starts a thread running `entry`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be created. `entry` must
    /// not have run in that case.
    fn spawn(
        &self,
        name: &str,
        stack_size: Option<usize>,
        entry: ThreadEntry,
    ) -> io::Result<JoinHandle<()>>;
}

/// Spawner backed by `std::thread::Builder`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsThreadSpawner;

impl ThreadSpawner for OsThreadSpawner {
    fn spawn(
        &self,
        name: &str,
        stack_size: Option<usize>,
        entry: ThreadEntry,
    ) -> io::Result<JoinHandle<()>> {
        let mut builder = thread::Builder::new().name(name.to_owned());
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }
        builder.spawn(entry)
    }
}

/// Handle to the running render thread.
///
/// Dropping the handle detaches the thread; it keeps running until its work
/// function returns or the process exits.
#[derive(Debug)]
pub struct RenderThread {
    handle: JoinHandle<()>,
}

impl RenderThread {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Returns the OS thread name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.handle.thread().name()
    }

    /// Returns the thread id.
    #[must_use]
    pub fn id(&self) -> ThreadId {
        self.handle.thread().id()
    }

    /// Returns whether the work function has returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the work function to return.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::RenderThreadPanicked`] if it panicked.
    pub fn join(self) -> HandoffResult<()> {
        self.handle
            .join()
            .map_err(|payload| HandoffError::RenderThreadPanicked(panic_message(&*payload)))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_spawner_names_thread() {
        let handle = OsThreadSpawner
            .spawn(
                "tandem-test",
                Some(256 * 1024),
                Box::new(|| {
                    assert_eq!(thread::current().name(), Some("tandem-test"));
                }),
            )
            .expect("spawn");

        let thread = RenderThread::new(handle);
        assert_eq!(thread.name(), Some("tandem-test"));
        thread.join().expect("join");
    }

    #[test]
    fn test_join_reports_panic_message() {
        let handle = OsThreadSpawner
            .spawn("tandem-panic", None, Box::new(|| panic!("lost device")))
            .expect("spawn");

        let err = RenderThread::new(handle).join().unwrap_err();
        match err {
            HandoffError::RenderThreadPanicked(msg) => assert_eq!(msg, "lost device"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
