use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use framerelay_core::{FramebufferSink, MediaSource, TargetGeometry};
use tracing::{debug, error, info};

use crate::cancel::CancelToken;
use crate::decode::FfmpegRunner;
use crate::runner::{CaptureRunner, RunContext};

// MARK: - SessionState

/// Observable lifecycle state of the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Capturing,
    /// Cancellation requested, worker not yet joined.
    Stopping,
}

// MARK: - ClientAction

/// Verdict returned to the display server's new-client hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAction {
    Accept,
    Reject,
}

/// Reference count before the first client ever connects. Normalized to
/// zero on first connect so the count reflects live clients thereafter.
const NEVER_CONNECTED: i64 = -1;

struct SessionInner {
    /// Join handle of the spawned worker, present while a join is owed.
    worker: Option<thread::JoinHandle<()>>,
    /// Live-client count, `NEVER_CONNECTED` until the first connect.
    clients: i64,
}

// MARK: - CaptureSession

/// Lifecycle state machine controlling the decode worker.
///
/// Exactly one session exists per process. `start` and `stop` are idempotent
/// and safe to call from the display server's hook threads; `stop` blocks
/// until the worker has fully exited, so no publish can land after it
/// returns.
pub struct CaptureSession {
    source: MediaSource,
    target: TargetGeometry,
    sink: Arc<dyn FramebufferSink>,
    runner: Arc<dyn CaptureRunner>,
    cancel: CancelToken,
    /// Set for the whole time the worker body runs; cleared by the worker
    /// itself on exit, which is how an early self-exit is detected.
    active: Arc<AtomicBool>,
    /// Signalled (under its own mutex) every time `active` is cleared.
    idle: Arc<(Mutex<()>, Condvar)>,
    inner: Mutex<SessionInner>,
}

impl CaptureSession {
    pub fn new(source: MediaSource, target: TargetGeometry, sink: Arc<dyn FramebufferSink>) -> Self {
        Self::with_runner(source, target, sink, Arc::new(FfmpegRunner))
    }

    /// Build a session around a custom worker body. Production code uses
    /// [`new`](Self::new); lifecycle tests script the runner.
    pub fn with_runner(
        source: MediaSource,
        target: TargetGeometry,
        sink: Arc<dyn FramebufferSink>,
        runner: Arc<dyn CaptureRunner>,
    ) -> Self {
        Self {
            source,
            target,
            sink,
            runner,
            cancel: CancelToken::new(),
            active: Arc::new(AtomicBool::new(false)),
            idle: Arc::new((Mutex::new(()), Condvar::new())),
            inner: Mutex::new(SessionInner { worker: None, clients: NEVER_CONNECTED }),
        }
    }

    /// Spawn the decode worker. Returns `true` if a new worker was spawned,
    /// `false` if one is already running.
    pub fn start(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();

        if let Some(handle) = inner.worker.take() {
            if self.active.load(Ordering::SeqCst) {
                debug!("already capturing");
                inner.worker = Some(handle);
                return false;
            }
            // Previous worker exited on its own (end of stream or error);
            // reap it before spawning the next one.
            if handle.join().is_err() {
                error!("previous capture worker panicked");
            }
        }

        self.cancel.clear();
        self.active.store(true, Ordering::SeqCst);

        let ctx = RunContext {
            source: self.source.clone(),
            target: self.target,
            cancel: self.cancel.clone(),
            sink: Arc::clone(&self.sink),
        };
        let runner = Arc::clone(&self.runner);
        let active = Arc::clone(&self.active);
        let idle = Arc::clone(&self.idle);

        let spawned = thread::Builder::new()
            .name("framerelay-capture".to_string())
            .spawn(move || {
                match runner.run(ctx) {
                    Ok(stats) => info!(frames = stats.frames_published, "capture run finished"),
                    Err(e) => error!("capture run failed: {e}"),
                }
                active.store(false, Ordering::SeqCst);
                let (lock, exited) = &*idle;
                let _held = lock.lock().unwrap();
                exited.notify_all();
            });

        match spawned {
            Ok(handle) => {
                inner.worker = Some(handle);
                true
            }
            Err(e) => {
                error!("failed to spawn capture worker: {e}");
                self.active.store(false, Ordering::SeqCst);
                let (lock, exited) = &*self.idle;
                let _held = lock.lock().unwrap();
                exited.notify_all();
                false
            }
        }
    }

    /// Request cancellation and, if a join is owed, block until the worker
    /// has exited. Calling with no worker owed is a no-op. Returns `true`
    /// on success, the no-op case included.
    pub fn stop(&self) -> bool {
        let handle = {
            let mut inner = self.inner.lock().unwrap();
            let Some(handle) = inner.worker.take() else {
                return true;
            };
            // The token is touched only once a join is owed; a connect
            // racing with this stop keeps its freshly spawned worker.
            self.cancel.cancel();
            handle
        };

        if !self.active.load(Ordering::SeqCst) {
            // Worker hit end-of-stream (or failed) before stop was asked
            // for; the join below is still owed and returns immediately.
            debug!("capture worker exited early");
        }
        if handle.join().is_err() {
            error!("capture worker panicked");
        }
        true
    }

    pub fn state(&self) -> SessionState {
        if !self.active.load(Ordering::SeqCst) {
            SessionState::Idle
        } else if self.cancel.is_cancelled() {
            SessionState::Stopping
        } else {
            SessionState::Capturing
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Block until the worker body has exited (end of stream, error, or
    /// cancellation). Returns immediately when nothing is running. Does not
    /// request cancellation and does not reap the join handle.
    pub fn wait_until_idle(&self) {
        let (lock, exited) = &*self.idle;
        let mut held = lock.lock().unwrap();
        // The worker clears `active` before it notifies, so checking the
        // flag under the lock cannot miss the wakeup.
        while self.active.load(Ordering::SeqCst) {
            held = exited.wait(held).unwrap();
        }
    }

    /// Live-client count as the display server sees it (0 before the first
    /// connect).
    pub fn client_count(&self) -> u64 {
        let inner = self.inner.lock().unwrap();
        inner.clients.max(0) as u64
    }

    /// New-client hook: bump the reference count and make sure the worker
    /// runs.
    pub fn client_connected(&self) -> ClientAction {
        let count = {
            let mut inner = self.inner.lock().unwrap();
            if inner.clients < 0 {
                inner.clients = 0;
            }
            inner.clients += 1;
            inner.clients
        };
        debug!(clients = count, "client connected");
        self.start();
        ClientAction::Accept
    }

    /// Client-gone hook: drop the reference count; at zero, stop the worker
    /// and tell the caller to shut the display server down.
    ///
    /// Returns `true` when the last client left.
    pub fn client_disconnected(&self) -> bool {
        let (count, was_live) = {
            let mut inner = self.inner.lock().unwrap();
            let was_live = inner.clients > 0;
            // A disconnect in the never-connected state is clamped, like
            // the first connect normalizes the sentinel.
            inner.clients = (inner.clients - 1).max(0);
            (inner.clients, was_live)
        };
        debug!(clients = count, "client disconnected");

        if was_live && count == 0 {
            self.stop();
            return true;
        }
        false
    }
}
