//! Background task runner: a FIFO queue of closures drained by one worker thread.
//!
//! [`TaskRunner`] owns a queue of deferred tasks and at most one background
//! worker. The worker pops tasks from the front of the queue and runs them one
//! at a time until the queue is empty or a stop has been requested, then
//! returns. It never parks waiting for new work: after it goes idle, another
//! call to [`TaskRunner::start`] is needed to drain tasks submitted since.
//!
//! ```text
//!            start()                      queue empty / stop flag
//!   Idle ─────────────────▶ Running ─────────────────────────────▶ Idle
//!                           │    ▲      (checked between tasks)
//!                           └────┘
//!                          start() is a no-op
//! ```
//!
//! Stop and clear are cooperative: a task that is already executing always
//! runs to completion.
//!
//! The queue is a mutex-guarded `VecDeque` rather than a channel: `clear` has
//! to empty it in place and `len` has to read it, which a channel receiver
//! owned by the worker cannot offer.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use taskloop::background::TaskRunner;
//!
//! let runner = TaskRunner::new();
//! let log = Arc::new(Mutex::new(Vec::new()));
//!
//! for i in 0..3 {
//!     let log = Arc::clone(&log);
//!     runner.submit(move || log.lock().unwrap().push(i));
//! }
//!
//! runner.start().unwrap();
//! runner.join().unwrap();
//! assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

pub mod config;

pub use config::{FailurePolicy, RunnerConfig};

/// A deferred unit of work: called once, with no arguments and no result.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Errors produced by the task runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// [`TaskRunner::join`] was called by a task, i.e. from the worker thread
    /// itself. Waiting there would never return.
    #[error("cannot join the worker from inside one of its own tasks")]
    JoinFromWorker,

    #[error("worker thread panicked: {0}")]
    WorkerPanicked(String),
}

/// Whether a background worker is currently draining the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerState {
    Idle,
    Running,
}

impl RunnerState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for RunnerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time counters for a [`TaskRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunnerStats {
    /// Tasks that ran to completion.
    pub executed: u64,
    /// Tasks that panicked.
    pub failed: u64,
    /// Tasks waiting in the queue.
    pub pending: usize,
    pub state: RunnerState,
}

// Everything guarded by the queue lock. `running` flips to false in the same
// critical section where the worker observes an empty queue, so a `start()`
// racing with a worker's exit can never strand a submitted task.
struct Queue {
    tasks: VecDeque<Task>,
    running: bool,
    // A popped task is executing outside the lock.
    in_flight: bool,
    worker: Option<ThreadId>,
}

// State shared between the runner handle and its worker thread.
struct Shared {
    queue: Mutex<Queue>,
    // Signalled whenever `in_flight` goes back to false.
    settled: Condvar,
    // Signalled whenever `running` goes back to false.
    idle: Condvar,
    stop: AtomicBool,
    state: watch::Sender<RunnerState>,
    executed: AtomicU64,
    failed: AtomicU64,
    policy: FailurePolicy,
}

impl Shared {
    // Tasks never run under this lock, so a poisoned guard still holds a
    // consistent queue.
    fn lock_queue(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A single-worker task queue.
///
/// Tasks are executed strictly in submission order, each at most once, on a
/// dedicated background thread. At most one worker is alive at any time no
/// matter how often [`start`](Self::start) is called.
///
/// Dropping the runner blocks until a launched worker has returned. Drop does
/// not request a stop: call [`stop`](Self::stop) or [`clear`](Self::clear)
/// first to abandon the remaining queue.
pub struct TaskRunner {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    config: RunnerConfig,
}

impl TaskRunner {
    /// Creates an idle runner with an empty queue and the default configuration.
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    /// Creates an idle runner with an empty queue.
    pub fn with_config(config: RunnerConfig) -> Self {
        let (state, _) = watch::channel(RunnerState::Idle);
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                running: false,
                in_flight: false,
                worker: None,
            }),
            settled: Condvar::new(),
            idle: Condvar::new(),
            stop: AtomicBool::new(false),
            state,
            executed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            policy: config.failure_policy,
        });
        Self {
            shared,
            worker: Mutex::new(None),
            config,
        }
    }

    /// Returns the configuration this runner was built with.
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Appends a task to the back of the queue.
    ///
    /// May be called at any time, including from inside a running task. A task
    /// submitted while the worker is active is picked up by that worker unless
    /// it has already seen the queue empty; otherwise it waits for the next
    /// [`start`](Self::start).
    pub fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut queue = self.shared.lock_queue();
        queue.tasks.push_back(Box::new(task));
        trace!(pending = queue.tasks.len(), "task submitted");
    }

    /// Launches the background worker if none is active.
    ///
    /// Always resets the stop flag first, so an earlier [`stop`](Self::stop)
    /// does not abort this run. When a worker is already draining, this only
    /// clears the stop flag.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Spawn`] if the OS refuses to create the worker
    /// thread. The runner stays idle and the queue is untouched.
    pub fn start(&self) -> Result<(), RunnerError> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        {
            let mut queue = self.shared.lock_queue();
            self.shared.stop.store(false, Ordering::Release);
            if queue.running {
                debug!("worker already running");
                return Ok(());
            }
            queue.running = true;
            self.shared.state.send_replace(RunnerState::Running);
        }

        // The previous worker has already marked itself idle and is on its
        // way out; reap it before replacing the handle.
        if let Some(previous) = slot.take() {
            if let Err(payload) = previous.join() {
                warn!(panic = %panic_message(&*payload), "previous worker panicked");
            }
        }

        let mut builder = thread::Builder::new().name(self.config.thread_name.clone());
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        let shared = Arc::clone(&self.shared);
        match builder.spawn(move || drain(&shared)) {
            Ok(handle) => {
                info!(thread = %self.config.thread_name, "worker started");
                *slot = Some(handle);
                Ok(())
            }
            Err(e) => {
                let mut queue = self.shared.lock_queue();
                queue.running = false;
                self.shared.state.send_replace(RunnerState::Idle);
                self.shared.idle.notify_all();
                error!(error = %e, "failed to spawn worker thread");
                Err(RunnerError::Spawn(e))
            }
        }
    }

    /// Asks the worker to stop before its next task.
    ///
    /// Returns immediately. A task that is executing runs to completion; no
    /// further task begins until the next [`start`](Self::start). Queued tasks
    /// are kept. Calling this while idle only sets the flag, which `start`
    /// resets.
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::Release);
        debug!("stop requested");
    }

    /// Requests a stop and discards every task that has not started yet.
    ///
    /// If a task is executing, this waits for it to finish before emptying the
    /// queue, so when `clear` returns nothing is running and nothing is queued
    /// (unless another thread submits concurrently). Called from inside a task,
    /// it does not wait for that task.
    ///
    /// Returns the number of discarded tasks.
    pub fn clear(&self) -> usize {
        let mut queue = self.shared.lock_queue();
        self.shared.stop.store(true, Ordering::Release);

        let on_worker = queue.worker == Some(thread::current().id());
        if !on_worker {
            queue = self
                .shared
                .settled
                .wait_while(queue, |q| q.in_flight)
                .unwrap_or_else(PoisonError::into_inner);
        }

        let discarded = mem::take(&mut queue.tasks);
        drop(queue);

        // Dropped outside the lock: a task's captures may submit from their
        // destructors.
        let count = discarded.len();
        drop(discarded);
        info!(discarded = count, "queue cleared");
        count
    }

    /// Blocks until the current worker (if any) has finished draining.
    ///
    /// Does not request a stop; the worker finishes draining first. Any number
    /// of threads may join at once: one of them reaps the worker thread, the
    /// others wait until it has gone idle.
    ///
    /// # Errors
    ///
    /// - [`RunnerError::JoinFromWorker`] when called from inside a task.
    /// - [`RunnerError::WorkerPanicked`] if the worker thread itself panicked.
    pub fn join(&self) -> Result<(), RunnerError> {
        if self.shared.lock_queue().worker == Some(thread::current().id()) {
            return Err(RunnerError::JoinFromWorker);
        }

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match handle {
            Some(handle) => handle
                .join()
                .map_err(|payload| RunnerError::WorkerPanicked(panic_message(&*payload))),
            // Another joiner holds the handle; wait for its worker to go idle.
            None => {
                let queue = self.shared.lock_queue();
                let _queue = self
                    .shared
                    .idle
                    .wait_while(queue, |q| q.running)
                    .unwrap_or_else(PoisonError::into_inner);
                Ok(())
            }
        }
    }

    /// Waits until no worker is draining the queue.
    ///
    /// Resolves immediately when the runner is idle. Unlike [`join`](Self::join)
    /// this does not block a thread, but the worker thread may still be
    /// unwinding its last few instructions when it resolves.
    ///
    /// Only the latest state is observed. If another thread calls
    /// [`start`](Self::start) right after the worker goes idle, the brief idle
    /// period can be missed and this waits for the next drain to finish.
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|state| *state == RunnerState::Idle).await;
    }

    /// Subscribes to [`RunnerState`] transitions.
    pub fn subscribe(&self) -> watch::Receiver<RunnerState> {
        self.shared.state.subscribe()
    }

    /// Returns whether a worker is currently draining the queue.
    pub fn state(&self) -> RunnerState {
        if self.shared.lock_queue().running {
            RunnerState::Running
        } else {
            RunnerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunnerState::Running
    }

    /// Number of tasks waiting in the queue (excluding one that is executing).
    pub fn len(&self) -> usize {
        self.shared.lock_queue().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> RunnerStats {
        let queue = self.shared.lock_queue();
        RunnerStats {
            executed: self.shared.executed.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
            pending: queue.tasks.len(),
            state: if queue.running {
                RunnerState::Running
            } else {
                RunnerState::Idle
            },
        }
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        let slot = self.worker.get_mut().unwrap_or_else(PoisonError::into_inner);
        let Some(handle) = slot.take() else {
            return;
        };

        // Only reachable when a task owns the last handle to its own runner.
        if handle.thread().id() == thread::current().id() {
            warn!("runner dropped on its own worker thread; detaching");
            return;
        }

        debug!("waiting for worker before teardown");
        if let Err(payload) = handle.join() {
            error!(panic = %panic_message(&*payload), "worker thread panicked");
        }
    }
}

/// Body of the worker thread.
///
/// The stop flag and the queue are checked under the lock at the top of every
/// iteration; the task itself runs with the lock released.
fn drain(shared: &Shared) {
    let mut queue = shared.lock_queue();
    queue.worker = Some(thread::current().id());

    loop {
        if shared.stop.load(Ordering::Acquire) {
            debug!(pending = queue.tasks.len(), "worker observed stop request");
            break;
        }
        let Some(task) = queue.tasks.pop_front() else {
            break;
        };
        queue.in_flight = true;
        drop(queue);

        let outcome = panic::catch_unwind(AssertUnwindSafe(task));

        queue = shared.lock_queue();
        queue.in_flight = false;
        shared.settled.notify_all();

        match outcome {
            Ok(()) => {
                shared.executed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                shared.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    panic = %panic_message(&*payload),
                    policy = ?shared.policy,
                    "task panicked"
                );
                if shared.policy == FailurePolicy::Halt {
                    break;
                }
            }
        }
    }

    queue.running = false;
    queue.worker = None;
    shared.state.send_replace(RunnerState::Idle);
    shared.idle.notify_all();
    debug!(
        executed = shared.executed.load(Ordering::Relaxed),
        pending = queue.tasks.len(),
        "worker idle"
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
