//! # taskloop
//!
//! A single-worker background task runner: closures are queued with
//! [`TaskRunner::submit`] and drained in FIFO order by one background thread,
//! under explicit `start` / `stop` / `clear` control.
//!
//! ## Quick Start
//!
//! ```rust
//! use taskloop::TaskRunner;
//!
//! let runner = TaskRunner::new();
//! for i in 0..5 {
//!     runner.submit(move || println!("{i}"));
//! }
//! runner.start()?;
//! runner.join()?;
//! # Ok::<(), taskloop::RunnerError>(())
//! ```
//!
//! The crate also ships [`list::SinglyLinkedList`], a small owned-node list.

pub mod background;
pub mod list;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use background::{
    FailurePolicy, RunnerConfig, RunnerError, RunnerState, RunnerStats, Task, TaskRunner,
};
pub use list::SinglyLinkedList;
