//! Queue five tasks, clear them, queue five more and let the worker drain them.
//!
//! Run with:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example event_loop
//! ```
//!
//! Prints 5 through 9; the first batch never runs.

use std::thread;
use std::time::Duration;

use taskloop::{RunnerError, TaskRunner};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), RunnerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let runner = TaskRunner::new();

    for i in 0..5 {
        runner.submit(move || println!("{i}"));
    }
    runner.clear();

    for i in 5..10 {
        runner.submit(move || println!("{i}"));
    }
    runner.start()?;

    thread::sleep(Duration::from_millis(100));
    runner.stop();

    // Dropping the runner joins the worker.
    Ok(())
}
