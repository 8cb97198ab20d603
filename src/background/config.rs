//! Runner configuration.
//!
//! [`RunnerConfig`] can be built in code with the builder-style setters, or
//! deserialized from whatever format the embedding application already uses
//! for its settings (every field has a default).

use serde::{Deserialize, Serialize};

/// Default name given to the worker thread.
pub const DEFAULT_THREAD_NAME: &str = "taskloop-worker";

/// What the worker does after a task panics.
///
/// The panic is always caught, logged and counted in
/// [`RunnerStats::failed`](super::RunnerStats::failed); the policy only
/// decides whether draining goes on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop draining and return to idle. Tasks still queued stay queued and
    /// run on the next [`start`](super::TaskRunner::start).
    #[default]
    Halt,
    /// Move on to the next queued task.
    Continue,
}

/// Configuration for a [`TaskRunner`](super::TaskRunner).
///
/// # Examples
///
/// ```
/// use taskloop::background::{FailurePolicy, RunnerConfig};
///
/// let config = RunnerConfig::new()
///     .thread_name("audio-jobs")
///     .failure_policy(FailurePolicy::Continue);
/// assert_eq!(config.thread_name, "audio-jobs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Name of the worker thread, shown in panics and debuggers.
    pub thread_name: String,
    /// Stack size for the worker thread in bytes. `None` uses the platform default.
    pub stack_size: Option<usize>,
    pub failure_policy: FailurePolicy,
}

impl RunnerConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker thread name.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the worker thread stack size in bytes.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Sets the policy applied when a task panics.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
        assert_eq!(config.stack_size, None);
        assert_eq!(config.failure_policy, FailurePolicy::Halt);
    }

    #[test]
    fn builder_setters() {
        let config = RunnerConfig::new()
            .thread_name("jobs")
            .stack_size(256 * 1024)
            .failure_policy(FailurePolicy::Continue);
        assert_eq!(config.thread_name, "jobs");
        assert_eq!(config.stack_size, Some(256 * 1024));
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
    }

    #[test]
    fn deserialize_partial_json_fills_defaults() {
        let config: RunnerConfig =
            serde_json::from_str(r#"{ "failure_policy": "continue" }"#).unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.thread_name, DEFAULT_THREAD_NAME);
        assert_eq!(config.stack_size, None);
    }

    #[test]
    fn deserialize_rejects_unknown_policy() {
        let result = serde_json::from_str::<RunnerConfig>(r#"{ "failure_policy": "retry" }"#);
        assert!(result.is_err());
    }
}
