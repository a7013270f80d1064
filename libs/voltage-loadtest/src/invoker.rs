//! Launches the polling command once and captures its outcome
//!
//! Every outcome (normal exit, timeout, launch failure) is folded into an
//! [`InvocationResult`]; nothing is returned as an error.

use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Local;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::RunConfiguration;
use crate::result::{InvocationResult, ABNORMAL_EXIT_CODE};

/// stderr text recorded when an invocation exceeds its timeout
pub const TIMEOUT_MARKER: &str = "Command timed out";

/// Executes one invocation labeled with `test_id`
///
/// The label is only recorded; it never changes what is executed.
#[async_trait]
pub trait Invoke: Send + Sync {
    async fn execute(&self, test_id: &str) -> InvocationResult;
}

/// Runs a fixed argument vector as a child process
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    program: String,
    args: Arc<[String]>,
    timeout: Duration,
}

impl ProcessInvoker {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: args.into(),
            timeout,
        }
    }

    /// Build the invoker for the `mbpoll` command described by `config`
    pub fn from_config(config: &RunConfiguration) -> Self {
        Self::new(config.program.clone(), config.args(), config.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Invoke for ProcessInvoker {
    async fn execute(&self, test_id: &str) -> InvocationResult {
        let started_at = Local::now();

        let mut command = Command::new(&self.program);
        command
            .args(self.args.iter())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let start = Instant::now();
        // Dropping the output future on timeout kills the child (kill_on_drop)
        let outcome = tokio::time::timeout(self.timeout, command.output()).await;
        let duration = start.elapsed().as_secs_f64();

        match outcome {
            Ok(Ok(output)) => {
                // No code means the process was terminated by a signal
                let exit_code = output.status.code().unwrap_or(ABNORMAL_EXIT_CODE);
                debug!(
                    test_id,
                    exit_code,
                    duration_ms = (duration * 1000.0) as u64,
                    "Invocation finished"
                );
                InvocationResult::completed(
                    test_id,
                    started_at,
                    duration,
                    exit_code,
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr),
                )
            },
            Ok(Err(e)) => {
                warn!(test_id, "Failed to run {}: {}", self.program, e);
                InvocationResult::abnormal(test_id, started_at, duration, e.to_string())
            },
            Err(_) => {
                warn!(
                    test_id,
                    "{} timed out after {:.3}s", self.program, self.timeout.as_secs_f64()
                );
                InvocationResult::abnormal(test_id, started_at, duration, TIMEOUT_MARKER)
            },
        }
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(10);

    fn shell(script: &str, timeout: Duration) -> ProcessInvoker {
        ProcessInvoker::new("sh", vec!["-c".to_string(), script.to_string()], timeout)
    }

    #[tokio::test]
    async fn test_successful_invocation() {
        let invoker = shell("printf 'registers ok'", DEFAULT_TEST_TIMEOUT);
        let result = invoker.execute("sequential_test_1").await;

        assert_eq!(result.test_id, "sequential_test_1");
        assert_eq!(result.exit_code, 0);
        assert!(result.success);
        assert_eq!(result.stdout, "registers ok");
        assert!(result.stderr.is_empty());
        assert!(result.duration >= 0.0);
    }

    #[tokio::test]
    async fn test_failed_invocation_captures_stderr() {
        let invoker = shell("printf boom >&2; exit 1", DEFAULT_TEST_TIMEOUT);
        let result = invoker.execute("thread_1_test_1").await;

        assert_eq!(result.exit_code, 1);
        assert!(!result.success);
        assert_eq!(result.stderr, "boom");
    }

    #[tokio::test]
    #[traced_test]
    async fn test_timeout_is_normalized() {
        let timeout = Duration::from_millis(200);
        let invoker = shell("sleep 5", timeout);
        let result = invoker.execute("slow").await;

        assert_eq!(result.exit_code, ABNORMAL_EXIT_CODE);
        assert!(!result.success);
        assert_eq!(result.stderr, TIMEOUT_MARKER);
        assert!(result.stdout.is_empty());
        assert!(result.duration >= timeout.as_secs_f64());
        assert!(result.duration < 5.0);
        assert!(logs_contain("timed out"));
    }

    #[tokio::test]
    async fn test_launch_failure_is_normalized() {
        let invoker = ProcessInvoker::new(
            "/nonexistent/mbpoll-binary",
            vec!["-1".to_string()],
            DEFAULT_TEST_TIMEOUT,
        );
        let result = invoker.execute("missing").await;

        assert_eq!(result.exit_code, ABNORMAL_EXIT_CODE);
        assert!(!result.success);
        assert!(!result.stderr.is_empty());
        assert_ne!(result.stderr, TIMEOUT_MARKER);
    }

    #[tokio::test]
    async fn test_signal_termination_records_sentinel() {
        let invoker = shell("kill -9 $$", DEFAULT_TEST_TIMEOUT);
        let result = invoker.execute("killed").await;

        assert_eq!(result.exit_code, ABNORMAL_EXIT_CODE);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_from_config_passes_arguments() {
        let config = RunConfiguration {
            program: "echo".to_string(),
            verbose: false,
            ..Default::default()
        };
        let invoker = ProcessInvoker::from_config(&config);
        let result = invoker.execute("echo").await;

        assert!(result.success);
        assert_eq!(
            result.stdout.trim_end(),
            "-t 4 -1 -0 -p 502 -a 201 -r 40070 -c 59 gplugk.local"
        );
    }
}
