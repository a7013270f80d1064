//! Outcome of one polling invocation

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Exit code recorded when the process did not exit normally
/// (timeout, launch failure, or terminated by a signal)
pub const ABNORMAL_EXIT_CODE: i32 = -1;

/// One record per external command execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub test_id: String,
    /// When the invocation started
    pub timestamp: DateTime<Local>,
    /// Wall-clock seconds from launch to return (or timeout)
    pub duration: f64,
    #[serde(rename = "return_code")]
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl InvocationResult {
    /// Process ran and exited; success is derived from the exit code
    pub fn completed(
        test_id: impl Into<String>,
        timestamp: DateTime<Local>,
        duration: f64,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            test_id: test_id.into(),
            timestamp,
            duration,
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            success: exit_code == 0,
        }
    }

    /// Process did not exit normally; `message` becomes the stderr text
    pub fn abnormal(
        test_id: impl Into<String>,
        timestamp: DateTime<Local>,
        duration: f64,
        message: impl Into<String>,
    ) -> Self {
        Self::completed(
            test_id,
            timestamp,
            duration,
            ABNORMAL_EXIT_CODE,
            String::new(),
            message,
        )
    }

    /// Key used in the error-frequency table
    ///
    /// The stderr text verbatim, or `Return code: <n>` when stderr is empty.
    pub fn error_key(&self) -> String {
        if self.stderr.is_empty() {
            format!("Return code: {}", self.exit_code)
        } else {
            self.stderr.clone()
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.success {
            "SUCCESS"
        } else {
            "FAILED"
        }
    }
}
