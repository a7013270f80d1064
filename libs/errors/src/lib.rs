//! Unified error handling for the mbload workspace
//!
//! Invocation-level failures of the polling command never reach this type:
//! they are recorded as failed results. `LoadTestError` covers everything
//! that has to stop the harness before or after a run (bad arguments,
//! unreadable config, unwritable output).

use thiserror::Error;

// ============================================================================
// LoadTestError - Main error type
// ============================================================================

/// Main error type for the harness
#[derive(Debug, Error)]
pub enum LoadTestError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid parameter: {param}: {reason}")]
    InvalidParameter { param: String, reason: String },

    // ======================================
    // File & I/O Errors
    // ======================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ======================================
    // Runtime Errors
    // ======================================
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Result type alias using LoadTestError
pub type Result<T> = std::result::Result<T, LoadTestError>;

impl LoadTestError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Stable identifier used in log lines
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidParameter { .. } => "INVALID_PARAMETER",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Logging(_) => "LOGGING_ERROR",
        }
    }

    /// Process exit code for the CLI
    ///
    /// Usage mistakes map to 2 (the clap convention), everything else to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::InvalidParameter { .. } => 2,
            _ => 1,
        }
    }
}

// Conversion traits for common error types
impl From<serde_json::Error> for LoadTestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::LoadTestError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::LoadTestError::Configuration(format!($fmt, $($arg)*))
    };
}
