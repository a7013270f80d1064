//! Run configuration and the derived `mbpoll` command line

use std::time::Duration;

use errors::{LoadTestError, Result};
use serde::{Deserialize, Serialize};

/// Hard limit for a single polling invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_PROGRAM: &str = "mbpoll";
pub const DEFAULT_HOST: &str = "gplugk.local";
pub const DEFAULT_PORT: u16 = 502;
pub const DEFAULT_SLAVE_ID: u8 = 201;
pub const DEFAULT_REGISTER: u32 = 40070;
pub const DEFAULT_COUNT: u16 = 59;

/// Immutable description of what every invocation in a run executes
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    /// Polling executable (path or name resolved through PATH)
    pub program: String,
    pub host: String,
    pub port: u16,
    /// Modbus unit / slave address
    pub slave_id: u8,
    /// Starting register
    pub register: u32,
    /// Number of registers to read
    pub count: u16,
    /// Pass `-v` to the polling tool
    pub verbose: bool,
    pub timeout: Duration,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            slave_id: DEFAULT_SLAVE_ID,
            register: DEFAULT_REGISTER,
            count: DEFAULT_COUNT,
            verbose: true,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RunConfiguration {
    /// Reject values that would make every invocation meaningless
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(LoadTestError::invalid_parameter(
                "program",
                "must not be empty",
            ));
        }
        if self.host.trim().is_empty() {
            return Err(LoadTestError::invalid_parameter("host", "must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(LoadTestError::invalid_parameter(
                "timeout",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Arguments passed to the polling program (program name excluded)
    ///
    /// `-t 4` selects input registers, `-1` a single poll, `-0` Modbus/TCP.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(14);
        if self.verbose {
            args.push("-v".to_string());
        }
        args.extend([
            "-t".to_string(),
            "4".to_string(),
            "-1".to_string(),
            "-0".to_string(),
            "-p".to_string(),
            self.port.to_string(),
            "-a".to_string(),
            self.slave_id.to_string(),
            "-r".to_string(),
            self.register.to_string(),
            "-c".to_string(),
            self.count.to_string(),
            self.host.clone(),
        ]);
        args
    }

    /// Full argument vector including the program
    pub fn command_line(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(15);
        argv.push(self.program.clone());
        argv.extend(self.args());
        argv
    }

    /// Space-joined command line, as echoed in reports
    pub fn command_string(&self) -> String {
        self.command_line().join(" ")
    }

    pub fn test_parameters(&self) -> TestParameters {
        TestParameters {
            host: self.host.clone(),
            port: self.port,
            slave_id: self.slave_id,
            register: self.register,
            count: self.count,
        }
    }
}

/// Target parameters echoed into reports and saved documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestParameters {
    pub host: String,
    pub port: u16,
    pub slave_id: u8,
    pub register: u32,
    pub count: u16,
}
