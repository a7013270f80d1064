//! Harness configuration: defaults < config file < MBLOAD_* env < CLI flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use errors::{LoadTestError, Result};
use serde::{Deserialize, Serialize};
use voltage_loadtest::config::{
    DEFAULT_COUNT, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_PROGRAM, DEFAULT_REGISTER,
    DEFAULT_SLAVE_ID,
};
use voltage_loadtest::{RunConfiguration, RunPlan, DEFAULT_TIMEOUT};

pub const ENV_PREFIX: &str = "MBLOAD_";

/// Flat view of every setting, as it appears in a config file
///
/// ```yaml
/// host: 192.168.1.20
/// threads: 4
/// tests_per_thread: 25
/// delay: 0.5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub program: String,
    pub host: String,
    pub port: u16,
    pub slave_id: u8,
    pub register: u32,
    pub count: u16,
    pub threads: usize,
    pub tests_per_thread: usize,
    /// Switches to sequential mode when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequential_tests: Option<usize>,
    /// Seconds between consecutive invocations of one worker
    pub delay: f64,
    /// Drop `-v` from the mbpoll command line
    pub quiet: bool,
    /// Per-invocation timeout in seconds
    pub timeout: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            slave_id: DEFAULT_SLAVE_ID,
            register: DEFAULT_REGISTER,
            count: DEFAULT_COUNT,
            threads: 1,
            tests_per_thread: 1,
            sequential_tests: None,
            delay: 0.0,
            quiet: false,
            timeout: DEFAULT_TIMEOUT.as_secs_f64(),
            output: None,
        }
    }
}

/// Values given explicitly on the command line; unset fields leave lower layers alone
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slave_id: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub register: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests_per_thread: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequential_tests: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiet: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl HarnessConfig {
    /// Resolve all layers using the `MBLOAD_` environment prefix
    pub fn load(file: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        Self::load_with_prefix(file, ENV_PREFIX, overrides)
    }

    fn load_with_prefix(
        file: Option<&Path>,
        env_prefix: &str,
        overrides: &CliOverrides,
    ) -> Result<Self> {
        let config: Self =
            common::load_layered(&Self::default(), file, env_prefix, overrides)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(LoadTestError::invalid_parameter(
                "threads",
                "must be at least 1",
            ));
        }
        if self.sequential_tests == Some(0) {
            return Err(LoadTestError::invalid_parameter(
                "sequential_tests",
                "must be at least 1 (omit it for a concurrent run)",
            ));
        }
        self.delay()?;
        self.timeout()?;
        Ok(())
    }

    pub fn delay(&self) -> Result<Duration> {
        seconds("delay", self.delay)
    }

    pub fn timeout(&self) -> Result<Duration> {
        let timeout = seconds("timeout", self.timeout)?;
        if timeout.is_zero() {
            return Err(LoadTestError::invalid_parameter(
                "timeout",
                "must be greater than zero",
            ));
        }
        Ok(timeout)
    }

    /// Sequential mode whenever `sequential_tests` is set
    pub fn plan(&self) -> RunPlan {
        match self.sequential_tests {
            Some(num_tests) => RunPlan::Sequential { num_tests },
            None => RunPlan::Concurrent {
                num_threads: self.threads,
                tests_per_thread: self.tests_per_thread,
            },
        }
    }

    pub fn run_configuration(&self) -> Result<RunConfiguration> {
        let config = RunConfiguration {
            program: self.program.clone(),
            host: self.host.clone(),
            port: self.port,
            slave_id: self.slave_id,
            register: self.register,
            count: self.count,
            verbose: !self.quiet,
            timeout: self.timeout()?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn seconds(param: &str, value: f64) -> Result<Duration> {
    if value < 0.0 {
        return Err(LoadTestError::invalid_parameter(param, "must not be negative"));
    }
    Duration::try_from_secs_f64(value)
        .map_err(|e| LoadTestError::invalid_parameter(param, e.to_string()))
}
