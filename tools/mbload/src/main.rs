//! mbload - load-test the mbpoll Modbus polling command
//!
//! Launches mbpoll repeatedly (sequentially, or from several concurrent
//! workers), prints per-invocation progress and a summary report, and can
//! save every result to a JSON file.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use common::{init_logging, LoggingOptions};
use errors::LoadTestError;
use tracing::{debug, error};
use voltage_loadtest::{print_report, save_results, ProcessInvoker, Scheduler};

use crate::config::{CliOverrides, HarnessConfig};

#[derive(Parser, Debug)]
#[command(name = "mbload")]
#[command(about = "Load test the mbpoll Modbus command")]
#[command(long_about = "Load test the mbpoll Modbus command

Settings are resolved in order: built-in defaults, --config file,
MBLOAD_* environment variables, then command-line flags.

Examples:
  mbload --threads 4 --tests-per-thread 25        # 100 polls from 4 workers
  mbload --sequential-tests 10 --delay 0.5        # 10 polls, 0.5s apart
  mbload --host 192.168.1.20 --output run.json    # save every result")]
#[command(version)]
struct Cli {
    /// Target host (default: gplugk.local)
    #[arg(long)]
    host: Option<String>,

    /// Port number (default: 502)
    #[arg(long)]
    port: Option<u16>,

    /// Slave ID (default: 201)
    #[arg(long)]
    slave_id: Option<u8>,

    /// Register address (default: 40070)
    #[arg(long)]
    register: Option<u32>,

    /// Number of registers (default: 59)
    #[arg(long)]
    count: Option<u16>,

    /// Number of concurrent workers (default: 1)
    #[arg(long)]
    threads: Option<usize>,

    /// Invocations per worker (default: 1)
    #[arg(long)]
    tests_per_thread: Option<usize>,

    /// Run N invocations sequentially instead of concurrently
    #[arg(long, value_name = "N")]
    sequential_tests: Option<usize>,

    /// Delay between invocations of one worker in seconds (default: 0)
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// Save detailed results to a JSON file
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Disable verbose output from mbpoll
    #[arg(long)]
    quiet: bool,

    /// Configuration file (YAML, TOML or JSON)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// mbpoll executable (default: mbpoll from PATH)
    #[arg(long, value_name = "PATH")]
    program: Option<String>,

    /// Per-invocation timeout in seconds (default: 30)
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<f64>,

    /// Log level or filter spec for diagnostics on stderr
    #[arg(short = 'l', long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    /// Also write diagnostics to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Write the log file as JSON lines
    #[arg(long, requires = "log_file")]
    log_json: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            program: self.program.clone(),
            host: self.host.clone(),
            port: self.port,
            slave_id: self.slave_id,
            register: self.register,
            count: self.count,
            threads: self.threads,
            tests_per_thread: self.tests_per_thread,
            sequential_tests: self.sequential_tests,
            delay: self.delay,
            quiet: self.quiet.then_some(true),
            timeout: self.timeout,
            output: self.output.clone(),
        }
    }

    fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            level: self.log_level.clone(),
            ansi: !self.no_color,
            log_file: self.log_file.clone(),
            json_file: self.log_json,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configure colored output
    if cli.no_color {
        colored::control::set_override(false);
    }

    let log_guard = match init_logging(&cli.logging_options())
        .context("Failed to initialize logging")
    {
        Ok(guard) => guard,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = run(cli).await {
        error!(code = error_code(&e), "{:#}", e);
        // Flush the log file before exiting
        drop(log_guard);
        exit_with(&e);
    }
}

fn exit_with(err: &anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);
    std::process::exit(exit_code(err))
}

async fn run(cli: Cli) -> Result<()> {
    let harness = HarnessConfig::load(cli.config.as_deref(), &cli.overrides())
        .context("Failed to load configuration")?;
    debug!("Resolved configuration: {:?}", harness);

    let run_config = harness.run_configuration()?;
    let plan = harness.plan();
    let delay = harness.delay()?;

    let invoker = Arc::new(ProcessInvoker::from_config(&run_config));
    let outcome = Scheduler::new(invoker, run_config.clone())
        .with_delay(delay)
        .run(plan)
        .await;

    print_report(&outcome.report);

    if let Some(path) = &harness.output {
        save_results(path, &run_config, &outcome.results, &outcome.report)
            .with_context(|| format!("Failed to save results to {}", path.display()))?;
    }

    Ok(())
}

/// Usage errors exit with 2, everything else with 1
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<LoadTestError>()
        .map_or(1, LoadTestError::exit_code)
}

/// Identifier attached to the final error log line
fn error_code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<LoadTestError>()
        .map_or("UNKNOWN_ERROR", LoadTestError::error_code)
}
