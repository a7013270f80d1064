//! Load-test engine for the `mbpoll` Modbus polling tool
//!
//! Repeatedly launches an external polling command, measures each invocation,
//! and summarizes the run:
//! - [`invoker`]: one process launch with timeout, normalized to a result
//! - [`store`]: append-only, mutex-guarded result collection
//! - [`scheduler`]: sequential or concurrent fan-out of invocations
//! - [`aggregator`]: summary statistics and error-frequency table
//! - [`persist`] / [`report`]: JSON document and console summary

pub mod aggregator;
pub mod config;
pub mod invoker;
pub mod persist;
pub mod report;
pub mod result;
pub mod scheduler;
pub mod stats;
pub mod store;

pub use aggregator::{aggregate, ErrorTable, Report, ReportOutcome, SuccessfulDurations, Summary};
pub use config::{RunConfiguration, TestParameters, DEFAULT_TIMEOUT};
pub use invoker::{Invoke, ProcessInvoker, TIMEOUT_MARKER};
pub use persist::save_results;
pub use report::{print_report, render_report};
pub use result::{InvocationResult, ABNORMAL_EXIT_CODE};
pub use scheduler::{RunOutcome, RunPlan, Scheduler};
pub use store::ResultStore;
