//! Drives a run: sequential or concurrent fan-out of invocations
//!
//! Concurrent mode spawns one task per worker on the multi-threaded runtime.
//! Each worker issues its invocations strictly in sequence; across workers no
//! ordering exists. All results land in a shared [`ResultStore`], and the run
//! only returns after every scheduled invocation has completed.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::*;
use futures::future::join_all;
use tokio::sync::Barrier;
use tracing::{debug, error, info};

use crate::aggregator::{aggregate, ReportOutcome};
use crate::config::RunConfiguration;
use crate::invoker::Invoke;
use crate::result::InvocationResult;
use crate::store::ResultStore;

/// Shape of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPlan {
    Concurrent {
        num_threads: usize,
        tests_per_thread: usize,
    },
    Sequential {
        num_tests: usize,
    },
}

impl RunPlan {
    /// Number of invocations the plan schedules
    pub fn total_invocations(&self) -> usize {
        match *self {
            Self::Concurrent {
                num_threads,
                tests_per_thread,
            } => num_threads.saturating_mul(tests_per_thread),
            Self::Sequential { num_tests } => num_tests,
        }
    }
}

impl fmt::Display for RunPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Concurrent {
                num_threads,
                tests_per_thread,
            } => write!(
                f,
                "load test with {} threads, {} tests per thread",
                num_threads, tests_per_thread
            ),
            Self::Sequential { num_tests } => {
                write!(f, "sequential load test with {} tests", num_tests)
            },
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub plan: RunPlan,
    /// Wall-clock time of the whole run, independent of per-invocation durations
    pub total_elapsed: Duration,
    /// All results in completion order
    pub results: Vec<InvocationResult>,
    pub report: ReportOutcome,
}

/// State shared by every worker of one run
#[derive(Clone)]
struct RunContext {
    invoker: Arc<dyn Invoke>,
    store: Arc<ResultStore>,
    delay: Duration,
    show_progress: bool,
}

impl RunContext {
    async fn invoke_and_record(&self, test_id: &str) {
        let result = self.invoker.execute(test_id).await;
        let line = self.show_progress.then(|| progress_line(&result));
        // Append first: a panicking println! must not drop the result
        self.store.append(result);
        if let Some(line) = line {
            println!("{}", line);
        }
    }

    /// Sleep between consecutive invocations of one worker, never after the last
    async fn pause_after(&self, index: usize, total: usize) {
        if !self.delay.is_zero() && index < total {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// `[test_id] SUCCESS in 0.123s`
fn progress_line(result: &InvocationResult) -> String {
    let status = if result.success {
        result.status_label().green()
    } else {
        result.status_label().red()
    };
    format!("[{}] {} in {:.3}s", result.test_id, status, result.duration)
}

/// Upper bound on the up-front store allocation; larger runs grow on demand
const MAX_PREALLOCATED_RESULTS: usize = 4096;

fn store_capacity(plan: &RunPlan) -> usize {
    plan.total_invocations().min(MAX_PREALLOCATED_RESULTS)
}

/// Runs one plan against one invoker
///
/// A scheduler is consumed by the run it performs, so a result store is never
/// shared between runs.
pub struct Scheduler {
    invoker: Arc<dyn Invoke>,
    config: Arc<RunConfiguration>,
    delay: Duration,
    show_progress: bool,
}

impl Scheduler {
    pub fn new(invoker: Arc<dyn Invoke>, config: RunConfiguration) -> Self {
        Self {
            invoker,
            config: Arc::new(config),
            delay: Duration::ZERO,
            show_progress: true,
        }
    }

    /// Pause between consecutive invocations within one worker
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Print the header, per-invocation progress lines and completion line
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn run_concurrent(self, num_threads: usize, tests_per_thread: usize) -> RunOutcome {
        self.run(RunPlan::Concurrent {
            num_threads,
            tests_per_thread,
        })
        .await
    }

    pub async fn run_sequential(self, num_tests: usize) -> RunOutcome {
        self.run(RunPlan::Sequential { num_tests }).await
    }

    pub async fn run(self, plan: RunPlan) -> RunOutcome {
        let store = Arc::new(ResultStore::with_capacity(store_capacity(&plan)));
        let ctx = RunContext {
            invoker: Arc::clone(&self.invoker),
            store: Arc::clone(&store),
            delay: self.delay,
            show_progress: self.show_progress,
        };

        if self.show_progress {
            println!("Starting {}", plan);
            println!("Command: {}", self.config.command_string());
            println!("{}", "-".repeat(60));
        }
        info!(
            "Starting {} ({} invocations, delay {:.3}s)",
            plan,
            plan.total_invocations(),
            self.delay.as_secs_f64()
        );

        let start = Instant::now();
        match plan {
            RunPlan::Concurrent {
                num_threads,
                tests_per_thread,
            } => run_workers(&ctx, num_threads, tests_per_thread).await,
            RunPlan::Sequential { num_tests } => run_in_sequence(&ctx, num_tests).await,
        }
        let total_elapsed = start.elapsed();

        if self.show_progress {
            println!(
                "\nAll tests completed in {:.3}s",
                total_elapsed.as_secs_f64()
            );
        }

        let results = store.snapshot();
        info!(
            "Run finished: {} invocations in {:.3}s",
            results.len(),
            total_elapsed.as_secs_f64()
        );

        let report = aggregate(&results, &self.config);
        RunOutcome {
            plan,
            total_elapsed,
            results,
            report,
        }
    }
}

async fn run_in_sequence(ctx: &RunContext, num_tests: usize) {
    for i in 1..=num_tests {
        let test_id = format!("sequential_test_{}", i);
        ctx.invoke_and_record(&test_id).await;
        ctx.pause_after(i, num_tests).await;
    }
}

async fn run_workers(ctx: &RunContext, num_threads: usize, tests_per_thread: usize) {
    // Released together once every worker is spawned
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (1..=num_threads)
        .map(|thread_id| {
            let ctx = ctx.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                debug!("Worker {} started", thread_id);
                for i in 1..=tests_per_thread {
                    let test_id = format!("thread_{}_test_{}", thread_id, i);
                    ctx.invoke_and_record(&test_id).await;
                    ctx.pause_after(i, tests_per_thread).await;
                }
                debug!("Worker {} finished", thread_id);
            })
        })
        .collect();

    for (idx, joined) in join_all(handles).await.into_iter().enumerate() {
        if let Err(e) = joined {
            error!("Worker {} terminated abnormally: {}", idx + 1, e);
        }
    }
}
