//! JSON document with the full result list of a run

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use errors::Result;
use serde::Serialize;
use tracing::info;

use crate::aggregator::ReportOutcome;
use crate::config::{RunConfiguration, TestParameters};
use crate::result::InvocationResult;

#[derive(Serialize)]
struct TestInfo {
    command: String,
    /// When the document was written
    timestamp: DateTime<Local>,
    #[serde(flatten)]
    parameters: TestParameters,
}

#[derive(Serialize)]
struct SavedRun<'a> {
    test_info: TestInfo,
    results: &'a [InvocationResult],
    report: &'a ReportOutcome,
}

/// Write `test_info`, every result in completion order, and the report to `path`
///
/// Missing parent directories are created. An existing file is overwritten.
pub fn save_results(
    path: &Path,
    config: &RunConfiguration,
    results: &[InvocationResult],
    report: &ReportOutcome,
) -> Result<()> {
    let document = SavedRun {
        test_info: TestInfo {
            command: config.command_string(),
            timestamp: Local::now(),
            parameters: config.test_parameters(),
        },
        results,
        report,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!("Saved {} results to {}", results.len(), path.display());
    println!("Detailed results saved to {}", path.display());
    Ok(())
}
