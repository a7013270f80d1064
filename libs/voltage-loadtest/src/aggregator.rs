//! Summary statistics over a finished run

use std::collections::HashMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::config::{RunConfiguration, TestParameters};
use crate::result::InvocationResult;
use crate::stats;

/// Message carried by [`ReportOutcome::NoResults`]
pub const NO_RESULTS_MESSAGE: &str = "No test results available";

/// Aggregation output: a report, or the explicit empty-run indicator
///
/// Serializes as the report itself, or as `{"error": "No test results available"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Report(Box<Report>),
    NoResults,
}

impl ReportOutcome {
    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Report(report) => Some(report.as_ref()),
            Self::NoResults => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoResults)
    }
}

impl Serialize for ReportOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Report(report) => report.serialize(serializer),
            Self::NoResults => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", NO_RESULTS_MESSAGE)?;
                map.end()
            },
        }
    }
}

/// Immutable statistical summary of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub command: String,
    pub test_parameters: TestParameters,
    /// Present only when at least one invocation failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_tests: usize,
    pub successful_tests: usize,
    pub failed_tests: usize,
    /// Percentage in [0, 100]
    pub success_rate: f64,
    pub total_duration: f64,
    pub average_duration: f64,
    pub median_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
    /// Present only when at least one invocation succeeded
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub successful: Option<SuccessfulDurations>,
    /// Present only with two or more results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_std_dev: Option<f64>,
}

/// Duration statistics restricted to successful invocations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessfulDurations {
    #[serde(rename = "successful_avg_duration")]
    pub average: f64,
    #[serde(rename = "successful_median_duration")]
    pub median: f64,
    #[serde(rename = "successful_min_duration")]
    pub min: f64,
    #[serde(rename = "successful_max_duration")]
    pub max: f64,
}

impl SuccessfulDurations {
    fn from_durations(durations: &[f64]) -> Option<Self> {
        Some(Self {
            average: stats::mean(durations)?,
            median: stats::median(durations)?,
            min: stats::min(durations)?,
            max: stats::max(durations)?,
        })
    }
}

/// Failure counts keyed by exact error text, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl ErrorTable {
    pub fn record(&mut self, key: String) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            },
        }
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.index.get(key).map(|&pos| self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ErrorTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Compute the report for a finished set of results
///
/// Order-independent except for the first-seen order of error keys.
pub fn aggregate(results: &[InvocationResult], config: &RunConfiguration) -> ReportOutcome {
    if results.is_empty() {
        return ReportOutcome::NoResults;
    }

    let durations: Vec<f64> = results.iter().map(|r| r.duration).collect();
    let successful_durations: Vec<f64> = results
        .iter()
        .filter(|r| r.success)
        .map(|r| r.duration)
        .collect();

    let total = results.len();
    let successful = successful_durations.len();
    let failed = total - successful;

    let mut errors = ErrorTable::default();
    for result in results.iter().filter(|r| !r.success) {
        errors.record(result.error_key());
    }

    // Non-empty input, so every statistic over all durations is defined
    let summary = Summary {
        total_tests: total,
        successful_tests: successful,
        failed_tests: failed,
        success_rate: successful as f64 / total as f64 * 100.0,
        total_duration: stats::sum(&durations),
        average_duration: stats::mean(&durations).unwrap_or_default(),
        median_duration: stats::median(&durations).unwrap_or_default(),
        min_duration: stats::min(&durations).unwrap_or_default(),
        max_duration: stats::max(&durations).unwrap_or_default(),
        successful: SuccessfulDurations::from_durations(&successful_durations),
        duration_std_dev: stats::sample_std_dev(&durations),
    };

    ReportOutcome::Report(Box::new(Report {
        summary,
        command: config.command_string(),
        test_parameters: config.test_parameters(),
        errors: (!errors.is_empty()).then_some(errors),
    }))
}
