//! Console rendering of a [`ReportOutcome`]

use std::fmt::Write;

use colored::*;

use crate::aggregator::{Report, ReportOutcome, NO_RESULTS_MESSAGE};

/// Render the summary block shown after a run
pub fn render_report(outcome: &ReportOutcome) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    let _ = writeln!(out, "\n{}", rule);
    let _ = writeln!(out, "{}", "LOAD TEST REPORT".bold());
    let _ = writeln!(out, "{}", rule);

    match outcome.report() {
        Some(report) => write_summary(&mut out, report),
        None => {
            let _ = writeln!(out, "{}", NO_RESULTS_MESSAGE.yellow());
        },
    }
    out
}

pub fn print_report(outcome: &ReportOutcome) {
    print!("{}", render_report(outcome));
}

fn write_summary(out: &mut String, report: &Report) {
    let summary = &report.summary;

    let _ = writeln!(out, "Total Tests: {}", summary.total_tests);
    let _ = writeln!(out, "Successful: {}", summary.successful_tests);
    let _ = writeln!(out, "Failed: {}", summary.failed_tests);

    let rate = format!("Success Rate: {:.1}%", summary.success_rate);
    let rate = if summary.failed_tests == 0 {
        rate.green()
    } else if summary.successful_tests == 0 {
        rate.red()
    } else {
        rate.yellow()
    };
    let _ = writeln!(out, "{}", rate);

    let _ = writeln!(out, "Average Duration: {:.3}s", summary.average_duration);
    let _ = writeln!(out, "Median Duration: {:.3}s", summary.median_duration);
    let _ = writeln!(out, "Min Duration: {:.3}s", summary.min_duration);
    let _ = writeln!(out, "Max Duration: {:.3}s", summary.max_duration);

    if let Some(std_dev) = summary.duration_std_dev {
        let _ = writeln!(out, "Std Deviation: {:.3}s", std_dev);
    }

    if let Some(successful) = &summary.successful {
        let _ = writeln!(out, "\nSuccessful invocations only:");
        let _ = writeln!(out, "  Average Duration: {:.3}s", successful.average);
        let _ = writeln!(out, "  Median Duration: {:.3}s", successful.median);
        let _ = writeln!(out, "  Min Duration: {:.3}s", successful.min);
        let _ = writeln!(out, "  Max Duration: {:.3}s", successful.max);
    }

    if let Some(errors) = &report.errors {
        let _ = writeln!(out, "\n{}", "Errors:".red());
        for (error, count) in errors.iter() {
            let _ = writeln!(out, "  {}: {} times", error, count);
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::config::RunConfiguration;
    use crate::result::InvocationResult;
    use chrono::Local;

    fn result(duration: f64, exit_code: i32, stderr: &str) -> InvocationResult {
        InvocationResult::completed("t", Local::now(), duration, exit_code, "", stderr)
    }

    #[test]
    fn test_render_full_report() {
        let outcome = aggregate(
            &[
                result(0.1, 0, ""),
                result(0.3, 0, ""),
                result(0.5, 1, "boom"),
                result(0.7, 1, "boom"),
            ],
            &RunConfiguration::default(),
        );
        let text = render_report(&outcome);

        assert!(text.contains("LOAD TEST REPORT"));
        assert!(text.contains("Total Tests: 4"));
        assert!(text.contains("Successful: 2"));
        assert!(text.contains("Failed: 2"));
        assert!(text.contains("Success Rate: 50.0%"));
        assert!(text.contains("Average Duration: 0.400s"));
        assert!(text.contains("Median Duration: 0.400s"));
        assert!(text.contains("Min Duration: 0.100s"));
        assert!(text.contains("Max Duration: 0.700s"));
        assert!(text.contains("Std Deviation: "));
        assert!(text.contains("  Average Duration: 0.200s"));
        assert!(text.contains("  boom: 2 times"));
    }

    #[test]
    fn test_render_single_success() {
        let outcome = aggregate(&[result(1.25, 0, "")], &RunConfiguration::default());
        let text = render_report(&outcome);

        assert!(text.contains("Success Rate: 100.0%"));
        assert!(!text.contains("Std Deviation"));
        assert!(!text.contains("Errors:"));
    }

    #[test]
    fn test_render_silent_failure_uses_return_code() {
        let outcome = aggregate(&[result(0.2, 4, "")], &RunConfiguration::default());
        let text = render_report(&outcome);

        assert!(text.contains("Success Rate: 0.0%"));
        assert!(text.contains("  Return code: 4: 1 times"));
        assert!(!text.contains("Successful invocations only"));
    }

    #[test]
    fn test_render_no_results() {
        let text = render_report(&ReportOutcome::NoResults);
        assert!(text.contains("LOAD TEST REPORT"));
        assert!(text.contains("No test results available"));
        assert!(!text.contains("Total Tests"));
    }
}
