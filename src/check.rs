//! Check-run payload for a test run.

use std::path::Path;

use serde::Serialize;
use tracing::warn;

use crate::annotations;
use crate::format::{code_fence, truncate};
use crate::model::{Annotation, Results};

/// Hard limit on the log text attached to a check run.
pub const MAX_TEXT_LENGTH: usize = 60_000;

/// Most annotations GitHub accepts in one check-run request.
pub const MAX_ANNOTATIONS: usize = 50;

pub const SUCCESS_TITLE: &str = "Jest tests passed";
pub const FAILURE_TITLE: &str = "Jest tests failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
}

/// The `output` object of a check run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput {
    pub title: String,
    pub summary: String,
    pub text: String,
    pub annotations: Vec<Annotation>,
}

/// Everything about a check run except where it is attached.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub status: CheckStatus,
    pub conclusion: Conclusion,
    pub output: CheckOutput,
}

/// Build the check report from parsed results and the captured output of
/// the test command.
#[must_use]
pub fn build(results: &Results, stdout: &str, stderr: &str, cwd: &Path) -> CheckReport {
    let (conclusion, title) = if results.success {
        (Conclusion::Success, SUCCESS_TITLE)
    } else {
        (Conclusion::Failure, FAILURE_TITLE)
    };

    let mut annotations = annotations::extract(results, cwd);
    if annotations.len() > MAX_ANNOTATIONS {
        warn!(
            "Attaching the first {MAX_ANNOTATIONS} of {} failure annotations",
            annotations.len()
        );
        annotations.truncate(MAX_ANNOTATIONS);
    }

    CheckReport {
        status: CheckStatus::Completed,
        conclusion,
        output: CheckOutput {
            title: title.to_string(),
            summary: summary(results),
            text: code_fence(&log_text(stdout, stderr)),
            annotations,
        },
    }
}

/// One-line outcome for the check summary.
///
/// The failed-suites numerator repeats the failed *test* count.
#[must_use]
pub fn summary(results: &Results) -> String {
    if results.success {
        let suites = results.num_passed_test_suites;
        let plural = if suites > 1 { "s" } else { "" };
        format!(
            "{} tests passing in {suites} suite{plural}.",
            results.num_passed_tests
        )
    } else {
        format!(
            "Failed tests: {failed}/{}. Failed suites: {failed}/{}.",
            results.num_total_tests,
            results.num_total_test_suites,
            failed = results.num_failed_tests,
        )
    }
}

/// Captured stdout followed by stderr, cut to [`MAX_TEXT_LENGTH`].
#[must_use]
pub fn log_text(stdout: &str, stderr: &str) -> String {
    let mut text = String::with_capacity(stdout.len() + stderr.len() + 2);
    text.push_str(stdout);
    if !stderr.is_empty() {
        text.push_str("\n\n");
        text.push_str(stderr);
    }
    truncate(&text, MAX_TEXT_LENGTH)
}
