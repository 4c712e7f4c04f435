//! Typed representation of a Jest `--json` results file, plus the derived
//! values (coverage summaries, annotations) built from it.

use serde::{Deserialize, Serialize};

use crate::istanbul::CoverageMap;

/// Compute a coverage percentage floored to two decimals, or `None` when
/// nothing of this kind is instrumented.
#[must_use]
pub fn percent(covered: u64, total: u64) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some((covered as f64 * 10_000.0 / total as f64).floor() / 100.0)
    }
}

/// The top-level results object written by `jest --json --outputFile=...`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Results {
    pub success: bool,
    pub num_passed_tests: u64,
    pub num_failed_tests: u64,
    pub num_total_tests: u64,
    pub num_passed_test_suites: u64,
    pub num_failed_test_suites: u64,
    pub num_total_test_suites: u64,
    #[serde(default)]
    pub test_results: Vec<SuiteResult>,
    #[serde(default)]
    pub coverage_map: Option<CoverageMap>,
}

/// Results for one test file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteResult {
    /// Absolute path of the test file.
    pub name: String,
    #[serde(default)]
    pub assertion_results: Vec<AssertionResult>,
}

/// A single `it`/`test` block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    pub status: Status,
    #[serde(default)]
    pub ancestor_titles: Vec<String>,
    pub title: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub failure_messages: Option<Vec<String>>,
}

/// Source position reported with `--testLocationInResults`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub line: u32,
    #[serde(default)]
    pub column: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    Failed,
    Pending,
    Skipped,
    Todo,
    Disabled,
    Focused,
    #[serde(other)]
    Other,
}

/// Covered/total counts for one kind of coverage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metric {
    pub total: u64,
    pub covered: u64,
}

impl Metric {
    #[must_use]
    pub fn pct(&self) -> Option<f64> {
        percent(self.covered, self.total)
    }

    pub fn merge(&mut self, other: &Metric) {
        self.total += other.total;
        self.covered += other.covered;
    }
}

/// Statement/branch/function/line counts for a file or a group of files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub statements: Metric,
    pub branches: Metric,
    pub functions: Metric,
    pub lines: Metric,
}

impl CoverageSummary {
    pub fn merge(&mut self, other: &CoverageSummary) {
        self.statements.merge(&other.statements);
        self.branches.merge(&other.branches);
        self.functions.merge(&other.functions);
        self.lines.merge(&other.lines);
    }

    /// Percentages in table column order.
    #[must_use]
    pub fn percentages(&self) -> [Option<f64>; 4] {
        [
            self.statements.pct(),
            self.branches.pct(),
            self.functions.pct(),
            self.lines.pct(),
        ]
    }
}

/// Severity of a check-run annotation. Only failures are ever emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    Failure,
}

/// A single annotation to attach to a GitHub check run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Test file path relative to the working directory.
    pub path: String,
    /// Start line of the annotation range (0 when unknown).
    pub start_line: u32,
    /// End line of the annotation range (0 when unknown).
    pub end_line: u32,
    pub annotation_level: AnnotationLevel,
    pub title: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_floors_to_two_decimals() {
        assert_eq!(percent(1, 3), Some(33.33));
        assert_eq!(percent(2, 3), Some(66.66));
        assert_eq!(percent(5, 5), Some(100.0));
        assert_eq!(percent(0, 4), Some(0.0));
    }

    #[test]
    fn test_percent_untracked() {
        assert_eq!(percent(0, 0), None);
    }

    #[test]
    fn test_summary_merge() {
        let mut a = CoverageSummary {
            statements: Metric {
                total: 4,
                covered: 2,
            },
            ..Default::default()
        };
        let b = CoverageSummary {
            statements: Metric {
                total: 6,
                covered: 6,
            },
            branches: Metric {
                total: 2,
                covered: 1,
            },
            ..Default::default()
        };
        a.merge(&b);
        assert_eq!(a.statements.pct(), Some(80.0));
        assert_eq!(a.branches.pct(), Some(50.0));
        assert_eq!(a.functions.pct(), None);
    }

    #[test]
    fn test_unknown_status_deserializes() {
        let a: AssertionResult =
            serde_json::from_str(r#"{"status":"weird","title":"x"}"#).unwrap();
        assert_eq!(a.status, Status::Other);
        assert!(a.ancestor_titles.is_empty());
        assert!(a.location.is_none());
    }

    #[test]
    fn test_annotation_serializes_level() {
        let a = Annotation {
            path: "a.test.js".to_string(),
            start_line: 3,
            end_line: 3,
            annotation_level: AnnotationLevel::Failure,
            title: "t".to_string(),
            message: "m".to_string(),
        };
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["annotation_level"], "failure");
        assert_eq!(v["start_line"], 3);
    }
}
