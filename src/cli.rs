//! Command handler functions for the jestcheck CLI.
//!
//! Handlers take an explicit [`Config`] and any [`ReviewPlatform`].

use std::io::ErrorKind;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::github::ReviewPlatform;
use crate::report::{CoverageReport, MarkdownFormatter, TextFormatter};
use crate::{check, comment, report, results, runner};

/// Output style for the `coverage` command.
#[derive(Clone, Debug, ValueEnum)]
pub enum Style {
    Text,
    Markdown,
}

/// How a reporting run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No usable results file; nothing was reported.
    NoResults,
    Passed,
    Failed,
}

/// Run the tests, then report their results.
///
/// Results left over from an earlier run are removed first. Pass or fail is
/// read from the results file, not from the exit status.
pub fn cmd_run<C>(config: &Config, client: &C) -> Result<Outcome>
where
    C: ReviewPlatform + Sync,
{
    let results_file = config.results_file();
    match std::fs::remove_file(&results_file) {
        Ok(()) => debug!("Removed previous results {}", results_file.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to remove previous results {}", results_file.display())
            })
        }
    }

    let command = config.command_line();
    let run = runner::run(&command, &config.working_directory);
    match run.status {
        Some(status) if !status.success() => warn!("Test command exited with {status}"),
        Some(_) => debug!("Test command finished"),
        None => {}
    }
    publish(config, client, &results_file, &run.stdout, &run.stderr)
}

/// Report an existing results file along with previously captured output.
pub fn cmd_publish<C>(
    config: &Config,
    client: &C,
    results_file: &Path,
    stdout: &str,
    stderr: &str,
) -> Result<Outcome>
where
    C: ReviewPlatform + Sync,
{
    publish(config, client, results_file, stdout, stderr)
}

fn publish<C>(
    config: &Config,
    client: &C,
    results_file: &Path,
    stdout: &str,
    stderr: &str,
) -> Result<Outcome>
where
    C: ReviewPlatform + Sync,
{
    let Some(results) = results::load(results_file) else {
        warn!("No test results found, nothing to report");
        return Ok(Outcome::NoResults);
    };

    let repo = &config.github.repository;
    let head_sha = config
        .github
        .head_sha()
        .ok_or_else(|| anyhow!("No commit to attach the check run to (GITHUB_SHA not set)"))?;

    let check_report = check::build(&results, stdout, stderr, &config.working_directory);
    client
        .create_check_run(repo, head_sha, &config.check_name, &check_report)
        .context("Failed to create check run")?;
    info!(
        "Check run '{}' created on {head_sha} with {} annotations",
        config.check_name,
        check_report.output.annotations.len()
    );

    match &config.github.pull_request {
        Some(pr) if config.coverage_comment => {
            let coverage = report::build_report(&results, &config.working_directory);
            if let Some(body) = coverage.comment_body() {
                comment::replace_coverage_comment(client, repo, pr.number, &config.bot_login, &body)
                    .context("Failed to update coverage comment")?;
            }
        }
        Some(_) => info!("Coverage comments disabled"),
        None => info!("Not a pull request, skipping coverage comment"),
    }

    Ok(if results.success {
        Outcome::Passed
    } else {
        Outcome::Failed
    })
}

/// Render the coverage table of a results file locally.
pub fn cmd_coverage(results_file: &Path, root: &Path, style: &Style) -> Result<String> {
    let results = results::load(results_file)
        .ok_or_else(|| anyhow!("No test results in {}", results_file.display()))?;

    let out = match report::build_report(&results, root) {
        CoverageReport::NotCollected => "No coverage collected.\n".to_string(),
        CoverageReport::Empty => "No entries found in coverage data.\n".to_string(),
        CoverageReport::Table(table) => match style {
            Style::Text => table.format(&TextFormatter),
            Style::Markdown => table.format(&MarkdownFormatter),
        },
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_results(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("jest.results.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    const WITH_COVERAGE: &str = r#"{
        "success": true,
        "numPassedTests": 1, "numFailedTests": 0, "numTotalTests": 1,
        "numPassedTestSuites": 1, "numFailedTestSuites": 0, "numTotalTestSuites": 1,
        "testResults": [],
        "coverageMap": {
            "/repo/src/a.js": {
                "statementMap": { "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 5 } } },
                "s": { "0": 1 }, "b": {}, "f": {}
            }
        }
    }"#;

    #[test]
    fn test_cmd_coverage_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_results(dir.path(), WITH_COVERAGE);

        let out = cmd_coverage(&path, Path::new("/repo"), &Style::Text).unwrap();
        assert!(out.contains("Coverage summary"));
        assert!(out.contains("a.js"));
    }

    #[test]
    fn test_cmd_coverage_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_results(dir.path(), WITH_COVERAGE);

        let out = cmd_coverage(&path, Path::new("/repo"), &Style::Markdown).unwrap();
        assert!(out.starts_with(report::COVERAGE_HEADER));
        assert!(out.contains("🟢 100%"));
    }

    #[test]
    fn test_cmd_coverage_not_collected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_results(
            dir.path(),
            r#"{"success":true,"numPassedTests":0,"numFailedTests":0,"numTotalTests":0,
                "numPassedTestSuites":0,"numFailedTestSuites":0,"numTotalTestSuites":0}"#,
        );

        let out = cmd_coverage(&path, dir.path(), &Style::Text).unwrap();
        assert_eq!(out, "No coverage collected.\n");
    }

    #[test]
    fn test_cmd_coverage_missing_results() {
        let dir = tempfile::tempdir().unwrap();
        let result = cmd_coverage(&dir.path().join("nope.json"), dir.path(), &Style::Text);
        assert!(result.is_err());
    }
}
