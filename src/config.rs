//! Run configuration, resolved once from CLI flags and the GitHub Actions
//! environment.

use std::path::{Path, PathBuf};

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::comment::DEFAULT_BOT_LOGIN;
use crate::error::{Error, Result};
use crate::github::DEFAULT_API_URL;
use crate::results::RESULTS_FILE;
use crate::runner::jest_command;

/// Raw inputs as given on the command line or in the environment.
#[derive(Args, Debug, Clone)]
pub struct Inputs {
    /// Directory to run the tests in (default: current directory).
    #[arg(long, env = "JESTCHECK_WORKING_DIRECTORY")]
    pub working_directory: Option<PathBuf>,

    /// Command that runs Jest; reporting options are appended to it.
    #[arg(long, env = "JESTCHECK_TEST_COMMAND", default_value = "npx jest")]
    pub test_command: String,

    /// Only run tests related to files changed against the pull request base.
    #[arg(
        long,
        env = "JESTCHECK_CHANGES_ONLY",
        default_value_t = false,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub changes_only: bool,

    /// Post a coverage comment on the pull request.
    #[arg(
        long,
        env = "JESTCHECK_COVERAGE_COMMENT",
        default_value_t = true,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub coverage_comment: bool,

    /// Login of the account the token belongs to.
    #[arg(long, env = "JESTCHECK_BOT_LOGIN", default_value = DEFAULT_BOT_LOGIN)]
    pub bot_login: String,

    /// Name of the check run.
    #[arg(long, env = "JESTCHECK_CHECK_NAME", default_value = "jestcheck")]
    pub check_name: String,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Repository as `owner/name`.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    #[arg(long, env = "GITHUB_SHA")]
    pub sha: Option<String>,

    #[arg(long = "ref", env = "GITHUB_REF")]
    pub git_ref: Option<String>,

    /// Path of the webhook event payload.
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    pub event_path: Option<PathBuf>,

    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

/// The pull request a run belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub head_sha: Option<String>,
    pub base_ref: Option<String>,
}

/// Where results are reported.
#[derive(Debug, Clone)]
pub struct GitHubContext {
    pub repository: String,
    pub sha: Option<String>,
    pub pull_request: Option<PullRequest>,
}

impl GitHubContext {
    /// Commit the check run is attached to: the pull request head when
    /// there is one, otherwise the workflow commit.
    pub fn head_sha(&self) -> Option<&str> {
        self.pull_request
            .as_ref()
            .and_then(|pr| pr.head_sha.as_deref())
            .or(self.sha.as_deref())
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub working_directory: PathBuf,
    pub test_command: String,
    pub changes_only: bool,
    pub coverage_comment: bool,
    pub token: String,
    pub bot_login: String,
    pub check_name: String,
    pub api_url: String,
    pub github: GitHubContext,
}

impl Config {
    /// Resolve inputs. A missing token is reported before anything else.
    pub fn resolve(inputs: Inputs) -> Result<Self> {
        let token = inputs
            .token
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingToken)?;
        let repository = inputs
            .repository
            .filter(|r| !r.is_empty())
            .ok_or(Error::MissingRepository)?;
        let working_directory = resolve_working_directory(inputs.working_directory.as_deref())?;

        let pull_request = inputs
            .event_path
            .as_deref()
            .and_then(pull_request_from_event)
            .or_else(|| {
                inputs
                    .git_ref
                    .as_deref()
                    .and_then(pr_number_from_ref)
                    .map(|number| PullRequest {
                        number,
                        head_sha: None,
                        base_ref: None,
                    })
            });
        debug!("Pull request: {pull_request:?}");

        Ok(Self {
            working_directory,
            test_command: inputs.test_command,
            changes_only: inputs.changes_only,
            coverage_comment: inputs.coverage_comment,
            token,
            bot_login: inputs.bot_login,
            check_name: inputs.check_name,
            api_url: inputs.api_url,
            github: GitHubContext {
                repository,
                sha: inputs.sha,
                pull_request,
            },
        })
    }

    /// Where Jest is told to write its results.
    #[must_use]
    pub fn results_file(&self) -> PathBuf {
        self.working_directory.join(RESULTS_FILE)
    }

    /// Base ref to pass to `--changedSince`, if only changed files are tested.
    pub fn changed_since(&self) -> Option<&str> {
        if !self.changes_only {
            return None;
        }
        self.github
            .pull_request
            .as_ref()
            .and_then(|pr| pr.base_ref.as_deref())
    }

    /// The full command line to run.
    #[must_use]
    pub fn command_line(&self) -> String {
        jest_command(
            &self.test_command,
            &self.results_file(),
            self.coverage_comment,
            self.changed_since(),
        )
    }
}

/// Absolute working directory; defaults to the current directory.
pub fn resolve_working_directory(dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(std::fs::canonicalize(dir)?)
}

/// Extract PR number from a ref (e.g. "refs/pull/42/merge" → 42).
#[must_use]
pub fn pr_number_from_ref(git_ref: &str) -> Option<u64> {
    let parts: Vec<&str> = git_ref.split('/').collect();
    if parts.len() >= 3 && parts[0] == "refs" && parts[1] == "pull" {
        parts[2].parse().ok()
    } else {
        None
    }
}

#[derive(Deserialize)]
struct Event {
    pull_request: Option<EventPullRequest>,
}

#[derive(Deserialize)]
struct EventPullRequest {
    number: u64,
    head: Option<EventBranch>,
    base: Option<EventBranch>,
}

#[derive(Deserialize)]
struct EventBranch {
    sha: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

/// Read the pull request from a webhook event payload, if the event has one.
pub fn pull_request_from_event(path: &Path) -> Option<PullRequest> {
    let content = match std::fs::read(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Could not read event payload {}: {e}", path.display());
            return None;
        }
    };
    let event: Event = match serde_json::from_slice(&content) {
        Ok(e) => e,
        Err(e) => {
            warn!("Could not parse event payload {}: {e}", path.display());
            return None;
        }
    };
    let pr = event.pull_request?;
    Some(PullRequest {
        number: pr.number,
        head_sha: pr.head.and_then(|h| h.sha),
        base_ref: pr.base.and_then(|b| b.git_ref),
    })
}
