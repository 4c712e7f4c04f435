#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use jestcheck::check::CheckReport;
use jestcheck::comment::DEFAULT_BOT_LOGIN;
use jestcheck::config::{Config, GitHubContext, PullRequest};
use jestcheck::error::{Error, Result};
use jestcheck::github::{CommentAuthor, IssueComment, ReviewPlatform};
use tempfile::TempDir;

pub const REPO: &str = "octo/widgets";

/// A call made against the fake platform.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateCheckRun { head_sha: String, name: String },
    ListComments { issue: u64, per_page: u32 },
    DeleteComment(u64),
    CreateComment { issue: u64, body: String },
}

/// In-memory review platform that records every call.
#[derive(Default)]
pub struct FakePlatform {
    pub comments: Mutex<Vec<IssueComment>>,
    pub calls: Mutex<Vec<Call>>,
    pub checks: Mutex<Vec<CheckReport>>,
    pub fail_deletes: bool,
}

impl FakePlatform {
    pub fn with_comments(comments: Vec<IssueComment>) -> Self {
        Self {
            comments: Mutex::new(comments),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::DeleteComment(id) => Some(id),
                _ => None,
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn created_comments(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateComment { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ReviewPlatform for FakePlatform {
    fn create_check_run(
        &self,
        _repo: &str,
        head_sha: &str,
        name: &str,
        report: &CheckReport,
    ) -> Result<()> {
        self.record(Call::CreateCheckRun {
            head_sha: head_sha.to_string(),
            name: name.to_string(),
        });
        self.checks.lock().unwrap().push(report.clone());
        Ok(())
    }

    fn list_issue_comments(
        &self,
        _repo: &str,
        issue_number: u64,
        per_page: u32,
    ) -> Result<Vec<IssueComment>> {
        self.record(Call::ListComments {
            issue: issue_number,
            per_page,
        });
        let comments = self.comments.lock().unwrap();
        Ok(comments.iter().take(per_page as usize).cloned().collect())
    }

    fn delete_issue_comment(&self, _repo: &str, comment_id: u64) -> Result<()> {
        self.record(Call::DeleteComment(comment_id));
        if self.fail_deletes {
            return Err(Error::Api {
                operation: "delete-issue-comment",
                status: Some(404),
                message: "Not Found".to_string(),
            });
        }
        self.comments.lock().unwrap().retain(|c| c.id != comment_id);
        Ok(())
    }

    fn create_issue_comment(&self, _repo: &str, issue_number: u64, body: &str) -> Result<()> {
        self.record(Call::CreateComment {
            issue: issue_number,
            body: body.to_string(),
        });
        let mut comments = self.comments.lock().unwrap();
        let id = comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        comments.push(comment(id, DEFAULT_BOT_LOGIN, body));
        Ok(())
    }
}

pub fn comment(id: u64, login: &str, body: &str) -> IssueComment {
    IssueComment {
        id,
        user: Some(CommentAuthor {
            login: login.to_string(),
        }),
        body: Some(body.to_string()),
    }
}

/// Copy a fixture into a fresh working directory as `jest.results.json`,
/// rewriting the `/repo` prefix of its paths to the directory itself.
pub fn workspace(fixture: &str) -> (TempDir, PathBuf) {
    workspace_in(fixture, None)
}

/// Like [`workspace`], with the working directory at `subdir` inside the
/// temporary directory.
pub fn workspace_in(fixture: &str, subdir: Option<&str>) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = match subdir {
        Some(sub) => dir.path().join(sub),
        None => dir.path().to_path_buf(),
    };
    std::fs::create_dir_all(&root).unwrap();
    let root = std::fs::canonicalize(root).unwrap();
    let content = std::fs::read_to_string(fixture_path(fixture)).unwrap();
    let content = content.replace("\"/repo/", &format!("\"{}/", root.display()));
    std::fs::write(root.join("jest.results.json"), content).unwrap();
    (dir, root)
}

/// Stand-in for jest: prints to both streams, writes the workspace results
/// to its `--outputFile` argument and exits 1.
///
/// Returns the test command to configure.
pub fn fake_jest(root: &Path) -> String {
    std::fs::rename(root.join("jest.results.json"), root.join("fixture.json")).unwrap();
    std::fs::write(
        root.join("fake-jest.sh"),
        r#"echo running
echo warning 1>&2
for arg in "$@"; do
  case "$arg" in
    --outputFile=*) cp fixture.json "${arg#--outputFile=}" ;;
  esac
done
exit 1
"#,
    )
    .unwrap();
    "sh fake-jest.sh".to_string()
}

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn config(root: &Path, pr_number: Option<u64>) -> Config {
    Config {
        working_directory: root.to_path_buf(),
        test_command: "true".to_string(),
        changes_only: false,
        coverage_comment: true,
        token: "token".to_string(),
        bot_login: DEFAULT_BOT_LOGIN.to_string(),
        check_name: "jestcheck".to_string(),
        api_url: "http://127.0.0.1:9".to_string(),
        github: GitHubContext {
            repository: REPO.to_string(),
            sha: Some("workflowsha".to_string()),
            pull_request: pr_number.map(|number| PullRequest {
                number,
                head_sha: Some("headsha".to_string()),
                base_ref: Some("main".to_string()),
            }),
        },
    }
}
