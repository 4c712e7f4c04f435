//! GitHub REST API access for check runs and pull-request comments.

use serde::Deserialize;
use tracing::debug;

use crate::check::CheckReport;
use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "jestcheck";
const API_VERSION: &str = "2022-11-28";

/// An issue (or pull-request) comment as returned by the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    pub user: Option<CommentAuthor>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentAuthor {
    pub login: String,
}

impl IssueComment {
    pub fn author(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.login.as_str())
    }

    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or_default()
    }
}

/// The review-platform operations the reporting pipeline needs.
///
/// `repo` is always `owner/name`.
pub trait ReviewPlatform {
    fn create_check_run(
        &self,
        repo: &str,
        head_sha: &str,
        name: &str,
        report: &CheckReport,
    ) -> Result<()>;

    /// A single page of comments, oldest first.
    fn list_issue_comments(
        &self,
        repo: &str,
        issue_number: u64,
        per_page: u32,
    ) -> Result<Vec<IssueComment>>;

    fn delete_issue_comment(&self, repo: &str, comment_id: u64) -> Result<()>;

    fn create_issue_comment(&self, repo: &str, issue_number: u64, body: &str) -> Result<()>;
}

/// Blocking GitHub client authenticated with a token.
pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{}", self.api_url, path);
        debug!("{method} {url}");
        self.agent
            .request(method, &url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", USER_AGENT)
            .set("X-GitHub-Api-Version", API_VERSION)
    }
}

/// Turn a ureq failure into an API error carrying the response body.
fn api_error(operation: &'static str, err: ureq::Error) -> Error {
    match err {
        ureq::Error::Status(code, resp) => Error::Api {
            operation,
            status: Some(code),
            message: resp.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => Error::Api {
            operation,
            status: None,
            message: t.to_string(),
        },
    }
}

impl ReviewPlatform for GitHubClient {
    fn create_check_run(
        &self,
        repo: &str,
        head_sha: &str,
        name: &str,
        report: &CheckReport,
    ) -> Result<()> {
        const OP: &str = "create-check-run";
        self.request("POST", &format!("/repos/{repo}/check-runs"))
            .send_json(serde_json::json!({
                "name": name,
                "head_sha": head_sha,
                "status": report.status,
                "conclusion": report.conclusion,
                "output": report.output,
            }))
            .map_err(|e| api_error(OP, e))?;
        Ok(())
    }

    fn list_issue_comments(
        &self,
        repo: &str,
        issue_number: u64,
        per_page: u32,
    ) -> Result<Vec<IssueComment>> {
        const OP: &str = "list-issue-comments";
        let resp = self
            .request(
                "GET",
                &format!("/repos/{repo}/issues/{issue_number}/comments?per_page={per_page}"),
            )
            .call()
            .map_err(|e| api_error(OP, e))?;
        resp.into_json().map_err(|e| Error::Api {
            operation: OP,
            status: None,
            message: format!("Failed to parse comments JSON: {e}"),
        })
    }

    fn delete_issue_comment(&self, repo: &str, comment_id: u64) -> Result<()> {
        const OP: &str = "delete-issue-comment";
        self.request("DELETE", &format!("/repos/{repo}/issues/comments/{comment_id}"))
            .call()
            .map_err(|e| api_error(OP, e))?;
        Ok(())
    }

    fn create_issue_comment(&self, repo: &str, issue_number: u64, body: &str) -> Result<()> {
        const OP: &str = "create-issue-comment";
        self.request("POST", &format!("/repos/{repo}/issues/{issue_number}/comments"))
            .send_json(serde_json::json!({ "body": body }))
            .map_err(|e| api_error(OP, e))?;
        Ok(())
    }
}
