//! Keeps a single coverage comment on a pull request.
//!
//! Previous comments are recognised by author and by starting with
//! [`COVERAGE_HEADER`]. They are deleted before the new one is created,
//! so a failure in between can leave no comment at all, and two runs on the
//! same pull request can race.

use std::thread;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::github::{IssueComment, ReviewPlatform};
use crate::report::COVERAGE_HEADER;

/// Only the first page of comments is inspected.
pub const COMMENTS_PER_PAGE: u32 = 100;

/// Default login of the token used by GitHub Actions workflows.
pub const DEFAULT_BOT_LOGIN: &str = "github-actions[bot]";

/// Whether a comment is a coverage comment posted by `bot_login`.
#[must_use]
pub fn is_coverage_comment(comment: &IssueComment, bot_login: &str) -> bool {
    comment.author() == Some(bot_login) && comment.body().starts_with(COVERAGE_HEADER)
}

/// Delete every previous coverage comment on the pull request, then post
/// `body` as the new one. Returns the number of deleted comments.
///
/// Deletions are issued concurrently; the new comment is only created once
/// all of them have succeeded.
pub fn replace_coverage_comment<C>(
    client: &C,
    repo: &str,
    pr_number: u64,
    bot_login: &str,
    body: &str,
) -> Result<usize>
where
    C: ReviewPlatform + Sync + ?Sized,
{
    let comments = client.list_issue_comments(repo, pr_number, COMMENTS_PER_PAGE)?;
    let stale: Vec<u64> = comments
        .iter()
        .filter(|c| is_coverage_comment(c, bot_login))
        .map(|c| c.id)
        .collect();
    debug!(
        "Found {} previous coverage comments among {}",
        stale.len(),
        comments.len()
    );

    delete_all(client, repo, &stale)?;
    if !stale.is_empty() {
        info!("Deleted {} previous coverage comments", stale.len());
    }

    client.create_issue_comment(repo, pr_number, body)?;
    info!("Coverage comment posted to {repo}#{pr_number}");
    Ok(stale.len())
}

fn delete_all<C>(client: &C, repo: &str, ids: &[u64]) -> Result<()>
where
    C: ReviewPlatform + Sync + ?Sized,
{
    let results: Vec<Result<()>> = thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                scope.spawn(move || {
                    debug!("Deleting comment {id}");
                    client.delete_issue_comment(repo, id)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err(Error::Other("comment deletion panicked".into())))
            })
            .collect()
    });
    results.into_iter().collect()
}
