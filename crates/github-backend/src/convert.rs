//! Model conversions from GitHub types to gitbot-core types

use chrono::{DateTime, Utc};
use gitbot_core::{CommentRecord, CreatedIssue, IssueDetail, IssueSummary, NewIssue};

use crate::models::*;

/// Login shown for content whose author account no longer exists
const GHOST_LOGIN: &str = "ghost";

fn login(user: Option<&GitHubUser>) -> String {
    user.map(|u| u.login.clone())
        .unwrap_or_else(|| GHOST_LOGIN.to_string())
}

impl From<GitHubIssue> for IssueSummary {
    fn from(issue: GitHubIssue) -> Self {
        Self {
            number: issue.number,
            author: login(issue.user.as_ref()),
            title: issue.title,
            html_url: issue.html_url,
        }
    }
}

impl From<GitHubIssue> for IssueDetail {
    fn from(issue: GitHubIssue) -> Self {
        Self {
            number: issue.number,
            author: login(issue.user.as_ref()),
            created_at: created_at_or_now(&issue.created_at),
            title: issue.title,
            state: issue.state,
            html_url: issue.html_url,
            body: issue.body.filter(|s| !s.is_empty()),
            comment_count: issue.comments,
        }
    }
}

impl From<GitHubIssue> for CreatedIssue {
    fn from(issue: GitHubIssue) -> Self {
        Self {
            number: issue.number,
            title: issue.title,
            html_url: issue.html_url,
        }
    }
}

impl From<GitHubComment> for CommentRecord {
    fn from(c: GitHubComment) -> Self {
        Self {
            author: login(c.user.as_ref()),
            created_at: created_at_or_now(&c.created_at),
            body: c.body.unwrap_or_default(),
        }
    }
}

/// Convert a validated form payload into a create request
pub fn create_issue_from_core(issue: &NewIssue) -> CreateGitHubIssue {
    CreateGitHubIssue {
        title: issue.title.clone(),
        body: issue.body.clone(),
    }
}

/// Parse a GitHub ISO 8601 datetime string
fn parse_github_datetime(dt: &str) -> Option<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(dt)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Creation time, or now when GitHub sent something unparseable
fn created_at_or_now(raw: &str) -> DateTime<Utc> {
    parse_github_datetime(raw).unwrap_or_else(|| {
        tracing::warn!(created_at = raw, "unparseable timestamp from github, using current time");
        Utc::now()
    })
}
