use serde::{Deserialize, Serialize};

/// GitHub user (minimal representation)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
}

/// GitHub pull request indicator (presence means the issue is actually a PR)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubPullRequest {
    pub url: Option<String>,
}

/// GitHub issue
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubIssue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub closed_at: Option<String>,
    /// `None` when the author's account was deleted
    pub user: Option<GitHubUser>,
    /// Number of comments on the issue
    #[serde(default)]
    pub comments: u64,
    /// If present (non-null), this "issue" is actually a pull request
    pub pull_request: Option<GitHubPullRequest>,
}

impl GitHubIssue {
    /// Returns true if this is actually a pull request, not an issue
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    /// Returns true if upstream reports the issue as closed
    pub fn is_closed(&self) -> bool {
        self.state == "closed"
    }
}

/// Request body for creating a GitHub issue
#[derive(Debug, Clone, Serialize)]
pub struct CreateGitHubIssue {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Request body for updating a GitHub issue
#[derive(Debug, Clone, Serialize)]
pub struct UpdateGitHubIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl UpdateGitHubIssue {
    /// Update that closes the issue
    pub fn close() -> Self {
        Self {
            state: Some("closed".to_string()),
        }
    }
}
