use std::time::Duration;
use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::{GitHubError, Result};
use crate::models::*;

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = "gitbot";
/// Largest page size the issues API accepts
const COMMENTS_PER_PAGE: usize = 100;

/// GitHub REST API client
///
/// Not bound to a repository: every call names its `owner/repo`. Read calls
/// are anonymous; mutating calls take the caller's token for that request
/// only.
pub struct GitHubClient {
    agent: Agent,
    base_url: String,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubClient {
    /// Create a new GitHub client targeting api.github.com
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a new GitHub client with a custom base URL (for GitHub Enterprise or testing)
    pub fn with_base_url(base_url: &str) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a repo-scoped URL
    fn repo_url(&self, owner: &str, repo: &str, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.base_url,
            urlencoding::encode(owner),
            urlencoding::encode(repo),
            path
        )
    }

    /// Attach the standard headers, plus Authorization when a token is given
    fn with_headers<B>(&self, request: RequestBuilder<B>, token: Option<&str>) -> RequestBuilder<B> {
        let request = request
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT);
        match token {
            Some(token) => request.header("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Check response status and return error if not successful
    fn check_response(
        &self,
        method: &str,
        url: &str,
        mut response: Response<Body>,
    ) -> Result<Response<Body>> {
        let status = response.status().as_u16();
        tracing::debug!(method, url, status, "github response");

        if (200..300).contains(&status) {
            return Ok(response);
        }

        // Try to read error body
        let body = response
            .body_mut()
            .read_to_string()
            .unwrap_or_else(|_| String::new());

        // GitHub reports failures as {"message": "..."}
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
            .filter(|m| !m.trim().is_empty());

        tracing::warn!(method, url, status, message = ?message, "github request failed");
        Err(GitHubError::Api { status, message })
    }

    fn send_failed(method: &str, url: &str, err: ureq::Error) -> GitHubError {
        tracing::warn!(method, url, error = %err, "github request could not be sent");
        GitHubError::Http(err)
    }

    // ==================== Issue Operations ====================

    /// List issues in a repository by state (`open` or `closed`)
    ///
    /// Returns only actual issues, filtering out pull requests.
    pub fn list_issues(&self, owner: &str, repo: &str, state: &str) -> Result<Vec<GitHubIssue>> {
        let url = format!(
            "{}?state={}",
            self.repo_url(owner, repo, "/issues"),
            urlencoding::encode(state)
        );

        let response = self
            .with_headers(self.agent.get(&url), None)
            .call()
            .map_err(|e| Self::send_failed("GET", &url, e))?;

        let mut response = self.check_response("GET", &url, response)?;
        let issues: Vec<GitHubIssue> = response.body_mut().read_json()?;

        // Filter out pull requests
        Ok(issues
            .into_iter()
            .filter(|i| !i.is_pull_request())
            .collect())
    }

    /// Get an issue by number
    pub fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<GitHubIssue> {
        let url = self.repo_url(owner, repo, &format!("/issues/{}", number));

        let response = self
            .with_headers(self.agent.get(&url), None)
            .call()
            .map_err(|e| Self::send_failed("GET", &url, e))?;

        let mut response = self.check_response("GET", &url, response)?;
        let issue: GitHubIssue = response.body_mut().read_json()?;
        Ok(issue)
    }

    /// Create a new issue
    pub fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        issue: &CreateGitHubIssue,
        token: &str,
    ) -> Result<GitHubIssue> {
        let url = self.repo_url(owner, repo, "/issues");

        let response = self
            .with_headers(self.agent.post(&url), Some(token))
            .header("Content-Type", "application/json")
            .send_json(issue)
            .map_err(|e| Self::send_failed("POST", &url, e))?;

        let mut response = self.check_response("POST", &url, response)?;
        let created: GitHubIssue = response.body_mut().read_json()?;
        Ok(created)
    }

    /// Update an existing issue, returning the issue as upstream echoes it
    pub fn update_issue(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        update: &UpdateGitHubIssue,
        token: &str,
    ) -> Result<GitHubIssue> {
        let url = self.repo_url(owner, repo, &format!("/issues/{}", number));

        let response = self
            .with_headers(self.agent.patch(&url), Some(token))
            .header("Content-Type", "application/json")
            .send_json(update)
            .map_err(|e| Self::send_failed("PATCH", &url, e))?;

        let mut response = self.check_response("PATCH", &url, response)?;
        let updated: GitHubIssue = response.body_mut().read_json()?;
        Ok(updated)
    }

    // ==================== Comment Operations ====================

    /// Get every comment on an issue, oldest first
    ///
    /// Pages are requested until one comes back short.
    pub fn get_comments(&self, owner: &str, repo: &str, number: u64) -> Result<Vec<GitHubComment>> {
        let base = self.repo_url(owner, repo, &format!("/issues/{}/comments", number));
        let mut comments = Vec::new();

        for page in 1.. {
            let url = format!("{}?per_page={}&page={}", base, COMMENTS_PER_PAGE, page);

            let response = self
                .with_headers(self.agent.get(&url), None)
                .call()
                .map_err(|e| Self::send_failed("GET", &url, e))?;

            let mut response = self.check_response("GET", &url, response)?;
            let batch: Vec<GitHubComment> = response.body_mut().read_json()?;
            let done = batch.len() < COMMENTS_PER_PAGE;
            comments.extend(batch);
            if done {
                break;
            }
        }

        tracing::debug!(issue = number, count = comments.len(), "fetched comments");
        Ok(comments)
    }

    /// Add a comment to an issue
    pub fn add_comment(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
        token: &str,
    ) -> Result<GitHubComment> {
        let url = self.repo_url(owner, repo, &format!("/issues/{}/comments", number));

        let comment = CreateGitHubComment {
            body: body.to_string(),
        };

        let response = self
            .with_headers(self.agent.post(&url), Some(token))
            .header("Content-Type", "application/json")
            .send_json(&comment)
            .map_err(|e| Self::send_failed("POST", &url, e))?;

        let mut response = self.check_response("POST", &url, response)?;
        let created: GitHubComment = response.body_mut().read_json()?;
        Ok(created)
    }
}
