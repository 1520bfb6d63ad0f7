use std::sync::Arc;

use crate::error::Result;
use crate::models::*;

/// Issue operations the commands need from GitHub
///
/// Read operations are unauthenticated. Mutating operations take the token
/// resolved by the authorization gate for that one call.
pub trait IssueApi: Send + Sync {
    // ========== Read Operations ==========

    /// List issues in a repository by state
    fn list_issues(&self, repo: &RepoRef, state: IssueState) -> Result<Vec<IssueSummary>>;

    /// Get a single issue
    fn get_issue(&self, issue: &IssueRef) -> Result<IssueDetail>;

    /// List all comments on an issue, in creation order
    fn list_comments(&self, issue: &IssueRef) -> Result<Vec<CommentRecord>>;

    // ========== Mutating Operations ==========

    /// Close an issue.
    ///
    /// Succeeds only when upstream echoes the issue back as closed.
    fn close_issue(&self, issue: &IssueRef, token: &AccessToken) -> Result<()>;

    /// Create a new issue
    fn create_issue(
        &self,
        repo: &RepoRef,
        issue: &NewIssue,
        token: &AccessToken,
    ) -> Result<CreatedIssue>;

    /// Post a comment on an issue
    fn post_comment(&self, issue: &IssueRef, body: &str, token: &AccessToken) -> Result<()>;
}

/// Read-only view of the external credential store
pub trait CredentialStore: Send + Sync {
    /// Look up the credential linked to a chat user
    fn find(&self, caller_id: &str) -> Result<Option<Credential>>;
}

/// Decryption of stored tokens
pub trait TokenCodec: Send + Sync {
    /// Decrypt an opaque token payload into plaintext
    fn decrypt(&self, payload: &[u8]) -> Result<String>;
}

impl<T: IssueApi + ?Sized> IssueApi for Arc<T> {
    fn list_issues(&self, repo: &RepoRef, state: IssueState) -> Result<Vec<IssueSummary>> {
        (**self).list_issues(repo, state)
    }

    fn get_issue(&self, issue: &IssueRef) -> Result<IssueDetail> {
        (**self).get_issue(issue)
    }

    fn list_comments(&self, issue: &IssueRef) -> Result<Vec<CommentRecord>> {
        (**self).list_comments(issue)
    }

    fn close_issue(&self, issue: &IssueRef, token: &AccessToken) -> Result<()> {
        (**self).close_issue(issue, token)
    }

    fn create_issue(
        &self,
        repo: &RepoRef,
        issue: &NewIssue,
        token: &AccessToken,
    ) -> Result<CreatedIssue> {
        (**self).create_issue(repo, issue, token)
    }

    fn post_comment(&self, issue: &IssueRef, body: &str, token: &AccessToken) -> Result<()> {
        (**self).post_comment(issue, body, token)
    }
}

impl<T: CredentialStore + ?Sized> CredentialStore for Arc<T> {
    fn find(&self, caller_id: &str) -> Result<Option<Credential>> {
        (**self).find(caller_id)
    }
}
