use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BotError, Result};

/// Maximum length of an issue title accepted by the creation form
pub const MAX_TITLE_LEN: usize = 256;

/// Repository identifier parsed from `owner/repo`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse an `owner/repo` string.
    ///
    /// Exactly one `/` with a non-empty segment on each side is accepted;
    /// anything else is a validation error.
    pub fn parse(input: &str) -> Result<Self> {
        let mut segments = input.trim().split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(BotError::Validation(format!(
                "Invalid repository '{}', expected owner/repo",
                input
            ))),
        }
    }

    /// Reference an issue inside this repository
    pub fn issue(&self, number: u64) -> IssueRef {
        IssueRef {
            repo: self.clone(),
            number,
        }
    }
}

impl FromStr for RepoRef {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A single issue inside a repository
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueRef {
    pub repo: RepoRef,
    pub number: u64,
}

impl IssueRef {
    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    pub fn repo_name(&self) -> &str {
        &self.repo.name
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

/// Issue state filter for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    /// Value used in the `state` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }

    /// Capitalized label for display
    pub fn label(&self) -> &'static str {
        match self {
            IssueState::Open => "Open",
            IssueState::Closed => "Closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comment on an issue, in upstream order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub body: String,
}

/// Issue as shown in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub html_url: String,
}

/// Full issue detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDetail {
    pub number: u64,
    pub title: String,
    pub author: String,
    /// Raw upstream state (`open` or `closed`)
    pub state: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub body: Option<String>,
    pub comment_count: u64,
}

/// Validated payload of the issue creation form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    pub title: String,
    pub body: Option<String>,
}

impl NewIssue {
    /// Build a new issue from raw form input.
    ///
    /// The title is required and limited to [`MAX_TITLE_LEN`] characters.
    /// A blank body is dropped.
    pub fn new(title: &str, body: Option<&str>) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BotError::Validation("Issue title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(BotError::Validation(format!(
                "Issue title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        Ok(Self {
            title: title.to_string(),
            body: body
                .filter(|b| !b.trim().is_empty())
                .map(|b| b.to_string()),
        })
    }
}

/// Result of a successful issue creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

/// Stored credential record, as held by the credential store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub owner_user_id: String,
    pub encrypted_token: Option<Vec<u8>>,
}

/// Decrypted GitHub token, scoped to a single outgoing request
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Plaintext for the Authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_repo_ref() {
        let repo = RepoRef::parse("myferr/x3").unwrap();
        assert_eq!(repo.owner, "myferr");
        assert_eq!(repo.name, "x3");
        assert_eq!(repo.to_string(), "myferr/x3");
    }

    #[test]
    fn parse_repo_ref_rejects_malformed_input() {
        for input in ["invalid", "a/b/c", "/b", "a/", "", "/"] {
            assert!(
                matches!(RepoRef::parse(input), Err(BotError::Validation(_))),
                "expected validation error for {:?}",
                input
            );
        }
    }

    #[test]
    fn issue_ref_display() {
        let issue = RepoRef::parse("a/b").unwrap().issue(42);
        assert_eq!(issue.owner(), "a");
        assert_eq!(issue.repo_name(), "b");
        assert_eq!(issue.to_string(), "a/b#42");
    }

    #[test]
    fn new_issue_requires_title() {
        assert!(matches!(
            NewIssue::new("   ", None),
            Err(BotError::Validation(_))
        ));
    }

    #[test]
    fn new_issue_limits_title_length() {
        let at_limit = "x".repeat(MAX_TITLE_LEN);
        assert!(NewIssue::new(&at_limit, None).is_ok());

        let too_long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(NewIssue::new(&too_long, None).is_err());
    }

    #[test]
    fn new_issue_drops_blank_body() {
        let issue = NewIssue::new("Crash on start", Some("  \n")).unwrap();
        assert_eq!(issue.body, None);

        let issue = NewIssue::new("Crash on start", Some("steps")).unwrap();
        assert_eq!(issue.body.as_deref(), Some("steps"));
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("ghp_secret");
        assert_eq!(format!("{:?}", token), "AccessToken(<redacted>)");
        assert_eq!(token.expose(), "ghp_secret");
    }

    #[test]
    fn issue_state_serializes_lowercase() {
        let json = serde_json::to_string(&IssueState::Closed).unwrap();
        assert_eq!(json, "\"closed\"");
        assert_eq!(IssueState::Open.label(), "Open");
    }
}
