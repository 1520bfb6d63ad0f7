//! In-memory collaborators for tests and local experiments
//!
//! These stand in for the external credential store, token codec and
//! GitHub API without touching the network or disk.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::{BotError, Result};
use crate::models::*;
use crate::traits::{CredentialStore, IssueApi, TokenCodec};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Credential store backed by a map
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<String, Option<Vec<u8>>>>,
    failure: Mutex<Option<String>>,
    lookups: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a user with an (already encoded) token payload
    pub fn insert(&self, caller_id: &str, payload: Vec<u8>) {
        lock(&self.records).insert(caller_id.to_string(), Some(payload));
    }

    /// Link a user whose record carries no token at all
    pub fn insert_without_token(&self, caller_id: &str) {
        lock(&self.records).insert(caller_id.to_string(), None);
    }

    /// Make every subsequent lookup fail
    pub fn fail_with(&self, message: &str) {
        *lock(&self.failure) = Some(message.to_string());
    }

    /// Number of lookups performed so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn find(&self, caller_id: &str) -> Result<Option<Credential>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.failure).clone() {
            return Err(BotError::CredentialStore(message));
        }
        Ok(lock(&self.records)
            .get(caller_id)
            .map(|payload| Credential {
                owner_user_id: caller_id.to_string(),
                encrypted_token: payload.clone(),
            }))
    }
}

/// Codec that treats the payload as UTF-8 plaintext
pub struct PlainTokenCodec;

impl TokenCodec for PlainTokenCodec {
    fn decrypt(&self, payload: &[u8]) -> Result<String> {
        String::from_utf8(payload.to_vec())
            .map_err(|_| BotError::Validation("token payload is not valid UTF-8".to_string()))
    }
}

#[derive(Default)]
struct IssueBoard {
    issues: HashMap<RepoRef, Vec<IssueDetail>>,
    comments: HashMap<IssueRef, Vec<CommentRecord>>,
    calls: Vec<String>,
    failure: Option<BotError>,
    ignore_close: bool,
}

/// Issue API backed by in-memory repositories.
///
/// Every call is recorded, so tests can assert how many requests a command
/// issued.
#[derive(Default)]
pub struct MemoryIssueApi {
    board: Mutex<IssueBoard>,
}

impl MemoryIssueApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue to a repository
    pub fn add_issue(&self, repo: &RepoRef, number: u64, title: &str, state: IssueState) {
        let detail = IssueDetail {
            number,
            title: title.to_string(),
            author: "octocat".to_string(),
            state: state.as_str().to_string(),
            html_url: format!("https://github.com/{}/issues/{}", repo, number),
            created_at: Utc::now(),
            body: None,
            comment_count: 0,
        };
        lock(&self.board)
            .issues
            .entry(repo.clone())
            .or_default()
            .push(detail);
    }

    /// Replace the comments on an issue
    pub fn set_comments(&self, issue: &IssueRef, comments: Vec<CommentRecord>) {
        lock(&self.board).comments.insert(issue.clone(), comments);
    }

    /// Fail every subsequent call with the given error
    pub fn fail_with(&self, err: BotError) {
        lock(&self.board).failure = Some(err);
    }

    /// Accept close requests but echo the issue back as still open
    pub fn ignore_close_requests(&self) {
        lock(&self.board).ignore_close = true;
    }

    /// Calls made so far, formatted as `METHOD target`
    pub fn calls(&self) -> Vec<String> {
        lock(&self.board).calls.clone()
    }

    /// Comments currently stored for an issue
    pub fn comments(&self, issue: &IssueRef) -> Vec<CommentRecord> {
        lock(&self.board)
            .comments
            .get(issue)
            .cloned()
            .unwrap_or_default()
    }

    fn begin(&self, call: String) -> Result<MutexGuard<'_, IssueBoard>> {
        let mut board = lock(&self.board);
        board.calls.push(call);
        match board.failure.clone() {
            Some(err) => Err(err),
            None => Ok(board),
        }
    }
}

fn not_found() -> BotError {
    BotError::Upstream {
        status: Some(404),
        message: Some("Not Found".to_string()),
    }
}

impl IssueApi for MemoryIssueApi {
    fn list_issues(&self, repo: &RepoRef, state: IssueState) -> Result<Vec<IssueSummary>> {
        let board = self.begin(format!("GET issues {} state={}", repo, state))?;
        Ok(board
            .issues
            .get(repo)
            .map(|issues| {
                issues
                    .iter()
                    .filter(|i| i.state == state.as_str())
                    .map(|i| IssueSummary {
                        number: i.number,
                        title: i.title.clone(),
                        author: i.author.clone(),
                        html_url: i.html_url.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_issue(&self, issue: &IssueRef) -> Result<IssueDetail> {
        let board = self.begin(format!("GET issue {}", issue))?;
        let comment_count = board.comments.get(issue).map_or(0, |c| c.len() as u64);
        board
            .issues
            .get(&issue.repo)
            .and_then(|issues| issues.iter().find(|i| i.number == issue.number))
            .map(|i| IssueDetail {
                comment_count,
                ..i.clone()
            })
            .ok_or_else(not_found)
    }

    fn list_comments(&self, issue: &IssueRef) -> Result<Vec<CommentRecord>> {
        let board = self.begin(format!("GET comments {}", issue))?;
        Ok(board.comments.get(issue).cloned().unwrap_or_default())
    }

    fn close_issue(&self, issue: &IssueRef, _token: &AccessToken) -> Result<()> {
        let mut board = self.begin(format!("PATCH issue {}", issue))?;
        let ignore_close = board.ignore_close;
        let detail = board
            .issues
            .get_mut(&issue.repo)
            .and_then(|issues| issues.iter_mut().find(|i| i.number == issue.number))
            .ok_or_else(not_found)?;
        if ignore_close {
            return Err(BotError::Upstream {
                status: Some(200),
                message: None,
            });
        }
        detail.state = IssueState::Closed.as_str().to_string();
        Ok(())
    }

    fn create_issue(
        &self,
        repo: &RepoRef,
        issue: &NewIssue,
        _token: &AccessToken,
    ) -> Result<CreatedIssue> {
        let mut board = self.begin(format!("POST issues {}", repo))?;
        let issues = board.issues.entry(repo.clone()).or_default();
        let number = issues.iter().map(|i| i.number).max().unwrap_or(0) + 1;
        let html_url = format!("https://github.com/{}/issues/{}", repo, number);
        issues.push(IssueDetail {
            number,
            title: issue.title.clone(),
            author: "octocat".to_string(),
            state: IssueState::Open.as_str().to_string(),
            html_url: html_url.clone(),
            created_at: Utc::now(),
            body: issue.body.clone(),
            comment_count: 0,
        });
        Ok(CreatedIssue {
            number,
            title: issue.title.clone(),
            html_url,
        })
    }

    fn post_comment(&self, issue: &IssueRef, body: &str, _token: &AccessToken) -> Result<()> {
        let mut board = self.begin(format!("POST comments {}", issue))?;
        board
            .comments
            .entry(issue.clone())
            .or_default()
            .push(CommentRecord {
                author: "octocat".to_string(),
                created_at: Utc::now(),
                body: body.to_string(),
            });
        Ok(())
    }
}
