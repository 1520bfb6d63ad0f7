//! Implementation of gitbot-core traits for GitHubClient

use gitbot_core::{
    AccessToken, BotError, CommentRecord, CreatedIssue, IssueApi, IssueDetail, IssueRef,
    IssueState, IssueSummary, NewIssue, RepoRef, Result,
};

use crate::client::GitHubClient;
use crate::convert::create_issue_from_core;
use crate::models::UpdateGitHubIssue;

impl IssueApi for GitHubClient {
    fn list_issues(&self, repo: &RepoRef, state: IssueState) -> Result<Vec<IssueSummary>> {
        let issues = self
            .list_issues(&repo.owner, &repo.name, state.as_str())
            .map_err(BotError::from)?;
        Ok(issues.into_iter().map(Into::into).collect())
    }

    fn get_issue(&self, issue: &IssueRef) -> Result<IssueDetail> {
        self.get_issue(issue.owner(), issue.repo_name(), issue.number)
            .map(Into::into)
            .map_err(BotError::from)
    }

    fn list_comments(&self, issue: &IssueRef) -> Result<Vec<CommentRecord>> {
        let comments = self
            .get_comments(issue.owner(), issue.repo_name(), issue.number)
            .map_err(BotError::from)?;
        Ok(comments.into_iter().map(Into::into).collect())
    }

    fn close_issue(&self, issue: &IssueRef, token: &AccessToken) -> Result<()> {
        let updated = self
            .update_issue(
                issue.owner(),
                issue.repo_name(),
                issue.number,
                &UpdateGitHubIssue::close(),
                token.expose(),
            )
            .map_err(BotError::from)?;

        // A 2xx that still reports the issue open is not a success
        if !updated.is_closed() {
            tracing::warn!(issue = %issue, state = %updated.state, "close request not applied");
            return Err(BotError::Upstream {
                status: Some(200),
                message: None,
            });
        }
        Ok(())
    }

    fn create_issue(
        &self,
        repo: &RepoRef,
        issue: &NewIssue,
        token: &AccessToken,
    ) -> Result<CreatedIssue> {
        self.create_issue(
            &repo.owner,
            &repo.name,
            &create_issue_from_core(issue),
            token.expose(),
        )
        .map(Into::into)
        .map_err(BotError::from)
    }

    fn post_comment(&self, issue: &IssueRef, body: &str, token: &AccessToken) -> Result<()> {
        self.add_comment(
            issue.owner(),
            issue.repo_name(),
            issue.number,
            body,
            token.expose(),
        )
        .map(|_| ())
        .map_err(BotError::from)
    }
}
