//! Inbound interactions and the custom ids that route them back

use gitbot_core::Direction;
use std::collections::HashMap;

const COMMENTS_PREFIX: &str = "comments:";
const NEW_ISSUE_PREFIX: &str = "issue_new:";

/// Form input ids of the issue creation modal
pub const TITLE_INPUT: &str = "title";
pub const BODY_INPUT: &str = "body";

/// Commands of the `issue` group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueCommand {
    /// List open issues, or show one
    Open { repo: String, issue_id: Option<u64> },
    /// List closed issues, or show one
    Closed { repo: String, issue_id: Option<u64> },
    /// Close an issue
    Close { repo: String, issue_id: u64 },
    /// Open the issue creation form
    New { repo: String },
    /// Browse the comments on an issue
    Comments { repo: String, issue_id: u64 },
    /// Post a comment on an issue
    Comment {
        repo: String,
        issue_id: u64,
        text: String,
    },
}

impl IssueCommand {
    pub fn name(&self) -> &'static str {
        match self {
            IssueCommand::Open { .. } => "open",
            IssueCommand::Closed { .. } => "closed",
            IssueCommand::Close { .. } => "close",
            IssueCommand::New { .. } => "new",
            IssueCommand::Comments { .. } => "comments",
            IssueCommand::Comment { .. } => "comment",
        }
    }
}

/// One user-triggered event from the chat platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Slash command invocation
    Command {
        interaction_id: String,
        caller_id: String,
        command: IssueCommand,
    },
    /// Button press on a message the bot sent
    Component { caller_id: String, custom_id: String },
    /// Submission of a modal form
    ModalSubmit {
        caller_id: String,
        custom_id: String,
        fields: HashMap<String, String>,
    },
}

impl Interaction {
    pub fn caller_id(&self) -> &str {
        match self {
            Interaction::Command { caller_id, .. }
            | Interaction::Component { caller_id, .. }
            | Interaction::ModalSubmit { caller_id, .. } => caller_id,
        }
    }
}

/// Custom id of a comment page button
pub fn comments_button_id(session_id: &str, direction: Direction) -> String {
    format!("{}{}:{}", COMMENTS_PREFIX, session_id, direction.as_str())
}

/// Parse a comment page button id into its session and direction
pub fn parse_comments_button_id(custom_id: &str) -> Option<(&str, Direction)> {
    let rest = custom_id.strip_prefix(COMMENTS_PREFIX)?;
    let (session_id, direction) = rest.rsplit_once(':')?;
    if session_id.is_empty() {
        return None;
    }
    Some((session_id, Direction::parse(direction)?))
}

/// Custom id of the issue creation form for a repository
pub fn new_issue_modal_id(repo: &str) -> String {
    format!("{}{}", NEW_ISSUE_PREFIX, repo)
}

/// Repository named by an issue creation form id
pub fn parse_new_issue_modal_id(custom_id: &str) -> Option<&str> {
    custom_id.strip_prefix(NEW_ISSUE_PREFIX)
}
