use crate::bot::IssueBot;
use crate::interaction::{
    comments_button_id, new_issue_modal_id, IssueCommand, BODY_INPUT, TITLE_INPUT,
};
use crate::reply::{Button, Embed, InputStyle, ModalForm, ModalInput, Reply, Response};
use gitbot_core::{
    BotError, CommentPage, Direction, IssueRef, IssueState, NewIssue, PaginationController,
    RepoRef, SessionEvent, MAX_TITLE_LEN,
};
use std::collections::HashMap;
use std::time::Instant;

pub const INVALID_REPO: &str =
    "Invalid repository format. Use `owner/repo` (e.g., `myferr/x3`).";
pub const MISSING_TOKEN: &str =
    "❌ Your GitHub token is missing. Please re-authenticate with `/auth`.";
pub const NO_COMMENTS: &str = "💬 No comments found.";
pub const NO_DESCRIPTION: &str = "No description provided.";
pub const MODAL_TITLE: &str = "Create a New GitHub Issue";
pub const PREV_LABEL: &str = "⏪ Prev";
pub const NEXT_LABEL: &str = "Next ⏩";

pub fn handle_issue(
    bot: &IssueBot,
    interaction_id: &str,
    caller_id: &str,
    command: &IssueCommand,
    now: Instant,
) -> Response {
    match command {
        IssueCommand::Open { repo, issue_id } => {
            handle_show(bot, repo, *issue_id, IssueState::Open)
        }
        IssueCommand::Closed { repo, issue_id } => {
            handle_show(bot, repo, *issue_id, IssueState::Closed)
        }
        IssueCommand::Close { repo, issue_id } => handle_close(bot, caller_id, repo, *issue_id),
        IssueCommand::New { repo } => handle_new(bot, caller_id, repo),
        IssueCommand::Comments { repo, issue_id } => {
            handle_comments(bot, interaction_id, repo, *issue_id, now)
        }
        IssueCommand::Comment {
            repo,
            issue_id,
            text,
        } => handle_comment(bot, caller_id, repo, *issue_id, text),
    }
}

/// Reply for a denied or failed authorization
fn denied(err: &BotError, action: &str) -> Response {
    let text = match err {
        BotError::Unauthenticated => format!(
            "❌ You must link your GitHub account using `/auth` before {}.",
            action
        ),
        BotError::MissingToken => MISSING_TOKEN.to_string(),
        other => format!("❌ {}", other),
    };
    Response::Message(Reply::private(text))
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ==================== Read commands ====================

fn handle_show(bot: &IssueBot, repo: &str, issue_id: Option<u64>, state: IssueState) -> Response {
    let Ok(repo) = RepoRef::parse(repo) else {
        return Response::Message(Reply::text(INVALID_REPO));
    };
    match issue_id {
        None => list_issues(bot, &repo, state),
        Some(number) => show_issue(bot, &repo.issue(number)),
    }
}

fn list_issues(bot: &IssueBot, repo: &RepoRef, state: IssueState) -> Response {
    let issues = match bot.api.list_issues(repo, state) {
        Ok(issues) => issues,
        Err(err) => {
            return Response::Message(Reply::text(format!(
                "Could not fetch {} issues for `{}`. Status: {}",
                state,
                repo,
                err.status_text()
            )))
        }
    };

    if issues.is_empty() {
        return Response::Message(Reply::text(format!(
            "No {} issues found for `{}`.",
            state, repo
        )));
    }

    let embed = issues.iter().fold(
        Embed::new(format!("{} Issues for {}", state.label(), repo)),
        |embed, issue| {
            embed.field(
                format!("#{}: {}", issue.number, issue.title),
                format!("Opened by {} ([Link]({}))", issue.author, issue.html_url),
                false,
            )
        },
    );
    Response::Message(Reply::embed(embed))
}

fn show_issue(bot: &IssueBot, issue: &IssueRef) -> Response {
    let detail = match bot.api.get_issue(issue) {
        Ok(detail) => detail,
        Err(err) => {
            return Response::Message(Reply::text(format!(
                "Could not find issue `#{}` in `{}`. Status: {}",
                issue.number,
                issue.repo,
                err.status_text()
            )))
        }
    };

    let description = detail
        .body
        .as_deref()
        .filter(|body| !body.is_empty())
        .unwrap_or(NO_DESCRIPTION);

    let embed = Embed::new(format!("Issue #{}: {}", detail.number, detail.title))
        .url(&detail.html_url)
        .description(description)
        .field("Repository", issue.repo.to_string(), true)
        .field("Status", capitalize(&detail.state), true)
        .field("Opened By", &detail.author, true)
        .field(
            "Created At",
            detail.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            false,
        )
        .field("Comments", detail.comment_count.to_string(), true);
    Response::Message(Reply::embed(embed))
}

fn handle_comments(
    bot: &IssueBot,
    session_id: &str,
    repo: &str,
    issue_id: u64,
    now: Instant,
) -> Response {
    let Ok(repo) = RepoRef::parse(repo) else {
        return Response::Message(Reply::text(INVALID_REPO));
    };

    let comments = match bot.api.list_comments(&repo.issue(issue_id)) {
        Ok(comments) => comments,
        Err(err) => {
            return Response::Message(Reply::text(format!(
                "❌ Failed to fetch comments. ({})",
                err.status_text()
            )))
        }
    };

    let Some(controller) = PaginationController::new(comments, bot.page_size) else {
        return Response::Message(Reply::text(NO_COMMENTS));
    };

    let page = bot.sessions.open(session_id, controller, now);
    Response::Message(render_comment_page(session_id, &page))
}

/// Apply a button press to a comment session
pub fn handle_navigation(
    bot: &IssueBot,
    session_id: &str,
    direction: Direction,
    now: Instant,
) -> Response {
    match bot.sessions.navigate(session_id, direction, now) {
        SessionEvent::Rendered(page) | SessionEvent::Expired(page) => {
            Response::Update(render_comment_page(session_id, &page))
        }
        SessionEvent::Acknowledged | SessionEvent::Missing => Response::Acknowledge,
    }
}

/// Embed and navigation buttons for a comment page
pub fn render_comment_page(session_id: &str, page: &CommentPage) -> Reply {
    let embed = page
        .entries
        .iter()
        .fold(Embed::new(page.title()), |embed, entry| {
            embed.field(&entry.label, &entry.body, false)
        })
        .footer(page.footer());

    Reply::embed(embed).with_buttons(vec![
        Button {
            custom_id: comments_button_id(session_id, Direction::Prev),
            label: PREV_LABEL.to_string(),
            disabled: !page.can_go_prev,
        },
        Button {
            custom_id: comments_button_id(session_id, Direction::Next),
            label: NEXT_LABEL.to_string(),
            disabled: !page.can_go_next,
        },
    ])
}

// ==================== Mutating commands ====================

fn handle_close(bot: &IssueBot, caller_id: &str, repo: &str, issue_id: u64) -> Response {
    let Ok(repo) = RepoRef::parse(repo) else {
        return Response::Message(Reply::private(INVALID_REPO));
    };
    let token = match bot.gate().authorize(caller_id) {
        Ok(token) => token,
        Err(err) => return denied(&err, "closing issues"),
    };

    let text = match bot.api.close_issue(&repo.issue(issue_id), &token) {
        Ok(()) => format!("✅ Issue #{} has been closed.", issue_id),
        Err(err) => format!(
            "❌ Failed to close issue #{}: {}",
            issue_id,
            err.upstream_message()
        ),
    };
    Response::Message(Reply::private(text))
}

fn handle_new(bot: &IssueBot, caller_id: &str, repo: &str) -> Response {
    let Ok(repo) = RepoRef::parse(repo) else {
        return Response::Message(Reply::private(INVALID_REPO));
    };
    // Only checks that a usable token exists; submission authorizes again
    if let Err(err) = bot.gate().authorize(caller_id) {
        return denied(&err, "creating issues");
    }
    Response::Modal(new_issue_form(&repo))
}

/// Issue creation form for a repository
pub fn new_issue_form(repo: &RepoRef) -> ModalForm {
    ModalForm {
        custom_id: new_issue_modal_id(&repo.to_string()),
        title: MODAL_TITLE.to_string(),
        inputs: vec![
            ModalInput {
                custom_id: TITLE_INPUT.to_string(),
                label: "Title".to_string(),
                placeholder: "Issue title".to_string(),
                style: InputStyle::Short,
                required: true,
                max_length: Some(MAX_TITLE_LEN),
            },
            ModalInput {
                custom_id: BODY_INPUT.to_string(),
                label: "Body".to_string(),
                placeholder: "Describe the issue".to_string(),
                style: InputStyle::Paragraph,
                required: false,
                max_length: None,
            },
        ],
    }
}

/// Handle a submitted issue creation form
pub fn handle_new_issue_submit(
    bot: &IssueBot,
    caller_id: &str,
    repo: &str,
    fields: &HashMap<String, String>,
) -> Response {
    let Ok(repo) = RepoRef::parse(repo) else {
        return Response::Message(Reply::private(INVALID_REPO));
    };
    let title = fields.get(TITLE_INPUT).map(String::as_str).unwrap_or("");
    let issue = match NewIssue::new(title, fields.get(BODY_INPUT).map(String::as_str)) {
        Ok(issue) => issue,
        Err(err) => return validation_reply(&err),
    };
    let token = match bot.gate().authorize(caller_id) {
        Ok(token) => token,
        Err(err) => return denied(&err, "creating issues"),
    };

    let text = match bot.api.create_issue(&repo, &issue, &token) {
        Ok(created) => format!("✅ Issue created: [{}]({})", created.title, created.html_url),
        Err(err) => format!("❌ Failed to create issue: {}", err.upstream_message()),
    };
    Response::Message(Reply::private(text))
}

fn handle_comment(
    bot: &IssueBot,
    caller_id: &str,
    repo: &str,
    issue_id: u64,
    text: &str,
) -> Response {
    let Ok(repo) = RepoRef::parse(repo) else {
        return Response::Message(Reply::private(INVALID_REPO));
    };
    if text.trim().is_empty() {
        return validation_reply(&BotError::Validation(
            "Comment text is required".to_string(),
        ));
    }
    let token = match bot.gate().authorize(caller_id) {
        Ok(token) => token,
        Err(err) => return denied(&err, "commenting"),
    };

    let reply = match bot.api.post_comment(&repo.issue(issue_id), text, &token) {
        Ok(()) => "✅ Comment posted successfully.".to_string(),
        Err(err) => format!(
            "❌ Failed to post comment: {} ({})",
            err.upstream_message(),
            err.status_text()
        ),
    };
    Response::Message(Reply::private(reply))
}

fn validation_reply(err: &BotError) -> Response {
    let text = match err {
        BotError::Validation(message) => format!("❌ {}.", message),
        other => format!("❌ {}", other),
    };
    Response::Message(Reply::private(text))
}
