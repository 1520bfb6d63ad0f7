//! Interaction dispatch

use crate::commands::issue::{handle_issue, handle_navigation, handle_new_issue_submit};
use crate::interaction::{parse_comments_button_id, parse_new_issue_modal_id, Interaction};
use crate::reply::Response;
use gitbot_core::{
    AuthorizedActionGate, CredentialStore, IssueApi, PaginationSessions, TokenCodec,
    DEFAULT_PAGE_SIZE,
};
use std::time::{Duration, Instant};

/// Issue command handler shared by every interaction.
///
/// Holds the GitHub API, the credential lookup collaborators and the comment
/// pagination sessions. It is `Send + Sync`, so one instance can serve
/// interactions from many threads.
pub struct IssueBot {
    pub(crate) api: Box<dyn IssueApi>,
    store: Box<dyn CredentialStore>,
    codec: Box<dyn TokenCodec>,
    pub(crate) sessions: PaginationSessions,
    pub(crate) page_size: usize,
}

impl IssueBot {
    pub fn new(
        api: Box<dyn IssueApi>,
        store: Box<dyn CredentialStore>,
        codec: Box<dyn TokenCodec>,
    ) -> Self {
        Self {
            api,
            store,
            codec,
            sessions: PaginationSessions::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Comments shown per page; zero falls back to the default
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        self
    }

    /// Inactivity timeout of comment sessions
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.sessions = PaginationSessions::new(timeout);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn sessions(&self) -> &PaginationSessions {
        &self.sessions
    }

    pub(crate) fn gate(&self) -> AuthorizedActionGate<'_> {
        AuthorizedActionGate::new(self.store.as_ref(), self.codec.as_ref())
    }

    /// Handle one interaction
    pub fn handle(&self, interaction: &Interaction) -> Response {
        self.handle_at(interaction, Instant::now())
    }

    /// Handle one interaction as if it arrived at `now`
    pub fn handle_at(&self, interaction: &Interaction, now: Instant) -> Response {
        match interaction {
            Interaction::Command {
                interaction_id,
                caller_id,
                command,
            } => {
                tracing::info!(
                    command = command.name(),
                    caller = caller_id.as_str(),
                    "issue command"
                );
                handle_issue(self, interaction_id, caller_id, command, now)
            }
            Interaction::Component { custom_id, .. } => match parse_comments_button_id(custom_id)
            {
                Some((session_id, direction)) => {
                    tracing::debug!(
                        caller = interaction.caller_id(),
                        session = session_id,
                        direction = direction.as_str(),
                        "page button pressed"
                    );
                    handle_navigation(self, session_id, direction, now)
                }
                None => {
                    tracing::debug!(custom_id = custom_id.as_str(), "unknown component");
                    Response::Acknowledge
                }
            },
            Interaction::ModalSubmit {
                caller_id,
                custom_id,
                fields,
            } => match parse_new_issue_modal_id(custom_id) {
                Some(repo) => {
                    tracing::info!(caller = caller_id.as_str(), repo, "issue form submitted");
                    handle_new_issue_submit(self, caller_id, repo, fields)
                }
                None => {
                    tracing::debug!(custom_id = custom_id.as_str(), "unknown form");
                    Response::Acknowledge
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::issue::{INVALID_REPO, MISSING_TOKEN, MODAL_TITLE, NO_COMMENTS};
    use crate::interaction::{comments_button_id, IssueCommand, BODY_INPUT, TITLE_INPUT};
    use crate::reply::Reply;
    use chrono::{TimeZone, Utc};
    use gitbot_core::memory::{MemoryCredentialStore, MemoryIssueApi, PlainTokenCodec};
    use gitbot_core::{BotError, CommentRecord, Direction, IssueState, RepoRef};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct Fixture {
        bot: IssueBot,
        api: Arc<MemoryIssueApi>,
        store: Arc<MemoryCredentialStore>,
    }

    fn fixture() -> Fixture {
        let api = Arc::new(MemoryIssueApi::new());
        let store = Arc::new(MemoryCredentialStore::new());
        store.insert("linked", b"ghp_secret".to_vec());
        let bot = IssueBot::new(
            Box::new(api.clone()),
            Box::new(store.clone()),
            Box::new(PlainTokenCodec),
        );
        Fixture { bot, api, store }
    }

    fn repo() -> RepoRef {
        RepoRef::parse("a/b").unwrap()
    }

    fn command(caller: &str, command: IssueCommand) -> Interaction {
        Interaction::Command {
            interaction_id: "1001".to_string(),
            caller_id: caller.to_string(),
            command,
        }
    }

    fn press(session: &str, direction: Direction) -> Interaction {
        Interaction::Component {
            caller_id: "viewer".to_string(),
            custom_id: comments_button_id(session, direction),
        }
    }

    fn submit(caller: &str, title: &str, body: &str) -> Interaction {
        let mut fields = HashMap::new();
        fields.insert(TITLE_INPUT.to_string(), title.to_string());
        fields.insert(BODY_INPUT.to_string(), body.to_string());
        Interaction::ModalSubmit {
            caller_id: caller.to_string(),
            custom_id: "issue_new:a/b".to_string(),
            fields,
        }
    }

    fn message(response: Response) -> Reply {
        match response {
            Response::Message(reply) => reply,
            other => panic!("expected message, got {:?}", other),
        }
    }

    fn content(response: Response) -> String {
        message(response).content.unwrap_or_default()
    }

    fn comments(count: usize) -> Vec<CommentRecord> {
        (1..=count)
            .map(|i| CommentRecord {
                author: format!("user{}", i),
                created_at: Utc.with_ymd_and_hms(2024, 3, i as u32, 8, 0, 0).unwrap(),
                body: format!("comment {}", i),
            })
            .collect()
    }

    // ==================== Read commands ====================

    #[test]
    fn invalid_repo_makes_no_calls() {
        let f = fixture();
        for cmd in [
            IssueCommand::Open {
                repo: "invalid".to_string(),
                issue_id: None,
            },
            IssueCommand::Comments {
                repo: "a/b/c".to_string(),
                issue_id: 1,
            },
            IssueCommand::Close {
                repo: "/b".to_string(),
                issue_id: 1,
            },
        ] {
            assert_eq!(content(f.bot.handle(&command("linked", cmd))), INVALID_REPO);
        }
        assert!(f.api.calls().is_empty());
        assert_eq!(f.store.lookups(), 0);
    }

    #[test]
    fn open_lists_issues_publicly() {
        let f = fixture();
        f.api.add_issue(&repo(), 1, "First", IssueState::Open);
        f.api.add_issue(&repo(), 2, "Second", IssueState::Closed);

        let reply = message(f.bot.handle(&command(
            "anyone",
            IssueCommand::Open {
                repo: "a/b".to_string(),
                issue_id: None,
            },
        )));

        assert!(!reply.ephemeral);
        let embed = reply.embed.unwrap();
        assert_eq!(embed.title, "Open Issues for a/b");
        assert_eq!(embed.fields.len(), 1);
        assert_eq!(embed.fields[0].name, "#1: First");
        assert_eq!(
            embed.fields[0].value,
            "Opened by octocat ([Link](https://github.com/a/b/issues/1))"
        );
        assert_eq!(f.api.calls(), vec!["GET issues a/b state=open"]);
    }

    #[test]
    fn empty_listing_says_so() {
        let f = fixture();
        let text = content(f.bot.handle(&command(
            "anyone",
            IssueCommand::Closed {
                repo: "a/b".to_string(),
                issue_id: None,
            },
        )));
        assert_eq!(text, "No closed issues found for `a/b`.");
    }

    #[test]
    fn listing_failure_reports_status() {
        let f = fixture();
        f.api.fail_with(BotError::Upstream {
            status: Some(404),
            message: Some("Not Found".to_string()),
        });
        let text = content(f.bot.handle(&command(
            "anyone",
            IssueCommand::Open {
                repo: "a/b".to_string(),
                issue_id: None,
            },
        )));
        assert_eq!(text, "Could not fetch open issues for `a/b`. Status: 404");
    }

    #[test]
    fn single_issue_shows_detail() {
        let f = fixture();
        f.api.add_issue(&repo(), 7, "Broken", IssueState::Closed);
        f.api.set_comments(&repo().issue(7), comments(3));

        let reply = message(f.bot.handle(&command(
            "anyone",
            IssueCommand::Open {
                repo: "a/b".to_string(),
                issue_id: Some(7),
            },
        )));

        let embed = reply.embed.unwrap();
        assert_eq!(embed.title, "Issue #7: Broken");
        assert_eq!(embed.url.as_deref(), Some("https://github.com/a/b/issues/7"));
        assert_eq!(embed.description.as_deref(), Some("No description provided."));
        let fields: Vec<_> = embed
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(fields[0], ("Repository", "a/b"));
        assert_eq!(fields[1], ("Status", "Closed"));
        assert_eq!(fields[2], ("Opened By", "octocat"));
        assert_eq!(fields[3].0, "Created At");
        assert!(fields[3].1.ends_with(" UTC"));
        assert_eq!(fields[4], ("Comments", "3"));
    }

    #[test]
    fn missing_issue_reports_status() {
        let f = fixture();
        let text = content(f.bot.handle(&command(
            "anyone",
            IssueCommand::Open {
                repo: "a/b".to_string(),
                issue_id: Some(99),
            },
        )));
        assert_eq!(text, "Could not find issue `#99` in `a/b`. Status: 404");
    }

    // ==================== Close ====================

    #[test]
    fn close_requires_linked_account() {
        let f = fixture();
        f.api.add_issue(&repo(), 5, "Bug", IssueState::Open);

        let reply = message(f.bot.handle(&command(
            "stranger",
            IssueCommand::Close {
                repo: "a/b".to_string(),
                issue_id: 5,
            },
        )));

        assert!(reply.ephemeral);
        assert_eq!(
            reply.content.as_deref(),
            Some("❌ You must link your GitHub account using `/auth` before closing issues.")
        );
        assert!(f.api.calls().is_empty());
    }

    #[test]
    fn close_with_empty_token_is_missing_token() {
        let f = fixture();
        f.store.insert_without_token("half");
        let text = content(f.bot.handle(&command(
            "half",
            IssueCommand::Close {
                repo: "a/b".to_string(),
                issue_id: 5,
            },
        )));
        assert_eq!(text, MISSING_TOKEN);
    }

    #[test]
    fn close_succeeds_when_echoed_closed() {
        let f = fixture();
        f.api.add_issue(&repo(), 5, "Bug", IssueState::Open);

        let reply = message(f.bot.handle(&command(
            "linked",
            IssueCommand::Close {
                repo: "a/b".to_string(),
                issue_id: 5,
            },
        )));

        assert!(reply.ephemeral);
        assert_eq!(reply.content.as_deref(), Some("✅ Issue #5 has been closed."));
        assert_eq!(f.api.calls(), vec!["PATCH issue a/b#5"]);
    }

    #[test]
    fn close_fails_when_echoed_open() {
        let f = fixture();
        f.api.add_issue(&repo(), 5, "Bug", IssueState::Open);
        f.api.ignore_close_requests();

        let text = content(f.bot.handle(&command(
            "linked",
            IssueCommand::Close {
                repo: "a/b".to_string(),
                issue_id: 5,
            },
        )));
        assert_eq!(text, "❌ Failed to close issue #5: Unknown error.");
    }

    #[test]
    fn close_reports_upstream_message() {
        let f = fixture();
        f.api.fail_with(BotError::Upstream {
            status: Some(403),
            message: Some("Must have admin rights to Repository.".to_string()),
        });
        let text = content(f.bot.handle(&command(
            "linked",
            IssueCommand::Close {
                repo: "a/b".to_string(),
                issue_id: 5,
            },
        )));
        assert_eq!(
            text,
            "❌ Failed to close issue #5: Must have admin rights to Repository."
        );
    }

    // ==================== New issue form ====================

    #[test]
    fn new_opens_form_for_linked_user() {
        let f = fixture();
        let response = f.bot.handle(&command(
            "linked",
            IssueCommand::New {
                repo: "a/b".to_string(),
            },
        ));
        match response {
            Response::Modal(form) => {
                assert_eq!(form.title, MODAL_TITLE);
                assert_eq!(form.custom_id, "issue_new:a/b");
                assert_eq!(form.inputs.len(), 2);
                assert!(form.inputs[0].required);
                assert_eq!(form.inputs[0].max_length, Some(256));
                assert!(!form.inputs[1].required);
            }
            other => panic!("expected modal, got {:?}", other),
        }
        assert!(f.api.calls().is_empty());
    }

    #[test]
    fn new_denies_unlinked_user() {
        let f = fixture();
        let text = content(f.bot.handle(&command(
            "stranger",
            IssueCommand::New {
                repo: "a/b".to_string(),
            },
        )));
        assert_eq!(
            text,
            "❌ You must link your GitHub account using `/auth` before creating issues."
        );
    }

    #[test]
    fn form_submit_creates_issue() {
        let f = fixture();
        f.api.add_issue(&repo(), 3, "Existing", IssueState::Open);

        let reply = message(f.bot.handle(&submit("linked", "  New bug ", "")));

        assert!(reply.ephemeral);
        assert_eq!(
            reply.content.as_deref(),
            Some("✅ Issue created: [New bug](https://github.com/a/b/issues/4)")
        );
        assert_eq!(f.api.calls(), vec!["POST issues a/b"]);
    }

    #[test]
    fn form_submit_authorizes_again() {
        let f = fixture();
        assert!(matches!(
            f.bot.handle(&command(
                "linked",
                IssueCommand::New {
                    repo: "a/b".to_string()
                }
            )),
            Response::Modal(_)
        ));
        f.bot.handle(&submit("linked", "Title", "Body"));
        assert_eq!(f.store.lookups(), 2);
    }

    #[test]
    fn form_submit_rejects_blank_title() {
        let f = fixture();
        let reply = message(f.bot.handle(&submit("linked", "   ", "Body")));
        assert!(reply.ephemeral);
        assert_eq!(reply.content.as_deref(), Some("❌ Issue title is required."));
        assert!(f.api.calls().is_empty());
    }

    #[test]
    fn form_submit_reports_failure() {
        let f = fixture();
        f.api.fail_with(BotError::Upstream {
            status: Some(410),
            message: Some("Issues are disabled for this repo".to_string()),
        });
        let text = content(f.bot.handle(&submit("linked", "Title", "")));
        assert_eq!(
            text,
            "❌ Failed to create issue: Issues are disabled for this repo"
        );
    }

    // ==================== Comments ====================

    #[test]
    fn comments_paginate_with_buttons() {
        let f = fixture();
        f.api.set_comments(&repo().issue(42), comments(7));
        let start = Instant::now();

        let reply = message(f.bot.handle_at(
            &command(
                "anyone",
                IssueCommand::Comments {
                    repo: "a/b".to_string(),
                    issue_id: 42,
                },
            ),
            start,
        ));

        assert!(!reply.ephemeral);
        let embed = reply.embed.unwrap();
        assert_eq!(embed.title, "💬 Comments - Page 1/2");
        assert_eq!(embed.footer.as_deref(), Some("Showing 1-5 of 7"));
        assert_eq!(embed.fields.len(), 5);
        assert_eq!(embed.fields[0].name, "user1 - 2024-03-01");
        assert_eq!(reply.buttons.len(), 2);
        assert!(reply.buttons[0].disabled);
        assert!(!reply.buttons[1].disabled);

        let next = f.bot.handle_at(&press("1001", Direction::Next), start);
        let Response::Update(updated) = next else {
            panic!("expected update");
        };
        let embed = updated.embed.unwrap();
        assert_eq!(embed.footer.as_deref(), Some("Showing 6-7 of 7"));
        assert_eq!(embed.fields.len(), 2);
        assert!(!updated.buttons[0].disabled);
        assert!(updated.buttons[1].disabled);

        // Already on the last page
        assert_eq!(
            f.bot.handle_at(&press("1001", Direction::Next), start),
            Response::Acknowledge
        );
    }

    #[test]
    fn expired_session_disables_buttons() {
        let f = fixture();
        let bot = f.bot.with_session_timeout(Duration::from_secs(60));
        f.api.set_comments(&repo().issue(1), comments(7));
        let start = Instant::now();

        bot.handle_at(
            &command(
                "anyone",
                IssueCommand::Comments {
                    repo: "a/b".to_string(),
                    issue_id: 1,
                },
            ),
            start,
        );
        let later = start + Duration::from_secs(61);

        let Response::Update(reply) = bot.handle_at(&press("1001", Direction::Next), later) else {
            panic!("expected update");
        };
        assert!(reply.buttons.iter().all(|b| b.disabled));
        assert_eq!(
            reply.embed.unwrap().footer.as_deref(),
            Some("Showing 1-5 of 7")
        );
        assert!(bot.sessions().is_empty());
        assert_eq!(
            bot.handle_at(&press("1001", Direction::Next), later),
            Response::Acknowledge
        );
    }

    #[test]
    fn idle_sessions_are_dropped_when_a_new_browser_opens() {
        let f = fixture();
        let bot = f.bot.with_session_timeout(Duration::from_secs(300));
        f.api.set_comments(&repo().issue(1), comments(7));
        let start = Instant::now();
        let open_comments = |id: usize| Interaction::Command {
            interaction_id: id.to_string(),
            caller_id: "anyone".to_string(),
            command: IssueCommand::Comments {
                repo: "a/b".to_string(),
                issue_id: 1,
            },
        };

        for id in 0..100 {
            bot.handle_at(&open_comments(id), start);
        }
        assert_eq!(bot.sessions().len(), 100);

        bot.handle_at(&open_comments(100), start + Duration::from_secs(3600));
        assert_eq!(bot.sessions().len(), 1);
    }

    #[test]
    fn comments_use_configured_page_size() {
        let f = fixture();
        let bot = f.bot.with_page_size(3);
        assert_eq!(bot.page_size(), 3);
        f.api.set_comments(&repo().issue(1), comments(7));

        let reply = message(bot.handle(&command(
            "anyone",
            IssueCommand::Comments {
                repo: "a/b".to_string(),
                issue_id: 1,
            },
        )));
        let embed = reply.embed.unwrap();
        assert_eq!(embed.title, "💬 Comments - Page 1/3");
        assert_eq!(embed.footer.as_deref(), Some("Showing 1-3 of 7"));

        assert_eq!(bot.with_page_size(0).page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn comments_empty_and_failure() {
        let f = fixture();
        let text = content(f.bot.handle(&command(
            "anyone",
            IssueCommand::Comments {
                repo: "a/b".to_string(),
                issue_id: 9,
            },
        )));
        assert_eq!(text, NO_COMMENTS);
        assert!(f.bot.sessions().is_empty());

        f.api.fail_with(BotError::transport());
        let text = content(f.bot.handle(&command(
            "anyone",
            IssueCommand::Comments {
                repo: "a/b".to_string(),
                issue_id: 9,
            },
        )));
        assert_eq!(text, "❌ Failed to fetch comments. (Unknown error.)");
    }

    #[test]
    fn unknown_components_are_acknowledged() {
        let f = fixture();
        for custom_id in ["comments:nope:next", "something-else"] {
            let press = Interaction::Component {
                caller_id: "viewer".to_string(),
                custom_id: custom_id.to_string(),
            };
            assert_eq!(f.bot.handle(&press), Response::Acknowledge);
        }
    }

    // ==================== Comment ====================

    #[test]
    fn comment_posts_with_token() {
        let f = fixture();
        f.api.add_issue(&repo(), 2, "Bug", IssueState::Open);
        let reply = message(f.bot.handle(&command(
            "linked",
            IssueCommand::Comment {
                repo: "a/b".to_string(),
                issue_id: 2,
                text: "Looking into it".to_string(),
            },
        )));
        assert!(reply.ephemeral);
        assert_eq!(reply.content.as_deref(), Some("✅ Comment posted successfully."));
        let posted = f.api.comments(&repo().issue(2));
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].body, "Looking into it");
    }

    #[test]
    fn blank_comment_is_rejected_without_calls() {
        let f = fixture();
        let text = content(f.bot.handle(&command(
            "linked",
            IssueCommand::Comment {
                repo: "a/b".to_string(),
                issue_id: 2,
                text: "  ".to_string(),
            },
        )));
        assert_eq!(text, "❌ Comment text is required.");
        assert!(f.api.calls().is_empty());
        assert_eq!(f.store.lookups(), 0);
    }

    #[test]
    fn comment_failure_reports_message_and_status() {
        let f = fixture();
        f.api.fail_with(BotError::Upstream {
            status: Some(404),
            message: Some("Not Found".to_string()),
        });
        let text = content(f.bot.handle(&command(
            "linked",
            IssueCommand::Comment {
                repo: "a/b".to_string(),
                issue_id: 2,
                text: "hi".to_string(),
            },
        )));
        assert_eq!(text, "❌ Failed to post comment: Not Found (404)");
    }

    #[test]
    fn comment_denied_without_link() {
        let f = fixture();
        let text = content(f.bot.handle(&command(
            "stranger",
            IssueCommand::Comment {
                repo: "a/b".to_string(),
                issue_id: 2,
                text: "hi".to_string(),
            },
        )));
        assert_eq!(
            text,
            "❌ You must link your GitHub account using `/auth` before commenting."
        );
    }

    #[test]
    fn bot_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IssueBot>();
    }
}
