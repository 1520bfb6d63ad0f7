use gitbot_core::BotError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("HTTP error: {0}")]
    Http(#[from] ureq::Error),

    #[error("API error ({status}): {message:?}")]
    Api {
        status: u16,
        message: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, GitHubError>;

impl From<GitHubError> for BotError {
    fn from(err: GitHubError) -> Self {
        match err {
            // Transport and decoding failures carry no upstream status
            GitHubError::Http(_) => BotError::transport(),
            GitHubError::Api { status, message } => BotError::Upstream {
                status: Some(status),
                message,
            },
        }
    }
}
