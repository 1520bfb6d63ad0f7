use thiserror::Error;

/// Fallback text when upstream gives no usable message
pub const UNKNOWN_ERROR: &str = "Unknown error.";

/// Errors surfaced by issue commands
///
/// Every variant is turned into a user-facing reply at the command boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BotError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No linked GitHub account")]
    Unauthenticated,

    #[error("Linked GitHub token is missing or unusable")]
    MissingToken,

    #[error("Upstream error (status {status:?}): {message:?}")]
    Upstream {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("Credential store error: {0}")]
    CredentialStore(String),
}

impl BotError {
    /// Transport-level failure with neither a status nor a message
    pub fn transport() -> Self {
        BotError::Upstream {
            status: None,
            message: None,
        }
    }

    /// Message reported by upstream, or the generic fallback
    pub fn upstream_message(&self) -> &str {
        match self {
            BotError::Upstream {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message,
            _ => UNKNOWN_ERROR,
        }
    }

    /// Status code as shown to users
    pub fn status_text(&self) -> String {
        match self {
            BotError::Upstream {
                status: Some(status),
                ..
            } => status.to_string(),
            _ => UNKNOWN_ERROR.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
