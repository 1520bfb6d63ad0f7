pub mod auth;
pub mod error;
pub mod memory;
pub mod models;
pub mod pagination;
pub mod session;
pub mod traits;

pub use auth::AuthorizedActionGate;
pub use error::{BotError, Result, UNKNOWN_ERROR};
pub use models::*;
pub use pagination::{
    CommentPage, Direction, Navigation, PageEntry, PaginationController, DEFAULT_PAGE_SIZE,
};
pub use session::{PaginationSessions, SessionEvent, DEFAULT_SESSION_TIMEOUT};
pub use traits::{CredentialStore, IssueApi, TokenCodec};
