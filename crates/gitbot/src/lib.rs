//! Chat-platform-neutral GitHub issue commands
//!
//! [`IssueBot`] turns an [`Interaction`] (slash command, button press or
//! form submission) into a [`Response`] the platform can render.

pub mod bot;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod interaction;
pub mod reply;

pub use bot::IssueBot;
pub use config::Config;
pub use credentials::{AesGcmTokenCodec, FileCredentialStore};
pub use interaction::{Interaction, IssueCommand};
pub use reply::{Button, Embed, EmbedField, ModalForm, ModalInput, Reply, Response};
