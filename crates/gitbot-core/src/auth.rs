//! Authorization gate for mutating issue commands

use crate::error::{BotError, Result};
use crate::models::AccessToken;
use crate::traits::{CredentialStore, TokenCodec};

/// Resolves a caller's linked GitHub token before any mutating request.
///
/// Holds no state beyond its collaborators: every call reads the store
/// fresh and the returned token is never cached.
pub struct AuthorizedActionGate<'a> {
    store: &'a dyn CredentialStore,
    codec: &'a dyn TokenCodec,
}

impl<'a> AuthorizedActionGate<'a> {
    pub fn new(store: &'a dyn CredentialStore, codec: &'a dyn TokenCodec) -> Self {
        Self { store, codec }
    }

    /// Resolve the caller's plaintext token.
    ///
    /// * no stored credential: [`BotError::Unauthenticated`]
    /// * stored credential without a token: [`BotError::MissingToken`]
    /// * token that fails to decrypt or decrypts to nothing: [`BotError::MissingToken`]
    pub fn authorize(&self, caller_id: &str) -> Result<AccessToken> {
        let credential = match self.store.find(caller_id)? {
            Some(credential) => credential,
            None => {
                tracing::debug!(caller = caller_id, "no linked credential");
                return Err(BotError::Unauthenticated);
            }
        };

        let payload = match credential.encrypted_token {
            Some(payload) if !payload.is_empty() => payload,
            _ => {
                tracing::debug!(caller = caller_id, "linked credential has no token");
                return Err(BotError::MissingToken);
            }
        };

        match self.codec.decrypt(&payload) {
            Ok(plaintext) if !plaintext.trim().is_empty() => Ok(AccessToken::new(plaintext)),
            Ok(_) => {
                tracing::warn!(caller = caller_id, "linked token decrypted to an empty value");
                Err(BotError::MissingToken)
            }
            Err(err) => {
                tracing::warn!(caller = caller_id, error = %err, "linked token could not be decrypted");
                Err(BotError::MissingToken)
            }
        }
    }
}
