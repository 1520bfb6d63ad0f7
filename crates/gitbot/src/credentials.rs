//! Linked GitHub tokens: on-disk store and AES-256-GCM codec
//!
//! The store file maps chat user ids to base64 token payloads:
//!
//! ```json
//! { "users": { "1234": "base64(nonce || ciphertext)" } }
//! ```
//!
//! A user present with a `null` payload is linked but has no token.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng, Payload},
    Aes256Gcm,
};
use anyhow::{anyhow, bail, Context};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use gitbot_core::{BotError, Credential, CredentialStore, TokenCodec};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const NONCE_BYTES: usize = 12;
const TOKEN_AAD: &[u8] = b"gitbot-token-v1";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    users: BTreeMap<String, Option<String>>,
}

/// Credential store backed by a JSON file
///
/// The file is read on every lookup, so links made by another process are
/// seen immediately.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> anyhow::Result<CredentialFile> {
        if !self.path.exists() {
            return Ok(CredentialFile::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(CredentialFile::default());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn save(&self, file: &CredentialFile) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// Link a user to an encrypted token payload, replacing any previous link
    pub fn link(&self, caller_id: &str, payload: &[u8]) -> anyhow::Result<()> {
        let mut file = self.load()?;
        file.users.insert(
            caller_id.to_string(),
            Some(BASE64_STANDARD.encode(payload)),
        );
        self.save(&file)?;
        tracing::info!(caller = caller_id, "linked GitHub token");
        Ok(())
    }

    /// Remove a user's link, returning whether one existed
    pub fn unlink(&self, caller_id: &str) -> anyhow::Result<bool> {
        let mut file = self.load()?;
        let removed = file.users.remove(caller_id).is_some();
        if removed {
            self.save(&file)?;
            tracing::info!(caller = caller_id, "unlinked GitHub token");
        }
        Ok(removed)
    }
}

impl CredentialStore for FileCredentialStore {
    fn find(&self, caller_id: &str) -> gitbot_core::Result<Option<Credential>> {
        let file = self
            .load()
            .map_err(|e| BotError::CredentialStore(format!("{:#}", e)))?;

        let Some(stored) = file.users.get(caller_id) else {
            return Ok(None);
        };

        let encrypted_token = match stored.as_deref() {
            Some(encoded) => match BASE64_STANDARD.decode(encoded.trim()) {
                Ok(payload) => Some(payload),
                Err(_) => {
                    tracing::warn!(caller = caller_id, "stored token is not valid base64");
                    None
                }
            },
            None => None,
        };

        Ok(Some(Credential {
            owner_user_id: caller_id.to_string(),
            encrypted_token,
        }))
    }
}

/// AES-256-GCM token codec keyed by a SHA-256 digest of a secret
///
/// Payloads are `nonce(12) || ciphertext`. Without a secret every payload
/// fails to decrypt.
pub struct AesGcmTokenCodec {
    cipher: Option<Aes256Gcm>,
}

impl AesGcmTokenCodec {
    pub fn new(secret: Option<&str>) -> Self {
        let cipher = secret
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| Aes256Gcm::new_from_slice(&Sha256::digest(s.as_bytes())).ok());
        Self { cipher }
    }

    pub fn has_key(&self) -> bool {
        self.cipher.is_some()
    }

    fn cipher(&self) -> anyhow::Result<&Aes256Gcm> {
        self.cipher
            .as_ref()
            .ok_or_else(|| anyhow!("no token key is configured (set token_key or GITBOT_TOKEN_KEY)"))
    }

    /// Encrypt a plaintext token into a storable payload
    pub fn encrypt(&self, token: &str) -> anyhow::Result<Vec<u8>> {
        let token = token.trim();
        if token.is_empty() {
            bail!("token must not be empty");
        }
        let cipher = self.cipher()?;

        let mut nonce = [0u8; NONCE_BYTES];
        use aes_gcm::aead::rand_core::RngCore as _;
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(
                (&nonce).into(),
                Payload {
                    msg: token.as_bytes(),
                    aad: TOKEN_AAD,
                },
            )
            .map_err(|_| anyhow!("token encryption failed"))?;

        let mut payload = Vec::with_capacity(NONCE_BYTES + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(payload)
    }
}

impl TokenCodec for AesGcmTokenCodec {
    fn decrypt(&self, payload: &[u8]) -> gitbot_core::Result<String> {
        let cipher = self
            .cipher()
            .map_err(|e| BotError::Validation(e.to_string()))?;
        if payload.len() <= NONCE_BYTES {
            return Err(BotError::Validation("token payload is truncated".to_string()));
        }

        let (nonce, ciphertext) = payload.split_at(NONCE_BYTES);
        let plaintext = cipher
            .decrypt(
                nonce.into(),
                Payload {
                    msg: ciphertext,
                    aad: TOKEN_AAD,
                },
            )
            .map_err(|_| BotError::Validation("token integrity check failed".to_string()))?;
        String::from_utf8(plaintext)
            .map_err(|_| BotError::Validation("token is not valid UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitbot_core::AuthorizedActionGate;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileCredentialStore) {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/credentials.json"));
        (dir, store)
    }

    #[test]
    fn codec_round_trips_token() {
        let codec = AesGcmTokenCodec::new(Some("hunter2"));
        let payload = codec.encrypt("ghp_abc123").unwrap();
        assert_ne!(&payload[NONCE_BYTES..], b"ghp_abc123");
        assert_eq!(codec.decrypt(&payload).unwrap(), "ghp_abc123");
    }

    #[test]
    fn codec_rejects_wrong_key_and_tampering() {
        let payload = AesGcmTokenCodec::new(Some("right")).encrypt("ghp_abc").unwrap();
        assert!(AesGcmTokenCodec::new(Some("wrong")).decrypt(&payload).is_err());

        let mut tampered = payload.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0xff;
        assert!(AesGcmTokenCodec::new(Some("right")).decrypt(&tampered).is_err());
        assert!(AesGcmTokenCodec::new(Some("right")).decrypt(&payload[..5]).is_err());
    }

    #[test]
    fn codec_without_key_cannot_encrypt_or_decrypt() {
        let codec = AesGcmTokenCodec::new(Some("  "));
        assert!(!codec.has_key());
        assert!(codec.encrypt("ghp_abc").is_err());
        assert!(codec.decrypt(&[0u8; 32]).is_err());
    }

    #[test]
    fn missing_file_has_no_links() {
        let (_dir, store) = store();
        assert_eq!(store.find("1").unwrap(), None);
        assert!(!store.unlink("1").unwrap());
    }

    #[test]
    fn link_then_find_then_unlink() {
        let (_dir, store) = store();
        store.link("42", b"payload").unwrap();

        let credential = store.find("42").unwrap().unwrap();
        assert_eq!(credential.owner_user_id, "42");
        assert_eq!(credential.encrypted_token.as_deref(), Some(&b"payload"[..]));

        assert!(store.unlink("42").unwrap());
        assert_eq!(store.find("42").unwrap(), None);
    }

    #[test]
    fn null_or_garbled_payload_is_linked_without_token() {
        let (dir, store) = store();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(
            store.path(),
            r#"{"users": {"1": null, "2": "%%% not base64"}}"#,
        )
        .unwrap();

        for id in ["1", "2"] {
            let credential = store.find(id).unwrap().unwrap();
            assert_eq!(credential.encrypted_token, None);
        }
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let (dir, store) = store();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(store.path(), "{ nope").unwrap();
        assert!(matches!(
            store.find("1"),
            Err(BotError::CredentialStore(_))
        ));
    }

    #[test]
    fn gate_resolves_linked_token_from_file() {
        let (_dir, store) = store();
        let codec = AesGcmTokenCodec::new(Some("secret"));
        store.link("7", &codec.encrypt("ghp_xyz").unwrap()).unwrap();

        let gate = AuthorizedActionGate::new(&store, &codec);
        assert_eq!(gate.authorize("7").unwrap().expose(), "ghp_xyz");
        assert_eq!(gate.authorize("8"), Err(BotError::Unauthenticated));

        let other_key = AesGcmTokenCodec::new(Some("rotated"));
        let gate = AuthorizedActionGate::new(&store, &other_key);
        assert_eq!(gate.authorize("7"), Err(BotError::MissingToken));
    }
}
