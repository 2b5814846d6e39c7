//! Access token encryption at rest.
//!
//! Two strategies implement [`Encryptor`]:
//!
//! - [`NoEncryption`] passes tokens through unchanged. It is the default when
//!   no key is configured.
//! - [`SymmetricEncryptor`] seals tokens with AES-256-GCM. Every call draws a
//!   fresh 96-bit nonce and the stored value is
//!   `base64(nonce || tag || ciphertext)`.
//!
//! Rows carry no marker of which strategy wrote them. Switching strategies
//! (or keys) over existing data makes those rows undecryptable, so re-encrypt
//! stored sessions before rotating.

use std::fmt;

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, StorageError};

/// Key size for AES-256 (256 bits)
pub const KEY_SIZE: usize = 32;

/// Nonce size for AES-256-GCM (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size for AES-256-GCM (128 bits)
pub const TAG_SIZE: usize = 16;

/// A reversible transform applied to the access token before it is written
/// and after it is read.
pub trait Encryptor: Send + Sync {
    /// Turns a plaintext token into the opaque string stored in the database.
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    /// Recovers the plaintext token from its stored form.
    fn decrypt(&self, encrypted: &str) -> Result<String>;
}

/// Identity transform: tokens are stored as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEncryption;

impl Encryptor for NoEncryption {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Err(StorageError::InvalidArgument("data is required"));
        }
        Ok(plaintext.to_string())
    }

    fn decrypt(&self, encrypted: &str) -> Result<String> {
        if encrypted.is_empty() {
            return Err(StorageError::InvalidArgument("encrypted data is required"));
        }
        Ok(encrypted.to_string())
    }
}

/// Cipher used by [`SymmetricEncryptor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum CipherAlgorithm {
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
}

/// Settings for [`SymmetricEncryptor`].
///
/// Only `key` is required. The optional overrides exist so that a
/// configuration file can state its expectations explicitly; values other
/// than the supported ones are rejected rather than silently ignored.
#[derive(Clone, Default, Deserialize)]
pub struct EncryptionConfig {
    /// Hex-encoded 256-bit key.
    pub key: String,
    #[serde(default)]
    pub algorithm: Option<CipherAlgorithm>,
    #[serde(default)]
    pub nonce_length: Option<usize>,
    #[serde(default)]
    pub tag_length: Option<usize>,
}

impl EncryptionConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }
}

impl fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("nonce_length", &self.nonce_length)
            .field("tag_length", &self.tag_length)
            .finish()
    }
}

/// AES-256-GCM token encryption.
///
/// ```
/// use pg_session_storage::{EncryptionConfig, Encryptor, SymmetricEncryptor};
///
/// let key = SymmetricEncryptor::generate_key();
/// let encryptor = SymmetricEncryptor::new(&EncryptionConfig::new(key)).unwrap();
///
/// let sealed = encryptor.encrypt("shpat_123").unwrap();
/// assert_ne!(sealed, "shpat_123");
/// assert_eq!(encryptor.decrypt(&sealed).unwrap(), "shpat_123");
/// ```
#[derive(Clone)]
pub struct SymmetricEncryptor {
    cipher: Aes256Gcm,
}

impl SymmetricEncryptor {
    /// Builds an encryptor from configuration.
    ///
    /// Fails with [`StorageError::Configuration`] when the key is missing,
    /// is not valid hex, does not decode to exactly 32 bytes, or when an
    /// unsupported algorithm/nonce/tag override is given.
    pub fn new(config: &EncryptionConfig) -> Result<Self> {
        if config.key.is_empty() {
            return Err(StorageError::Configuration(
                "encryption key is required".to_string(),
            ));
        }

        let key = hex::decode(config.key.trim()).map_err(|_| {
            StorageError::Configuration("encryption key must be hex-encoded".to_string())
        })?;
        if key.len() != KEY_SIZE {
            return Err(StorageError::Configuration(format!(
                "invalid key length: expected {KEY_SIZE} bytes (256 bits), got {}",
                key.len()
            )));
        }

        match config.algorithm.unwrap_or_default() {
            CipherAlgorithm::Aes256Gcm => {}
        }
        if let Some(len) = config.nonce_length.filter(|len| *len != NONCE_SIZE) {
            return Err(StorageError::Configuration(format!(
                "unsupported nonce length {len} for aes-256-gcm, expected {NONCE_SIZE}"
            )));
        }
        if let Some(len) = config.tag_length.filter(|len| *len != TAG_SIZE) {
            return Err(StorageError::Configuration(format!(
                "unsupported tag length {len} for aes-256-gcm, expected {TAG_SIZE}"
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| StorageError::Configuration("failed to create cipher".to_string()))?;

        Ok(Self { cipher })
    }

    /// Generates a random hex-encoded 256-bit key.
    pub fn generate_key() -> String {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut key);
        hex::encode(key)
    }
}

impl fmt::Debug for SymmetricEncryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricEncryptor")
            .field("algorithm", &CipherAlgorithm::Aes256Gcm)
            .finish_non_exhaustive()
    }
}

impl Encryptor for SymmetricEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Err(StorageError::InvalidArgument("data is required"));
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(nonce, b"", &mut buffer)
            .map_err(|_| {
                warn!("access token encryption failed");
                StorageError::Encryption
            })?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + TAG_SIZE + buffer.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&tag);
        sealed.extend_from_slice(&buffer);

        Ok(BASE64.encode(sealed))
    }

    fn decrypt(&self, encrypted: &str) -> Result<String> {
        if encrypted.is_empty() {
            return Err(StorageError::InvalidArgument("encrypted data is required"));
        }

        let sealed = BASE64.decode(encrypted).map_err(|_| {
            warn!("stored access token is not valid base64");
            StorageError::Decryption("malformed ciphertext")
        })?;
        if sealed.len() < NONCE_SIZE + TAG_SIZE {
            warn!("stored access token is shorter than nonce and tag");
            return Err(StorageError::Decryption("ciphertext too short"));
        }

        let (nonce_bytes, rest) = sealed.split_at(NONCE_SIZE);
        let (tag_bytes, ciphertext) = rest.split_at(TAG_SIZE);

        let mut buffer = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(nonce_bytes),
                b"",
                &mut buffer,
                Tag::from_slice(tag_bytes),
            )
            .map_err(|_| {
                warn!("access token failed authentication");
                StorageError::Decryption("authentication tag mismatch")
            })?;

        String::from_utf8(buffer).map_err(|_| StorageError::Decryption("plaintext is not UTF-8"))
    }
}
