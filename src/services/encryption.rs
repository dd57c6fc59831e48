//! Secrets at rest
//!
//! AES-256-GCM with a random 96-bit nonce; stored form is
//! `base64(nonce || ciphertext)`. Reads tolerate values written before
//! encryption was introduced.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

use crate::config::CONFIG;
use crate::error::{AppError, Result};
use crate::services::security::random_bytes;

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;

#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    pub fn from_key(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_SIZE {
            return Err(AppError::Internal(format!(
                "Invalid encryption key length: expected {} bytes, got {}",
                KEY_SIZE,
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| AppError::Internal(format!("Invalid encryption key: {}", e)))?;
        Ok(Self { cipher })
    }

    /// Accepts 32 raw bytes encoded as base64 or hex
    pub fn from_encoded_key(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        let bytes = STANDARD
            .decode(trimmed)
            .ok()
            .filter(|b| b.len() == KEY_SIZE)
            .or_else(|| hex::decode(trimmed).ok())
            .ok_or_else(|| {
                AppError::Internal("Encryption key is neither base64 nor hex".to_string())
            })?;
        Self::from_key(&bytes)
    }

    /// Key derived from a passphrase (SHA-256)
    pub fn from_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&digest),
        }
    }

    /// Configured key, or one derived from the JWT secret when none is set
    pub fn from_config() -> Result<Self> {
        match &CONFIG.auth.encryption_key {
            Some(key) => Self::from_encoded_key(key),
            None => {
                tracing::warn!(
                    "DMS_ENCRYPTION_KEY not set; deriving the secrets key from the JWT secret"
                );
                Ok(Self::from_passphrase(&CONFIG.auth.jwt_secret))
            }
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce_bytes = random_bytes(NONCE_SIZE);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Internal(format!("Encryption failed: {}", e)))?;

        let mut out = nonce_bytes;
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::Internal(format!("Invalid ciphertext encoding: {}", e)))?;
        if raw.len() <= NONCE_SIZE {
            return Err(AppError::Internal("Ciphertext too short".to_string()));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| AppError::Internal(format!("Decryption failed: {}", e)))?;
        String::from_utf8(plaintext)
            .map_err(|e| AppError::Internal(format!("Decrypted value is not UTF-8: {}", e)))
    }

    /// Decrypt, or hand back the input unchanged when it does not decrypt.
    /// Rows written before encryption hold plaintext.
    pub fn decrypt_or_passthrough(&self, value: &str) -> String {
        match self.decrypt(value) {
            Ok(plain) => plain,
            Err(e) => {
                tracing::debug!(error = %e, "Treating stored secret as legacy plaintext");
                value.to_string()
            }
        }
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher")
            .field("cipher", &"[REDACTED]")
            .finish()
    }
}
