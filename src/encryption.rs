//! AES-256-GCM for values embedded in client-side forms.
//!
//! Format: base64url(nonce_12bytes || ciphertext || tag_16bytes)

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Clone)]
pub struct Encryptor {
    key: [u8; 32],
}

impl Encryptor {
    /// The AES key is the SHA-256 digest of `secret`.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            key: Sha256::digest(secret.as_ref()).into(),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        let cipher = Aes256Gcm::new(&self.key.into());

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| AppError::Internal(anyhow::anyhow!("encryption failed")))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(out))
    }

    /// Fails with `BadRequest` for anything this key did not produce.
    pub fn decrypt(&self, encoded: &str) -> AppResult<String> {
        let invalid = || AppError::BadRequest("invalid encrypted value".into());

        let data = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| invalid())?;
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(invalid());
        }

        let cipher = Aes256Gcm::new(&self.key.into());
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| invalid())?;
        String::from_utf8(plaintext).map_err(|_| invalid())
    }
}
