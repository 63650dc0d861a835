//! Deterministic encryption of redacted values.
//!
//! When encryption is on, redacted strings are replaced by the base64 of
//! their AES-SIV ciphertext instead of the placeholder. Equal plaintexts give
//! equal ciphertexts, so values can still be correlated across lines, and
//! whoever holds the key can recover them with `logveil decrypt`.

use crate::error::{RedactionError, Result};
use aes_siv::siv::Aes256Siv;
use aes_siv::KeyInit;
use base64::Engine;
use std::path::Path;

/// Key length for AES-256-SIV (two 256-bit keys).
pub const KEY_BYTES: usize = 64;

/// Deterministic encryption primitive.
pub trait Encryptor: Send + Sync {
    /// Encrypt `plaintext`. The same input always yields the same output.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Invert [`Encryptor::encrypt`].
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Encrypt a string and encode the ciphertext as standard base64.
    fn encrypt_to_base64(&self, plaintext: &str) -> Result<String> {
        let ciphertext = self.encrypt(plaintext.as_bytes())?;
        Ok(base64::engine::general_purpose::STANDARD.encode(ciphertext))
    }

    /// Decode a base64 ciphertext and decrypt it back to a string.
    fn decrypt_from_base64(&self, encoded: &str) -> Result<String> {
        let ciphertext = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| RedactionError::EncryptionError(format!("invalid base64: {}", e)))?;
        let plaintext = self.decrypt(&ciphertext)?;
        String::from_utf8(plaintext)
            .map_err(|_| RedactionError::EncryptionError("plaintext is not UTF-8".to_string()))
    }
}

/// Raw key material for [`AesSivEncryptor`].
#[derive(Clone)]
pub struct EncryptionKey {
    key: [u8; KEY_BYTES],
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([redacted])")
    }
}

impl EncryptionKey {
    /// Create a new random key.
    pub fn generate() -> Result<Self> {
        let mut key = [0u8; KEY_BYTES];
        getrandom::getrandom(&mut key).map_err(|e| {
            RedactionError::KeyError(format!("failed to generate random key: {}", e))
        })?;
        Ok(Self { key })
    }

    /// Create key material from raw bytes.
    pub fn from_bytes(key: [u8; KEY_BYTES]) -> Self {
        Self { key }
    }

    /// Create key material from a base64-encoded string.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| RedactionError::KeyError(format!("invalid base64: {}", e)))?;

        if decoded.len() != KEY_BYTES {
            return Err(RedactionError::KeyError(format!(
                "key must be {} bytes, got {}",
                KEY_BYTES,
                decoded.len()
            )));
        }

        let mut key = [0u8; KEY_BYTES];
        key.copy_from_slice(&decoded);
        Ok(Self { key })
    }

    /// Export key material as base64.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.key
    }

    /// Load a key file holding the base64 key on one line.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_base64(&content)
    }

    /// Load the key file, creating it with a fresh key if it does not exist.
    pub fn load_or_generate<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        let key = Self::generate()?;
        key.save(path)?;
        tracing::info!(path = %path.display(), "generated new encryption key");
        Ok(key)
    }

    /// Save the key to a file readable only by its owner.
    ///
    /// On Unix, creates file with 0600 permissions atomically so the key is
    /// never readable by others, even briefly.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_base64();

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;

            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&path, &content)?;
        }

        Ok(())
    }
}

/// AES-256-SIV with a single empty associated-data header.
#[derive(Debug, Clone)]
pub struct AesSivEncryptor {
    key: EncryptionKey,
}

impl AesSivEncryptor {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    fn cipher(&self) -> Result<Aes256Siv> {
        Aes256Siv::new_from_slice(self.key.as_bytes())
            .map_err(|_| RedactionError::KeyError("invalid AES-SIV key length".to_string()))
    }
}

impl Encryptor for AesSivEncryptor {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.cipher()?
            .encrypt([b"".as_slice()], plaintext)
            .map_err(|_| RedactionError::EncryptionError("encryption failed".to_string()))
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.cipher()?
            .decrypt([b"".as_slice()], ciphertext)
            .map_err(|_| {
                RedactionError::EncryptionError(
                    "decryption failed (wrong key or corrupted value)".to_string(),
                )
            })
    }
}
