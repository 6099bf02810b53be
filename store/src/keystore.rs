//! Argon2id encryption for Ed25519 signing secrets at rest.
//!
//! 1. Argon2id derives a 32-byte encryption key from the store password and
//!    a random salt
//! 2. AES-256-GCM encrypts the secret key with a random nonce
//! 3. All parameters ride along in the persisted record for decryption

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Argon2id parameters: 64 MB memory, 3 iterations, 1 lane of parallelism.
const ARGON2_MEMORY_KIB: u32 = 65536;
const ARGON2_ITERATIONS: u32 = 3;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

const SALT_LEN: usize = 32;
/// AES-GCM nonce length in bytes (96 bits).
const NONCE_LEN: usize = 12;

/// An encrypted secret key with all parameters needed to decrypt it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncryptedKey {
    pub cipher: String,
    pub kdf: String,
    pub kdf_params: KdfParams,
    /// Hex-encoded salt.
    pub salt: String,
    /// Hex-encoded nonce.
    pub nonce: String,
    /// Hex-encoded ciphertext.
    pub ciphertext: String,
}

/// KDF parameters for Argon2id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KdfParams {
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Encrypt a 32-byte Ed25519 secret key with the store password.
pub fn encrypt_secret(secret_key: &[u8; 32], password: &str) -> Result<EncryptedKey, StoreError> {
    let mut rng = rand::thread_rng();

    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce_bytes);

    let derived_key = derive_key(password, &salt)?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key)
        .map_err(|e| StoreError::Key(format!("AES key init failed: {e}")))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, secret_key.as_ref())
        .map_err(|e| StoreError::Key(format!("encryption failed: {e}")))?;

    Ok(EncryptedKey {
        cipher: "aes-256-gcm".to_string(),
        kdf: "argon2id".to_string(),
        kdf_params: KdfParams {
            memory: ARGON2_MEMORY_KIB,
            iterations: ARGON2_ITERATIONS,
            parallelism: ARGON2_PARALLELISM,
        },
        salt: hex::encode(salt),
        nonce: hex::encode(nonce_bytes),
        ciphertext: hex::encode(ciphertext),
    })
}

/// Decrypt an encrypted secret with the store password, returning the
/// 32-byte secret key.
pub fn decrypt_secret(encrypted: &EncryptedKey, password: &str) -> Result<[u8; 32], StoreError> {
    let salt = hex::decode(&encrypted.salt)
        .map_err(|e| StoreError::Key(format!("invalid salt hex: {e}")))?;
    let nonce_bytes = hex::decode(&encrypted.nonce)
        .map_err(|e| StoreError::Key(format!("invalid nonce hex: {e}")))?;
    let ciphertext = hex::decode(&encrypted.ciphertext)
        .map_err(|e| StoreError::Key(format!("invalid ciphertext hex: {e}")))?;

    if nonce_bytes.len() != NONCE_LEN {
        return Err(StoreError::Key(format!(
            "invalid nonce length: expected {NONCE_LEN}, got {}",
            nonce_bytes.len()
        )));
    }

    let derived_key = derive_key(password, &salt)?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key)
        .map_err(|e| StoreError::Key(format!("AES key init failed: {e}")))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher.decrypt(nonce, ciphertext.as_ref()).map_err(|_| {
        StoreError::Key("decryption failed: wrong password or corrupted data".to_string())
    })?;

    let key: [u8; 32] = plaintext
        .try_into()
        .map_err(|_| StoreError::Key("decrypted key has wrong length".to_string()))?;
    Ok(key)
}

/// Derive a 32-byte key from a password and salt using Argon2id.
fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; 32], StoreError> {
    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| StoreError::Key(format!("Argon2 params error: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output)
        .map_err(|e| StoreError::Key(format!("Argon2 hashing failed: {e}")))?;

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let secret_key = [42u8; 32];
        let password = "test-password-123";

        let encrypted = encrypt_secret(&secret_key, password).unwrap();
        let decrypted = decrypt_secret(&encrypted, password).unwrap();

        assert_eq!(decrypted, secret_key);
    }

    #[test]
    fn wrong_password_fails() {
        let encrypted = encrypt_secret(&[42u8; 32], "correct-password").unwrap();
        assert!(decrypt_secret(&encrypted, "wrong-password").is_err());
    }

    #[test]
    fn parameters_are_recorded() {
        let encrypted = encrypt_secret(&[0u8; 32], "pass").unwrap();
        assert_eq!(encrypted.cipher, "aes-256-gcm");
        assert_eq!(encrypted.kdf, "argon2id");
        assert_eq!(encrypted.kdf_params.memory, 65536);
        assert_eq!(encrypted.kdf_params.iterations, 3);
        assert_eq!(encrypted.kdf_params.parallelism, 1);
    }

    #[test]
    fn different_passwords_produce_different_ciphertext() {
        let secret_key = [7u8; 32];
        let a = encrypt_secret(&secret_key, "password1").unwrap();
        let b = encrypt_secret(&secret_key, "password2").unwrap();
        // Different salts ensure different ciphertexts even with same key
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn corrupted_ciphertext_fails() {
        let mut encrypted = encrypt_secret(&[1u8; 32], "pass").unwrap();
        encrypted.ciphertext = "00".repeat(48);
        assert!(decrypt_secret(&encrypted, "pass").is_err());
    }
}
