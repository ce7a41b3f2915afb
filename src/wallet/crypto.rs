//! Cryptographic helpers for the wallet and directory layers
//!
//! - HMAC-SHA256 password hashes for the user directory
//! - RSA-OAEP (SHA-256) encryption of the Circle entity secret
//! - Constant-time comparison for hash verification

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{pkcs8::DecodePublicKey, Oaep, RsaPublicKey};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Entity secrets are 32 random bytes, hex encoded
const ENTITY_SECRET_LEN: usize = 32;
const SALT_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid HMAC key length")]
    InvalidKeyLength,

    #[error("RSA encryption failed: {0}")]
    RsaEncryption(String),

    #[error("Invalid public key format: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid entity secret: {0}")]
    InvalidEntitySecret(String),

    #[error("Hex encoding/decoding error: {0}")]
    HexError(String),
}

impl From<hex::FromHexError> for CryptoError {
    fn from(e: hex::FromHexError) -> Self {
        CryptoError::HexError(e.to_string())
    }
}

// =============================================================================
// Password hashing
// =============================================================================

/// Random hex salt for a new user record
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// HMAC-SHA256 of `salt:password`, keyed with the server secret
pub fn hash_password(password: &str, salt: &str, secret: &str) -> Result<String, CryptoError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| CryptoError::InvalidKeyLength)?;
    mac.update(salt.as_bytes());
    mac.update(b":");
    mac.update(password.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str, secret: &str) -> bool {
    match hash_password(password, salt, secret) {
        Ok(actual) => constant_time_compare(actual.as_bytes(), expected_hash.as_bytes()),
        Err(_) => false,
    }
}

/// Returns `false` for different lengths but still walks the longer input.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        let max_len = std::cmp::max(a.len(), b.len());
        let mut _dummy = 0u8;
        for i in 0..max_len {
            let byte_a = a.get(i).copied().unwrap_or(0);
            let byte_b = b.get(i).copied().unwrap_or(0);
            _dummy |= byte_a ^ byte_b;
        }
        return false;
    }

    let mut result = 0u8;
    for (byte_a, byte_b) in a.iter().zip(b.iter()) {
        result |= byte_a ^ byte_b;
    }
    result == 0
}

// =============================================================================
// Entity secret ciphertext
// =============================================================================

/// Parse the entity public key returned by Circle (PEM, SPKI)
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_pem(pem.trim())
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Encrypt the hex entity secret with RSA-OAEP/SHA-256 and base64 the result.
///
/// OAEP is randomized, so every call yields a different ciphertext. Circle rejects
/// reused ciphertexts, which means this must run once per state-changing request.
pub fn encrypt_entity_secret(
    entity_secret_hex: &str,
    public_key: &RsaPublicKey,
) -> Result<String, CryptoError> {
    let secret = hex::decode(entity_secret_hex.trim())?;
    if secret.len() != ENTITY_SECRET_LEN {
        return Err(CryptoError::InvalidEntitySecret(format!(
            "expected {} bytes, got {}",
            ENTITY_SECRET_LEN,
            secret.len()
        )));
    }

    let encrypted = public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &secret)
        .map_err(|e| CryptoError::RsaEncryption(e.to_string()))?;
    Ok(BASE64.encode(encrypted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::{EncodePublicKey, LineEnding};
    use rsa::RsaPrivateKey;

    const SECRET: &str = "da2c071f44331263b8270d29fde79f8fc4f2f4dbc2391655a5ec383ba467cedd";

    #[test]
    fn test_password_hash_verify() {
        let salt = generate_salt();
        let hash = hash_password("hunter22", &salt, "server-secret").unwrap();

        assert_eq!(hash.len(), 64);
        assert!(verify_password("hunter22", &salt, &hash, "server-secret"));
        assert!(!verify_password("hunter23", &salt, &hash, "server-secret"));
        assert!(!verify_password("hunter22", &salt, &hash, "other-secret"));
    }

    #[test]
    fn test_salt_changes_hash() {
        let a = hash_password("same", &generate_salt(), "k").unwrap();
        let b = hash_password("same", &generate_salt(), "k").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(b"hello", b"hello"));
        assert!(!constant_time_compare(b"hello", b"world"));
        assert!(!constant_time_compare(b"hello", b"hello!"));
        assert!(constant_time_compare(b"", b""));
    }

    #[test]
    fn test_entity_secret_ciphertext_decrypts() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let pem = RsaPublicKey::from(&private_key)
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        let public_key = parse_public_key(&pem).unwrap();

        let first = encrypt_entity_secret(SECRET, &public_key).unwrap();
        let second = encrypt_entity_secret(SECRET, &public_key).unwrap();
        assert_ne!(first, second);

        let raw = BASE64.decode(first).unwrap();
        let decrypted = private_key.decrypt(Oaep::new::<Sha256>(), &raw).unwrap();
        assert_eq!(hex::encode(decrypted), SECRET);
    }

    #[test]
    fn test_entity_secret_wrong_length() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let public_key = RsaPublicKey::from(&private_key);
        let result = encrypt_entity_secret("abcd", &public_key);
        assert!(matches!(result, Err(CryptoError::InvalidEntitySecret(_))));
    }
}
