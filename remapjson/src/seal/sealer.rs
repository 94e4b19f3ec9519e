//! AES-256-GCM sealing of webhook configurations.
//!
//! A token is `base64url(nonce || ciphertext || tag)`. The key is the SHA-256
//! digest of the operator secret, so any secret length works and rotating the
//! secret invalidates every token minted before.

use std::fmt;

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::types::{SealError, SealedConfig};

/// Nonce length required by the cipher (96 bits for AES-GCM).
pub const NONCE_LEN: usize = <<Aes256Gcm as AeadCore>::NonceSize as Unsigned>::USIZE;

/// Seals and unseals webhook configurations with a process-wide secret.
#[derive(Clone)]
pub struct Sealer {
    cipher: Aes256Gcm,
}

impl Sealer {
    /// Create a sealer, deriving the AES-256 key from `secret`.
    pub fn new(secret: &str) -> Self {
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&Sha256::digest(secret.as_bytes()));

        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..])),
        }
    }

    /// Encrypt `target_url` and `template` into an opaque token.
    ///
    /// Every call draws a fresh nonce from the OS random source, so sealing
    /// the same pair twice yields two different tokens.
    pub fn seal(&self, target_url: &str, template: &str) -> Result<String, SealError> {
        let plaintext = serde_json::to_vec(&SealedConfig::new(target_url, template))
            .map_err(SealError::Encode)?;

        let mut nonce = [0u8; NONCE_LEN];
        OsRng.try_fill_bytes(&mut nonce).map_err(SealError::Entropy)?;

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| SealError::Encrypt)?;

        let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&ciphertext);

        Ok(URL_SAFE.encode(token))
    }

    /// Decode and authenticate a token, returning the sealed configuration.
    pub fn unseal(&self, token: &str) -> Result<SealedConfig, SealError> {
        let data = URL_SAFE.decode(token.as_bytes())?;

        if data.len() < NONCE_LEN {
            return Err(SealError::TooShort);
        }
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| SealError::Decrypt)?;

        serde_json::from_slice(&plaintext).map_err(SealError::Malformed)
    }
}

impl fmt::Debug for Sealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sealer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_unseal_round_trip() {
        let sealer = Sealer::new("test-secret");
        let token = sealer
            .seal("https://example.com/hook", r#"{"msg":"{{.text}}"}"#)
            .unwrap();
        assert!(!token.is_empty());

        let config = sealer.unseal(&token).unwrap();
        assert_eq!(config.target_url, "https://example.com/hook");
        assert_eq!(config.template, r#"{"msg":"{{.text}}"}"#);
    }

    #[test]
    fn test_round_trip_preserves_unusual_input() {
        let sealer = Sealer::new("");
        let url = "http://127.0.0.1:9/päth?q=1&r=\"x\"";
        let template = "{{- range $i, $e := .items}}\n\t{{$i}}={{$e}}{{end -}}";

        let config = sealer.unseal(&sealer.seal(url, template).unwrap()).unwrap();
        assert_eq!(config, SealedConfig::new(url, template));
    }

    #[test]
    fn test_seal_is_not_deterministic() {
        let sealer = Sealer::new("test-secret");
        let first = sealer.seal("https://example.com", "{{.v}}").unwrap();
        let second = sealer.seal("https://example.com", "{{.v}}").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_token_is_url_safe() {
        let sealer = Sealer::new("test-secret");
        for _ in 0..32 {
            let token = sealer.seal("https://example.com", "{{.v}}").unwrap();
            assert!(!token.contains('+') && !token.contains('/'));
        }
    }

    #[test]
    fn test_token_layout() {
        let sealer = Sealer::new("test-secret");
        let token = sealer.seal("https://example.com", "{{.v}}").unwrap();
        let raw = URL_SAFE.decode(token).unwrap();

        let plaintext_len = serde_json::to_vec(&SealedConfig::new("https://example.com", "{{.v}}"))
            .unwrap()
            .len();
        // nonce + ciphertext + 16-byte GCM tag
        assert_eq!(raw.len(), NONCE_LEN + plaintext_len + 16);
        assert_eq!(NONCE_LEN, 12);
    }

    #[test]
    fn test_unseal_with_wrong_secret_fails() {
        let token = Sealer::new("secret-a")
            .seal("https://example.com", "{{.v}}")
            .unwrap();

        let err = Sealer::new("secret-b").unseal(&token).unwrap_err();
        assert!(matches!(err, SealError::Decrypt));
    }

    #[test]
    fn test_unseal_invalid_base64_fails() {
        let err = Sealer::new("test-secret").unseal("!!!notbase64!!!").unwrap_err();
        assert!(matches!(err, SealError::Decode(_)));
    }

    #[test]
    fn test_unseal_truncated_token_fails() {
        let sealer = Sealer::new("test-secret");
        let token = sealer.seal("https://example.com", "{{.v}}").unwrap();

        // 4 base64 chars decode to 3 bytes, well under the nonce length
        let err = sealer.unseal(&token[..4]).unwrap_err();
        assert!(matches!(err, SealError::TooShort));
        assert_eq!(err.to_string(), "token too short");

        let err = sealer.unseal("").unwrap_err();
        assert!(matches!(err, SealError::TooShort));
    }

    #[test]
    fn test_unseal_nonce_only_fails_authentication() {
        let sealer = Sealer::new("test-secret");
        let token = URL_SAFE.encode([7u8; NONCE_LEN]);
        assert!(matches!(sealer.unseal(&token), Err(SealError::Decrypt)));
    }

    #[test]
    fn test_every_single_byte_flip_is_detected() {
        let sealer = Sealer::new("test-secret");
        let token = sealer.seal("https://example.com", "{{.v}}").unwrap();
        let raw = URL_SAFE.decode(&token).unwrap();

        for position in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[position] ^= 0x01;
            let result = sealer.unseal(&URL_SAFE.encode(&tampered));
            assert!(
                matches!(result, Err(SealError::Decrypt)),
                "flip at byte {position} was not rejected"
            );
        }
    }

    #[test]
    fn test_unseal_tampered_token_text_fails() {
        let sealer = Sealer::new("test-secret");
        let token = sealer.seal("https://example.com", "{{.v}}").unwrap();

        let mid = token.len() / 2;
        let replacement = if &token[mid..mid + 1] == "A" { "B" } else { "A" };
        let tampered = format!("{}{}{}", &token[..mid], replacement, &token[mid + 1..]);

        assert!(sealer.unseal(&tampered).is_err());
    }

    #[test]
    fn test_unseal_rejects_non_config_plaintext() {
        let sealer = Sealer::new("test-secret");
        let nonce = [1u8; NONCE_LEN];
        let ciphertext = sealer
            .cipher
            .encrypt(Nonce::from_slice(&nonce), b"not json".as_slice())
            .unwrap();
        let token = URL_SAFE.encode([nonce.as_slice(), ciphertext.as_slice()].concat());

        assert!(matches!(sealer.unseal(&token), Err(SealError::Malformed(_))));
    }
}
