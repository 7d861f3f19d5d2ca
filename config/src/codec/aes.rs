//! AES-GCM codecs and the shared key ring.
//!
//! Ciphertexts are `nonce || ciphertext`. The ring holds three slots: new
//! values are encrypted with the encrypt key, and decryption tries the
//! decrypt key and then the fallback key so keys can be rotated without
//! rewriting every file at once.

use super::Codec;
use crate::descriptor::TypeDescriptor;
use crate::value::Value;
use aes_gcm::{
    Aes128Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{Engine as _, engine::general_purpose};
use hotconf_errors::CodecError;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const NONCE_LEN: usize = 12;

#[derive(Default)]
struct KeySlots {
    encrypt: Option<Arc<Aes128Gcm>>,
    decrypt: Option<Arc<Aes128Gcm>>,
    fallback: Option<Arc<Aes128Gcm>>,
}

/// Rotatable AES keys shared by the AES-based codecs.
#[derive(Default)]
pub struct KeyRing {
    slots: RwLock<KeySlots>,
    generation: AtomicU64,
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        f.debug_struct("KeyRing")
            .field("encrypt", &slots.encrypt.is_some())
            .field("decrypt", &slots.decrypt.is_some())
            .field("fallback", &slots.fallback.is_some())
            .finish()
    }
}

fn cipher_from_hex(hex_key: &str) -> Result<Arc<Aes128Gcm>, CodecError> {
    let hex_key = hex_key.trim();
    if hex_key.len() != 32 {
        return Err(CodecError::InvalidKey {
            reason: format!("expected 32 hex characters, got {}", hex_key.len()),
        });
    }
    let bytes = hex::decode(hex_key).map_err(|e| CodecError::InvalidKey {
        reason: e.to_string(),
    })?;
    Aes128Gcm::new_from_slice(&bytes)
        .map(Arc::new)
        .map_err(|e| CodecError::InvalidKey {
            reason: e.to_string(),
        })
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ring from hex keys. The decrypt key defaults to the encrypt
    /// key.
    pub fn from_hex(
        encrypt: &str,
        decrypt: Option<&str>,
        fallback: Option<&str>,
    ) -> Result<Self, CodecError> {
        let ring = Self::new();
        ring.set_keys(encrypt, decrypt, fallback)?;
        Ok(ring)
    }

    /// Replaces all three slots atomically. Nothing changes on error.
    pub fn set_keys(
        &self,
        encrypt: &str,
        decrypt: Option<&str>,
        fallback: Option<&str>,
    ) -> Result<(), CodecError> {
        let encrypt = cipher_from_hex(encrypt)?;
        let decrypt = match decrypt {
            Some(key) if !key.trim().is_empty() => cipher_from_hex(key)?,
            _ => Arc::clone(&encrypt),
        };
        let fallback = match fallback {
            Some(key) if !key.trim().is_empty() => Some(cipher_from_hex(key)?),
            _ => None,
        };
        let mut slots = self.slots.write();
        slots.encrypt = Some(encrypt);
        slots.decrypt = Some(decrypt);
        slots.fallback = fallback;
        self.generation.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn clear(&self) {
        let mut slots = self.slots.write();
        *slots = KeySlots::default();
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Bumped on every key change; caches of decrypted values compare it.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_configured(&self) -> bool {
        self.slots.read().encrypt.is_some()
    }

    /// A fresh random key in the ring's hex format.
    pub fn generate_key_hex() -> String {
        hex::encode(Aes128Gcm::generate_key(&mut OsRng))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let cipher = self
            .slots
            .read()
            .encrypt
            .clone()
            .ok_or(CodecError::KeyNotConfigured)?;
        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let ciphertext =
            cipher
                .encrypt(&nonce, plaintext)
                .map_err(|e| CodecError::EncryptionFailed {
                    reason: e.to_string(),
                })?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        if data.len() <= NONCE_LEN {
            return Err(CodecError::InvalidPayload {
                reason: "ciphertext too short".to_string(),
            });
        }
        let (decrypt, fallback) = {
            let slots = self.slots.read();
            (slots.decrypt.clone(), slots.fallback.clone())
        };
        let decrypt = decrypt.ok_or(CodecError::KeyNotConfigured)?;
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce);
        match decrypt.decrypt(nonce, ciphertext) {
            Ok(plain) => Ok(plain),
            Err(first) => match fallback {
                Some(fallback) => fallback.decrypt(nonce, ciphertext).map_err(|e| {
                    CodecError::DecryptionFailed {
                        reason: e.to_string(),
                    }
                }),
                None => Err(CodecError::DecryptionFailed {
                    reason: first.to_string(),
                }),
            },
        }
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String, CodecError> {
    String::from_utf8(bytes).map_err(|e| CodecError::DecryptionFailed {
        reason: e.to_string(),
    })
}

fn mismatch(codec: &str, value: &Value) -> CodecError {
    CodecError::ValueTypeMismatch {
        codec: codec.to_string(),
        found: value.runtime_type().tag_name(),
    }
}

/// `[aes:...]`: an encrypted string, hex encoded.
#[derive(Debug, Clone)]
pub struct AesCodec {
    keys: Arc<KeyRing>,
}

impl AesCodec {
    pub fn new(keys: Arc<KeyRing>) -> Self {
        Self { keys }
    }
}

impl Codec for AesCodec {
    fn value_type(&self) -> TypeDescriptor {
        TypeDescriptor::String
    }

    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        let text = value.as_str().ok_or_else(|| mismatch("aes", value))?;
        self.keys.encrypt(text.as_bytes()).map(hex::encode)
    }

    fn decode(&self, payload: &str) -> Result<Value, CodecError> {
        let data = hex::decode(payload.trim()).map_err(|e| CodecError::InvalidPayload {
            reason: e.to_string(),
        })?;
        utf8(self.keys.decrypt(&data)?).map(Value::Str)
    }
}

/// `[bytesaes:...]`: an encrypted `byte[]`, Base64 encoded.
#[derive(Debug, Clone)]
pub struct BytesAesCodec {
    keys: Arc<KeyRing>,
}

impl BytesAesCodec {
    pub fn new(keys: Arc<KeyRing>) -> Self {
        Self { keys }
    }
}

impl Codec for BytesAesCodec {
    fn value_type(&self) -> TypeDescriptor {
        TypeDescriptor::bytes()
    }

    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        let bytes = value.as_bytes().ok_or_else(|| mismatch("bytesaes", value))?;
        self.keys
            .encrypt(&bytes)
            .map(|data| general_purpose::STANDARD.encode(data))
    }

    fn decode(&self, payload: &str) -> Result<Value, CodecError> {
        let data = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| CodecError::InvalidPayload {
                reason: e.to_string(),
            })?;
        self.keys.decrypt(&data).map(|bytes| Value::bytes(&bytes))
    }
}
