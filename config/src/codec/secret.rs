use super::Codec;
use super::aes::KeyRing;
use crate::descriptor::TypeDescriptor;
use crate::value::Value;
use base64::{Engine as _, engine::general_purpose};
use hotconf_errors::CodecError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const CACHE_LIMIT: usize = 1024;

/// `[secret:...]`: an encrypted string in unpadded Base64, the form used for
/// passwords and tokens. Decoded payloads are cached since the same secret
/// is read on every reload. The cache is dropped whenever the key ring
/// changes.
#[derive(Debug)]
pub struct SecretCodec {
    keys: Arc<KeyRing>,
    cache: Mutex<DecodeCache>,
}

#[derive(Debug, Default)]
struct DecodeCache {
    generation: u64,
    entries: HashMap<String, String>,
}

impl SecretCodec {
    pub fn new(keys: Arc<KeyRing>) -> Self {
        Self {
            keys: Arc::clone(&keys),
            cache: Mutex::new(DecodeCache {
                generation: keys.generation(),
                entries: HashMap::new(),
            }),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.lock().entries.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().entries.len()
    }
}

impl Codec for SecretCodec {
    fn value_type(&self) -> TypeDescriptor {
        TypeDescriptor::String
    }

    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        let text = value
            .as_str()
            .ok_or_else(|| CodecError::ValueTypeMismatch {
                codec: "secret".to_string(),
                found: value.runtime_type().tag_name(),
            })?;
        let data = self.keys.encrypt(text.as_bytes())?;
        Ok(general_purpose::STANDARD_NO_PAD.encode(data))
    }

    fn decode(&self, payload: &str) -> Result<Value, CodecError> {
        let payload = payload.trim().trim_end_matches('=');
        let generation = self.keys.generation();
        {
            let mut cache = self.cache.lock();
            if cache.generation != generation {
                cache.entries.clear();
                cache.generation = generation;
            }
            if let Some(hit) = cache.entries.get(payload) {
                return Ok(Value::Str(hit.clone()));
            }
        }
        let data = general_purpose::STANDARD_NO_PAD
            .decode(payload)
            .map_err(|e| CodecError::InvalidPayload {
                reason: e.to_string(),
            })?;
        let plain = String::from_utf8(self.keys.decrypt(&data)?).map_err(|e| {
            CodecError::DecryptionFailed {
                reason: e.to_string(),
            }
        })?;
        let mut cache = self.cache.lock();
        if cache.generation == generation {
            if cache.entries.len() >= CACHE_LIMIT {
                cache.entries.clear();
            }
            cache.entries.insert(payload.to_string(), plain.clone());
        }
        Ok(Value::Str(plain))
    }
}
