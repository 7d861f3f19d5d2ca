//! # Codecs
//!
//! Named, bidirectional string transforms for sensitive values. A value
//! written as `[name:payload]` is decoded by the codec registered under
//! `name`; on write, a field's preferred codecs are tried in order.

mod aes;
mod encoding;
mod secret;

pub use self::aes::{AesCodec, BytesAesCodec, KeyRing};
pub use self::encoding::{Base64Codec, Bytes64Codec};
pub use self::secret::SecretCodec;

use crate::descriptor::TypeDescriptor;
use crate::value::Value;
use hotconf_errors::CodecError;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A stateless bidirectional string codec.
pub trait Codec: Send + Sync + fmt::Debug {
    /// The value type this codec carries: `String` or `byte[]`.
    fn value_type(&self) -> TypeDescriptor;

    fn encode(&self, value: &Value) -> Result<String, CodecError>;

    fn decode(&self, payload: &str) -> Result<Value, CodecError>;

    fn accepts(&self, value: &Value) -> bool {
        match self.value_type() {
            TypeDescriptor::String => matches!(value, Value::Str(_)),
            ty if ty == TypeDescriptor::bytes() => value.as_bytes().is_some(),
            _ => false,
        }
    }
}

/// Process-wide codec table. Reads are concurrent; `register` replaces an
/// existing codec in place, keeping its registry position.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: RwLock<IndexMap<String, Arc<dyn Codec>>>,
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.names())
            .finish()
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in codecs sharing one key ring.
    pub fn with_defaults(keys: Arc<KeyRing>) -> Self {
        let registry = Self::new();
        registry.register("base64", Base64Codec);
        registry.register("bytes64", Bytes64Codec);
        registry.register("aes", AesCodec::new(Arc::clone(&keys)));
        registry.register("bytesaes", BytesAesCodec::new(Arc::clone(&keys)));
        registry.register("secret", SecretCodec::new(keys));
        registry
    }

    pub fn register(&self, name: impl Into<String>, codec: impl Codec + 'static) {
        let name = name.into();
        debug!("Registering codec {}", name);
        self.codecs.write().insert(name, Arc::new(codec));
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.codecs.write().shift_remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Codec>> {
        self.codecs.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.codecs.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.codecs.read().keys().cloned().collect()
    }

    pub fn value_type(&self, name: &str) -> Option<TypeDescriptor> {
        self.get(name).map(|codec| codec.value_type())
    }

    /// Encodes with one named codec. `None` when the codec is missing, does
    /// not accept the value, fails, or produces nothing.
    pub fn encode(&self, name: &str, value: &Value) -> Option<String> {
        let codec = self.get(name)?;
        if !codec.accepts(value) {
            return None;
        }
        match codec.encode(value) {
            Ok(encoded) if !encoded.is_empty() => Some(encoded),
            Ok(_) => None,
            Err(e) => {
                debug!("Codec {} skipped value: {}", name, e);
                None
            }
        }
    }

    /// Decodes the payload of a `[name:payload]` tag. Failure is final.
    pub fn decode_tagged(&self, name: &str, payload: &str) -> Result<Value, CodecError> {
        let codec = self.get(name).ok_or_else(|| CodecError::UnknownCodec {
            name: name.to_string(),
        })?;
        codec.decode(payload)
    }

    /// Tries `preferred` in order, then every other registered codec in
    /// registry order. Returns the winning codec name and its output.
    pub fn encode_preferred(&self, preferred: &[String], value: &Value) -> Option<(String, String)> {
        for name in preferred {
            if let Some(encoded) = self.encode(name, value) {
                return Some((name.clone(), encoded));
            }
        }
        for name in self.names() {
            if preferred.contains(&name) {
                continue;
            }
            if let Some(encoded) = self.encode(&name, value) {
                return Some((name, encoded));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Upper;

    impl Codec for Upper {
        fn value_type(&self) -> TypeDescriptor {
            TypeDescriptor::String
        }

        fn encode(&self, value: &Value) -> Result<String, CodecError> {
            Ok(value.as_str().unwrap_or_default().to_uppercase())
        }

        fn decode(&self, payload: &str) -> Result<Value, CodecError> {
            Ok(Value::str(payload.to_lowercase()))
        }
    }

    #[test]
    fn test_register_replaces_in_place() {
        let registry = CodecRegistry::new();
        registry.register("base64", Base64Codec);
        registry.register("upper", Upper);
        registry.register("base64", Upper);
        assert_eq!(registry.names(), vec!["base64", "upper"]);
        assert_eq!(registry.encode("base64", &Value::str("ab")), Some("AB".to_string()));
    }

    #[test]
    fn test_encode_preferred_order() {
        let registry = CodecRegistry::new();
        registry.register("base64", Base64Codec);
        registry.register("upper", Upper);

        let (name, encoded) = registry
            .encode_preferred(&["upper".to_string()], &Value::str("hi"))
            .unwrap();
        assert_eq!(name, "upper");
        assert_eq!(encoded, "HI");

        let (name, _) = registry.encode_preferred(&[], &Value::str("hi")).unwrap();
        assert_eq!(name, "base64");
    }

    #[test]
    fn test_encode_skips_mismatched_value_type() {
        let registry = CodecRegistry::new();
        registry.register("bytes64", Bytes64Codec);
        assert_eq!(registry.encode("bytes64", &Value::str("hi")), None);
        assert!(registry.encode_preferred(&[], &Value::Int(3)).is_none());
    }

    #[test]
    fn test_decode_unknown_codec() {
        let registry = CodecRegistry::new();
        let err = registry.decode_tagged("rot13", "abc").unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownCodec {
                name: "rot13".to_string()
            }
        );
    }

    #[test]
    fn test_concurrent_reads_and_register() {
        let registry = Arc::new(CodecRegistry::with_defaults(Arc::new(KeyRing::new())));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let encoded = registry.encode("base64", &Value::str("x")).unwrap();
                        assert_eq!(
                            registry.decode_tagged("base64", &encoded).unwrap(),
                            Value::str("x")
                        );
                    }
                    registry.register(format!("upper{}", i), Upper);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.names().len(), 9);
    }
}
