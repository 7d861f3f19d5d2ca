use super::Codec;
use crate::descriptor::TypeDescriptor;
use crate::value::Value;
use base64::{Engine as _, engine::general_purpose};
use hotconf_errors::CodecError;

/// `[base64:...]`: a string stored as Base64 of its UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl Codec for Base64Codec {
    fn value_type(&self) -> TypeDescriptor {
        TypeDescriptor::String
    }

    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        let text = value.as_str().ok_or_else(|| CodecError::ValueTypeMismatch {
            codec: "base64".to_string(),
            found: value.runtime_type().tag_name(),
        })?;
        Ok(general_purpose::STANDARD.encode(text.as_bytes()))
    }

    fn decode(&self, payload: &str) -> Result<Value, CodecError> {
        let bytes = general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| CodecError::InvalidPayload {
                reason: e.to_string(),
            })?;
        String::from_utf8(bytes)
            .map(Value::Str)
            .map_err(|e| CodecError::InvalidPayload {
                reason: e.to_string(),
            })
    }
}

/// `[bytes64:...]`: a `byte[]` stored as Base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bytes64Codec;

impl Codec for Bytes64Codec {
    fn value_type(&self) -> TypeDescriptor {
        TypeDescriptor::bytes()
    }

    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        let bytes = value.as_bytes().ok_or_else(|| CodecError::ValueTypeMismatch {
            codec: "bytes64".to_string(),
            found: value.runtime_type().tag_name(),
        })?;
        Ok(general_purpose::STANDARD.encode(bytes))
    }

    fn decode(&self, payload: &str) -> Result<Value, CodecError> {
        general_purpose::STANDARD
            .decode(payload.trim())
            .map(|bytes| Value::bytes(&bytes))
            .map_err(|e| CodecError::InvalidPayload {
                reason: e.to_string(),
            })
    }
}
