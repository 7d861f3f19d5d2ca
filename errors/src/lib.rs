//! # hotconf Errors
//!
//! Error types shared by the hotconf crates.
//!
//! - Uses `thiserror` for structured error definitions
//! - Every variant carries named fields so messages stay self-describing
//! - Binding errors are cloneable: they travel inside per-field outcomes

use thiserror::Error;

/// Coarse error categories reported alongside a failed binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedTag,
    UnresolvableType,
    CodecDecodeFailure,
    ShapeMismatch,
    InvalidLiteral,
    ValidationRejected,
    UnknownField,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedTag => "MalformedTag",
            ErrorKind::UnresolvableType => "UnresolvableType",
            ErrorKind::CodecDecodeFailure => "CodecDecodeFailure",
            ErrorKind::ShapeMismatch => "ShapeMismatch",
            ErrorKind::InvalidLiteral => "InvalidLiteral",
            ErrorKind::ValidationRejected => "ValidationRejected",
            ErrorKind::UnknownField => "UnknownField",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while binding raw property text to a typed value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("Malformed tag at {path}: {raw}")]
    MalformedTag { path: String, raw: String },

    #[error("Unresolvable type at {path}: {name}")]
    UnresolvableType { path: String, name: String },

    #[error("Codec {codec} failed to decode value at {path}: {reason}")]
    CodecDecodeFailure {
        path: String,
        codec: String,
        reason: String,
    },

    #[error("Shape mismatch at {path}: expected {expected}, found {found}")]
    ShapeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Invalid {expected} literal at {path}: {raw}")]
    InvalidLiteral {
        path: String,
        expected: String,
        raw: String,
    },

    #[error("Validation rejected {field}: {reason}")]
    ValidationRejected { field: String, reason: String },

    #[error("Unknown field {field} on {class}")]
    UnknownField { class: String, field: String },
}

impl BindingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BindingError::MalformedTag { .. } => ErrorKind::MalformedTag,
            BindingError::UnresolvableType { .. } => ErrorKind::UnresolvableType,
            BindingError::CodecDecodeFailure { .. } => ErrorKind::CodecDecodeFailure,
            BindingError::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            BindingError::InvalidLiteral { .. } => ErrorKind::InvalidLiteral,
            BindingError::ValidationRejected { .. } => ErrorKind::ValidationRejected,
            BindingError::UnknownField { .. } => ErrorKind::UnknownField,
        }
    }
}

/// Codec errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("Unknown codec: {name}")]
    UnknownCodec { name: String },

    #[error("Codec {codec} does not accept {found} values")]
    ValueTypeMismatch { codec: String, found: String },

    #[error("Encryption key not configured")]
    KeyNotConfigured,

    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },

    #[error("Encryption failed: {reason}")]
    EncryptionFailed { reason: String },

    #[error("Decryption failed: {reason}")]
    DecryptionFailed { reason: String },

    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },
}

/// File and settings loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error in {path}: {reason}")]
    TomlParse { path: String, reason: String },

    #[error("YAML parse error in {path}: {reason}")]
    YamlParse { path: String, reason: String },

    #[error("File has no extension: {path}")]
    NoExtension { path: String },

    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Class not in type registry: {class}")]
    UnknownClass { class: String },

    #[error("Class already registered: {class}")]
    DuplicateClass { class: String },

    #[error("Key prefix {prefix} already used by {class}")]
    DuplicatePrefix { prefix: String, class: String },
}
