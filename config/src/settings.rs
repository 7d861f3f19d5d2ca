//! # Framework Settings
//!
//! Settings that tune the codec itself: decode limits, generator
//! formatting and encryption keys.
//!
//! All settings structures:
//! - Use `serde` for serialization/deserialization
//! - Use `validator` for input validation
//! - Default every field so partial files are accepted

use crate::codec::KeyRing;
use hotconf_errors::CodecError;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Top-level settings.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Aggregates codec, generator and key settings into one file-loadable
/// structure.
///
/// ## Usage
/// ```rust,no_run
/// use hotconf::{load_settings, Settings};
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let settings: Settings = load_settings(Path::new("hotconf.toml"))?;
///     println!("map depth: {}", settings.codec.max_map_search_depth);
///     Ok(())
/// }
/// ```
///
/// ## Fields
/// - `codec`: decoder limits and update policy
/// - `generator`: output formatting
/// - `keys`: AES keys shared by the encrypting codecs
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    #[validate(nested)]
    pub codec: CodecOptions,

    #[serde(default)]
    #[validate(nested)]
    pub generator: GeneratorOptions,

    #[serde(default)]
    #[validate(nested)]
    pub keys: KeyRingSettings,
}

/// Decoder options.
///
/// ## Fields
/// - `max_map_search_depth`: how many dot levels the direct-mode map decoder
///   searches for composite keys (default: 10, range 1-20)
/// - `skip_updating_with_invalid_items`: commit a class only when none of
///   its fields is invalid (default: true)
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CodecOptions {
    #[serde(default = "default_max_map_search_depth")]
    #[validate(range(min = 1, max = 20))]
    pub max_map_search_depth: usize,

    #[serde(default = "default_true")]
    pub skip_updating_with_invalid_items: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_map_search_depth: default_max_map_search_depth(),
            skip_updating_with_invalid_items: true,
        }
    }
}

fn default_max_map_search_depth() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_compact_max_length() -> usize {
    100
}

/// Generator formatting options.
///
/// ## Fields
/// - `readable_*_format`: prefer the expanded multi-line form for that shape
///   (default: true). When false, values that pass the compactness check are
///   written on one line.
/// - `prefer_key_value_map_format`: write maps as `path.key=value` when the
///   keys allow it (default: true)
/// - `sorted_map_format`: sort map keys (default: true)
/// - `summarize_collection_type`: emit one element type tag per homogeneous
///   collection (default: true)
/// - `starting_index`: first element index (default: 0)
/// - `compact_max_length`: longest single-line rendering accepted
///   (default: 100; 80 suits script-style front ends)
/// - `preferred_codec_orders`: codec order for fields that accept any codec
/// - `add_field_comment`, `separate_fields_by_blank_lines`: cosmetics
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct GeneratorOptions {
    #[serde(default = "default_true")]
    pub readable_array_format: bool,

    #[serde(default = "default_true")]
    pub readable_list_format: bool,

    #[serde(default = "default_true")]
    pub readable_set_format: bool,

    #[serde(default = "default_true")]
    pub readable_map_format: bool,

    #[serde(default = "default_true")]
    pub readable_object_format: bool,

    #[serde(default = "default_true")]
    pub prefer_key_value_map_format: bool,

    #[serde(default = "default_true")]
    pub sorted_map_format: bool,

    #[serde(default = "default_true")]
    pub summarize_collection_type: bool,

    #[serde(default)]
    #[validate(range(max = 1))]
    pub starting_index: usize,

    #[serde(default = "default_compact_max_length")]
    #[validate(range(min = 16, max = 1024))]
    pub compact_max_length: usize,

    #[serde(default)]
    pub preferred_codec_orders: Vec<String>,

    #[serde(default = "default_true")]
    pub add_field_comment: bool,

    #[serde(default = "default_true")]
    pub separate_fields_by_blank_lines: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            readable_array_format: true,
            readable_list_format: true,
            readable_set_format: true,
            readable_map_format: true,
            readable_object_format: true,
            prefer_key_value_map_format: true,
            sorted_map_format: true,
            summarize_collection_type: true,
            starting_index: 0,
            compact_max_length: default_compact_max_length(),
            preferred_codec_orders: Vec::new(),
            add_field_comment: true,
            separate_fields_by_blank_lines: true,
        }
    }
}

impl GeneratorOptions {
    /// Single-line forms wherever the value allows them.
    pub fn compact() -> Self {
        Self {
            readable_array_format: false,
            readable_list_format: false,
            readable_set_format: false,
            readable_map_format: false,
            readable_object_format: false,
            ..Self::default()
        }
    }
}

/// AES keys, 32 hex characters each.
///
/// ## Fields
/// - `encrypt_key`: key used for new ciphertexts
/// - `decrypt_key`: key tried first on decode (defaults to `encrypt_key`)
/// - `fallback_decrypt_key`: key tried second, for rotation
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct KeyRingSettings {
    #[serde(default)]
    #[validate(custom(function = "validate_hex_key"))]
    pub encrypt_key: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_hex_key"))]
    pub decrypt_key: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_hex_key"))]
    pub fallback_decrypt_key: Option<String>,
}

impl KeyRingSettings {
    /// Loads the configured keys into `ring`. A missing encrypt key leaves
    /// the ring untouched.
    pub fn apply(&self, ring: &KeyRing) -> Result<(), CodecError> {
        match self.encrypt_key.as_deref() {
            Some(encrypt) => ring.set_keys(
                encrypt,
                self.decrypt_key.as_deref(),
                self.fallback_decrypt_key.as_deref(),
            ),
            None => Ok(()),
        }
    }
}

fn validate_hex_key(key: &str) -> Result<(), ValidationError> {
    if key.len() == 32 && key.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new("hex_key"))
    }
}
