//! # hotconf
//!
//! Binds human-editable property files to typed configuration objects and
//! writes them back.
//!
//! This crate provides:
//! - The canonical hierarchical-properties codec (tags, decoder, encoder)
//! - Named value codecs (Base64, AES-GCM, cached secrets)
//! - Live configuration classes with check-then-commit binding
//! - Property sources: INI files, command-line arguments, environment
//! - Hot reload of watched files
//! - A generator that renders live state back to files
//! - Framework settings loaded from TOML/YAML and checked with `validator`
//!
//! # Wire Format
//!
//! Every front end produces a flat map of dot-separated keys to raw text.
//! Bracketed values such as `[null]`, `[empty]`, `[list:Integer]` or
//! `[base64:aGVsbG8=]` carry type and codec information; everything else is
//! a literal read against the declared field type.

pub mod binder;
pub mod codec;
pub mod compact;
pub mod decoder;
pub mod deep_eq;
pub mod descriptor;
pub mod encoder;
pub mod file_loader;
pub mod generator;
pub mod hot_reload;
pub mod loader;
pub mod precedence;
pub mod properties;
pub mod recognizer;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod tag;
pub mod validator;
pub mod value;

pub use binder::{BindReport, Binder, FieldReport, LiveConfig, UpdatePolicy};
pub use codec::{Codec, CodecRegistry, KeyRing};
pub use decoder::{BindingOutcome, Decoder};
pub use deep_eq::deep_equals;
pub use descriptor::{ScalarType, TypeDescriptor};
pub use encoder::Encoder;
pub use file_loader::{load_settings, load_settings_toml, load_settings_yaml};
pub use generator::{Generator, write_if_changed};
pub use hot_reload::watch_config;
pub use loader::{ConfigRegistry, properties_from_args, properties_from_env};
pub use precedence::merge_sources;
pub use properties::{IniAdapter, PropertyStore, SyntaxAdapter, parse_properties};
pub use registry::{Registry, TypeRegistry};
pub use schema::{ClassSchema, EnumSchema, FieldSchema};
pub use settings::{CodecOptions, GeneratorOptions, KeyRingSettings, Settings};
pub use self::validator::{Constraint, ConstraintValidator, FieldValidator, validate};
pub use value::{ObjectValue, Value};

pub use hotconf_errors::{BindingError, CodecError, ErrorKind, LoadError};
