//! # Binding
//!
//! Applies a property store to one live configuration object. Every field
//! present in the store is decoded and compared first; the pass then commits
//! according to the [`UpdatePolicy`].

use crate::decoder::{BindingOutcome, DEFAULT_MAX_MAP_SEARCH_DEPTH, Decoder};
use crate::properties::PropertyStore;
use crate::registry::Registry;
use crate::schema::ClassSchema;
use crate::settings::CodecOptions;
use crate::validator::FieldValidator;
use crate::value::{ObjectValue, Value};
use hotconf_errors::BindingError;
use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The live instance of one configuration class.
///
/// Reads take a snapshot; binding passes hold the lock for the whole check
/// and commit so concurrent passes on the same class never interleave.
#[derive(Debug)]
pub struct LiveConfig {
    schema: Arc<ClassSchema>,
    state: Mutex<ObjectValue>,
}

impl LiveConfig {
    pub fn new(schema: Arc<ClassSchema>, initial: ObjectValue) -> Self {
        Self {
            schema,
            state: Mutex::new(initial),
        }
    }

    pub fn class(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &Arc<ClassSchema> {
        &self.schema
    }

    pub fn key_prefix(&self) -> Option<&str> {
        self.schema.key_prefix.as_deref()
    }

    pub fn snapshot(&self) -> ObjectValue {
        self.state.lock().clone()
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.state.lock().get(field).cloned()
    }

    /// Deserializes the current state into a typed struct.
    ///
    /// # Example
    /// ```rust,no_run
    /// # use hotconf::LiveConfig;
    /// #[derive(serde::Deserialize)]
    /// struct Server {
    ///     host: String,
    ///     port: u16,
    /// }
    ///
    /// # fn demo(live: &LiveConfig) -> Result<(), serde_json::Error> {
    /// let server: Server = live.extract()?;
    /// println!("{}:{}", server.host, server.port);
    /// # Ok(())
    /// # }
    /// ```
    pub fn extract<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        let json = Value::Object(self.snapshot()).to_json();
        serde_json::from_value(json)
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ObjectValue> {
        self.state.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdatePolicy {
    /// Commit only when no field of the class is invalid.
    #[default]
    CheckThenCommit,
    /// Commit every changed field even when siblings are invalid.
    PartialApply,
}

impl UpdatePolicy {
    pub fn from_options(options: &CodecOptions) -> Self {
        if options.skip_updating_with_invalid_items {
            UpdatePolicy::CheckThenCommit
        } else {
            UpdatePolicy::PartialApply
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldReport {
    pub field: String,
    pub path: String,
    pub outcome: BindingOutcome,
}

/// What one binding pass saw and did for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct BindReport {
    pub class: String,
    pub fields: Vec<FieldReport>,
    pub committed: bool,
    pub warnings: Vec<BindingError>,
}

impl BindReport {
    pub fn changed(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|f| f.outcome.is_changed())
    }

    pub fn invalid(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|f| f.outcome.is_invalid())
    }

    pub fn has_invalid(&self) -> bool {
        self.invalid().next().is_some()
    }

    /// True when the pass committed at least one change.
    pub fn is_updated(&self) -> bool {
        self.committed && self.changed().next().is_some()
    }
}

pub struct Binder<'a> {
    registry: &'a Registry,
    validator: Option<&'a dyn FieldValidator>,
    max_map_search_depth: usize,
}

impl<'a> Binder<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            validator: None,
            max_map_search_depth: DEFAULT_MAX_MAP_SEARCH_DEPTH,
        }
    }

    pub fn with_validator(mut self, validator: &'a dyn FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_max_map_search_depth(mut self, depth: usize) -> Self {
        self.max_map_search_depth = depth;
        self
    }

    /// Binds every field of `live` found in `store` under `prefix`.
    pub fn bind(
        &self,
        store: &PropertyStore,
        live: &LiveConfig,
        prefix: Option<&str>,
        policy: UpdatePolicy,
    ) -> BindReport {
        let class = live.class().to_string();
        let mut state = live.lock();
        let mut decoder =
            Decoder::new(self.registry, store).with_max_map_search_depth(self.max_map_search_depth);
        if let Some(validator) = self.validator {
            decoder = decoder.with_validator(validator);
        }

        let mut fields = Vec::new();
        for field in self.registry.types.fields_of(&class) {
            let path = match prefix {
                Some(p) if !p.is_empty() => format!("{}.{}", p, field.name),
                _ => field.name.clone(),
            };
            let Some(raw) = store.get(&path) else {
                continue;
            };
            let current = state.get(&field.name).cloned().unwrap_or(Value::Null);
            let mut outcome = decoder.decode(&path, raw, &field.ty, &current);
            if let (BindingOutcome::Changed(value), Some(validator)) = (&outcome, self.validator) {
                if let Err(e) = validator.validate(field, value) {
                    outcome = BindingOutcome::Invalid(BindingError::ValidationRejected {
                        field: format!("{}.{}", class, field.name),
                        reason: e.to_string(),
                    });
                }
            }
            if let BindingOutcome::Invalid(e) = &outcome {
                warn!("Invalid value for {}.{}: {}", class, field.name, e);
            }
            fields.push(FieldReport {
                field: field.name.clone(),
                path,
                outcome,
            });
        }

        let invalid = fields.iter().filter(|f| f.outcome.is_invalid()).count();
        let committed = match policy {
            UpdatePolicy::CheckThenCommit => invalid == 0,
            UpdatePolicy::PartialApply => true,
        };
        if committed {
            for report in &fields {
                if let BindingOutcome::Changed(value) = &report.outcome {
                    let old = state
                        .fields
                        .insert(report.field.clone(), value.clone())
                        .unwrap_or(Value::Null);
                    info!("{}.{}: {} => {}", class, report.field, old, value);
                }
            }
        } else {
            warn!(
                "Skipped updating {}: {} invalid field(s)",
                class, invalid
            );
        }
        debug!("Bound {} field(s) of {}", fields.len(), class);

        BindReport {
            class,
            fields,
            committed,
            warnings: decoder.take_warnings(),
        }
    }
}
