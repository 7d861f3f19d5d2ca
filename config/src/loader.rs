//! # Configuration Loader
//!
//! Registers live configuration classes and applies property sources to
//! them: INI files, command-line arguments and environment variables.
//!
//! # Source Forms
//! - Files: `key=value` lines, format picked by extension
//! - Arguments: `--c:key=value`, `--config:key=value`, `--c-key=value`,
//!   `--config-key=value`
//! - Environment: `{PREFIX}_SERVER__PORT` maps to `server.port`

use crate::binder::{BindReport, Binder, LiveConfig, UpdatePolicy};
use crate::properties::{IniAdapter, PropertyStore, SyntaxAdapter};
use crate::registry::Registry;
use crate::settings::Settings;
use crate::validator::{ConstraintValidator, FieldValidator};
use hotconf_errors::LoadError;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::env;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

type UpdateListener = Arc<dyn Fn(&BindReport) + Send + Sync>;

/// Process-wide set of live configuration classes.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Owns one [`LiveConfig`] per registered class and applies property stores
/// to all of them. Listeners run after every pass that committed a change.
///
/// ## Usage
/// ```rust,no_run
/// use hotconf::{ConfigRegistry, Registry, Settings};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = Arc::new(Registry::default());
///     let configs = ConfigRegistry::new(registry, Settings::default());
///     let server = configs.register("app.Server")?;
///     configs.load_file(Path::new("app.ini"))?;
///     println!("{:?}", server.get("port"));
///     Ok(())
/// }
/// ```
///
/// ## Combined Mode
/// When several classes share one file, each class's `key_prefix` scopes its
/// fields as `prefix.field`. Classes without a prefix read bare field names.
pub struct ConfigRegistry {
    registry: Arc<Registry>,
    settings: Settings,
    validator: Arc<dyn FieldValidator>,
    configs: RwLock<IndexMap<String, Arc<LiveConfig>>>,
    listeners: RwLock<Vec<UpdateListener>>,
    adapters: Vec<Box<dyn SyntaxAdapter>>,
}

impl ConfigRegistry {
    pub fn new(registry: Arc<Registry>, settings: Settings) -> Self {
        Self {
            registry,
            settings,
            validator: Arc::new(ConstraintValidator),
            configs: RwLock::new(IndexMap::new()),
            listeners: RwLock::new(Vec::new()),
            adapters: vec![Box::new(IniAdapter)],
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn FieldValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Adds a file syntax. Later adapters win for shared extensions.
    pub fn with_adapter(mut self, adapter: impl SyntaxAdapter + 'static) -> Self {
        self.adapters.insert(0, Box::new(adapter));
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Creates the live instance of `class` with its default field values.
    pub fn register(&self, class: &str) -> Result<Arc<LiveConfig>, LoadError> {
        let schema = self
            .registry
            .types
            .class(class)
            .ok_or_else(|| LoadError::UnknownClass {
                class: class.to_string(),
            })?;
        let mut configs = self.configs.write();
        if configs.contains_key(class) {
            return Err(LoadError::DuplicateClass {
                class: class.to_string(),
            });
        }
        if let Some(prefix) = schema.key_prefix.as_deref() {
            if let Some(owner) = configs
                .values()
                .find(|c| c.key_prefix() == Some(prefix))
            {
                return Err(LoadError::DuplicatePrefix {
                    prefix: prefix.to_string(),
                    class: owner.class().to_string(),
                });
            }
        }
        let live = Arc::new(LiveConfig::new(
            Arc::clone(schema),
            self.registry.types.default_object(class),
        ));
        configs.insert(class.to_string(), Arc::clone(&live));
        debug!("Registered configuration class {}", class);
        Ok(live)
    }

    pub fn get(&self, class: &str) -> Option<Arc<LiveConfig>> {
        self.configs.read().get(class).cloned()
    }

    pub fn configs(&self) -> Vec<Arc<LiveConfig>> {
        self.configs.read().values().cloned().collect()
    }

    pub fn add_update_listener(&self, listener: impl Fn(&BindReport) + Send + Sync + 'static) {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Binds `store` to every registered class. In combined mode each class
    /// reads its fields under its key prefix.
    pub fn apply_properties(&self, store: &PropertyStore, combined: bool) -> Vec<BindReport> {
        let policy = UpdatePolicy::from_options(&self.settings.codec);
        let binder = Binder::new(&self.registry)
            .with_validator(self.validator.as_ref())
            .with_max_map_search_depth(self.settings.codec.max_map_search_depth);

        let mut reports = Vec::new();
        for live in self.configs() {
            let prefix = if combined { live.key_prefix() } else { None };
            let report = binder.bind(store, &live, prefix, policy);
            if report.is_updated() {
                // Listeners may register further listeners.
                let listeners: Vec<UpdateListener> = self.listeners.read().clone();
                for listener in &listeners {
                    listener(&report);
                }
            }
            reports.push(report);
        }
        reports
    }

    /// Reads `path`, parses it with the adapter for its extension and applies
    /// it in combined mode.
    pub fn load_file(&self, path: &Path) -> Result<Vec<BindReport>, LoadError> {
        let store = self.read_file(path)?;
        info!("Loaded {} properties from {:?}", store.len(), path);
        Ok(self.apply_properties(&store, true))
    }

    /// Parses `path` into canonical properties without applying them.
    pub fn read_file(&self, path: &Path) -> Result<PropertyStore, LoadError> {
        let adapter = self.adapter_for(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => LoadError::Io(e),
        })?;
        adapter.to_canonical_properties(&text)
    }

    fn adapter_for(&self, path: &Path) -> Result<&dyn SyntaxAdapter, LoadError> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LoadError::NoExtension {
                path: path.display().to_string(),
            })?
            .to_lowercase();
        self.adapters
            .iter()
            .find(|a| a.extensions().contains(&extension.as_str()))
            .map(|a| a.as_ref())
            .ok_or(LoadError::UnsupportedFormat { extension })
    }

    /// Keys of `store` that no registered field reads, in combined mode.
    pub fn unused_keys(&self, store: &PropertyStore) -> Vec<String> {
        let mut paths = Vec::new();
        for live in self.configs() {
            for field in self.registry.types.fields_of(live.class()) {
                paths.push(match live.key_prefix() {
                    Some(prefix) => format!("{}.{}", prefix, field.name),
                    None => field.name.clone(),
                });
            }
        }
        store
            .keys()
            .filter(|key| {
                !paths.iter().any(|p| match key.strip_prefix(p.as_str()) {
                    Some(rest) => rest.is_empty() || rest.starts_with('.'),
                    None => false,
                })
            })
            .map(str::to_string)
            .collect()
    }
}

const ARG_PREFIXES: [&str; 4] = ["--config:", "--config-", "--c:", "--c-"];

/// Extracts configuration entries from command-line arguments.
///
/// Returns the entries and the arguments that were not configuration. The
/// first occurrence of a key wins. Dotted or dashed keys also register a
/// camel-cased alias, so `--c:logging.path=x` sets both `logging.path` and
/// `loggingPath`.
pub fn properties_from_args<I, S>(args: I) -> (PropertyStore, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut store = PropertyStore::new();
    let mut rest = Vec::new();
    for arg in args {
        let arg = arg.into();
        let entry = ARG_PREFIXES
            .iter()
            .find_map(|prefix| arg.strip_prefix(prefix))
            .and_then(|body| body.split_once('='))
            .filter(|(key, _)| !key.trim().is_empty());
        match entry {
            Some((key, value)) => {
                let key = key.trim();
                store.insert_if_absent(key, value);
                if key.contains(['.', '-']) {
                    store.insert_if_absent(camel_case(key), value);
                }
            }
            None => rest.push(arg),
        }
    }
    (store, rest)
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, segment) in key.split(['.', '-']).filter(|s| !s.is_empty()).enumerate() {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) if i > 0 => {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
            Some(_) => out.push_str(segment),
            None => {}
        }
    }
    out
}

/// Loads `{prefix}_*` environment variables as properties.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Reads configuration from the environment following 12-factor app
/// principles. Variable names drop the prefix, lowercase, and turn `__`
/// into the `.` path separator.
///
/// ## Usage
/// ```rust,no_run
/// use hotconf::properties_from_env;
///
/// // HOTCONF_SERVER__PORT=9090 yields server.port=9090
/// let store = properties_from_env("HOTCONF");
/// println!("{:?}", store.get("server.port"));
/// ```
pub fn properties_from_env(prefix: &str) -> PropertyStore {
    properties_from_vars(prefix, env::vars())
}

fn properties_from_vars(prefix: &str, vars: impl Iterator<Item = (String, String)>) -> PropertyStore {
    let marker = format!("{}_", prefix);
    let mut store = PropertyStore::new();
    for (name, value) in vars {
        if let Some(rest) = name.strip_prefix(marker.as_str()) {
            if rest.is_empty() {
                continue;
            }
            store.insert(rest.to_lowercase().replace("__", "."), value);
        }
    }
    store
}
