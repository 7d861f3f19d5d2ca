//! # Generator
//!
//! Renders live configuration objects back into canonical property files.

use crate::binder::LiveConfig;
use crate::decoder::DEFAULT_MAX_MAP_SEARCH_DEPTH;
use crate::encoder::Encoder;
use crate::loader::ConfigRegistry;
use crate::properties::{IniAdapter, PropertyLine, SyntaxAdapter};
use crate::registry::Registry;
use crate::settings::GeneratorOptions;
use crate::value::Value;
use hotconf_errors::LoadError;
use std::path::Path;
use tracing::{debug, info};

pub struct Generator<'a> {
    registry: &'a Registry,
    options: &'a GeneratorOptions,
    max_map_search_depth: usize,
}

impl<'a> Generator<'a> {
    pub fn new(registry: &'a Registry, options: &'a GeneratorOptions) -> Self {
        Self {
            registry,
            options,
            max_map_search_depth: DEFAULT_MAX_MAP_SEARCH_DEPTH,
        }
    }

    /// A generator whose output `configs` reads back as written.
    pub fn for_configs(configs: &'a ConfigRegistry) -> Self {
        let settings = configs.settings();
        Self::new(configs.registry(), &settings.generator)
            .with_max_map_search_depth(settings.codec.max_map_search_depth)
    }

    pub fn with_max_map_search_depth(mut self, depth: usize) -> Self {
        self.max_map_search_depth = depth;
        self
    }

    /// Lines of one class block. With `combined`, keys carry the class
    /// key prefix.
    pub fn lines(&self, live: &LiveConfig, combined: bool) -> Vec<PropertyLine> {
        let encoder = Encoder::new(self.registry, self.options)
            .with_max_map_search_depth(self.max_map_search_depth);
        let snapshot = live.snapshot();
        let prefix = if combined { live.key_prefix() } else { None };

        let mut lines = vec![PropertyLine::Comment(live.class().to_string())];
        for (i, field) in self.registry.types.fields_of(live.class()).into_iter().enumerate() {
            if i > 0 && self.options.separate_fields_by_blank_lines {
                lines.push(PropertyLine::Blank);
            }
            if self.options.add_field_comment {
                if let Some(comment) = &field.comment {
                    lines.push(PropertyLine::Comment(comment.clone()));
                }
            }
            let path = match prefix {
                Some(p) if !p.is_empty() => format!("{}.{}", p, field.name),
                _ => field.name.clone(),
            };
            let value = snapshot.get(&field.name).cloned().unwrap_or(Value::Null);
            lines.extend(
                encoder
                    .encode_field(&path, field, &value)
                    .into_iter()
                    .map(|(key, raw)| PropertyLine::entry(key, raw)),
            );
        }
        lines
    }

    /// Renders one class block with CRLF line endings.
    pub fn render(&self, live: &LiveConfig, combined: bool) -> String {
        IniAdapter.render(&self.lines(live, combined))
    }

    /// Renders every registered class into one combined file.
    pub fn render_all(&self, configs: &ConfigRegistry) -> String {
        let mut lines = Vec::new();
        for live in configs.configs() {
            if !lines.is_empty() {
                lines.push(PropertyLine::Blank);
            }
            lines.extend(self.lines(&live, true));
        }
        IniAdapter.render(&lines)
    }
}

/// Writes `text` to `path` unless the file already holds exactly these
/// bytes. Returns whether a write happened.
///
/// # M-CANONICAL-DOCS
///
/// ## Usage
/// ```rust,no_run
/// use hotconf::{ConfigRegistry, Generator, write_if_changed};
/// use std::path::Path;
///
/// fn save(configs: &ConfigRegistry) -> Result<(), Box<dyn std::error::Error>> {
///     let generator = Generator::for_configs(configs);
///     let text = generator.render_all(configs);
///     write_if_changed(Path::new("conf/app.ini"), &text)?;
///     Ok(())
/// }
/// ```
///
/// ## Error Handling
/// Returns `LoadError::Io` when the parent directory cannot be created or
/// the file cannot be written.
pub fn write_if_changed(path: &Path, text: &str) -> Result<bool, LoadError> {
    let existing = match std::fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(LoadError::Io(e)),
    };
    if existing.as_deref() == Some(text.as_bytes()) {
        debug!("Unchanged {:?}", path);
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    if existing.is_some() {
        info!("Update {:?}", path);
    } else {
        info!("Write {:?}", path);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecRegistry;
    use crate::descriptor::{ScalarType, TypeDescriptor};
    use crate::registry::TypeRegistry;
    use crate::schema::{ClassSchema, FieldSchema};
    use crate::settings::Settings;
    use std::sync::Arc;

    fn registry() -> Arc<Registry> {
        let mut types = TypeRegistry::new();
        types.register_class(
            ClassSchema::new("app.Server")
                .key_prefix("server")
                .field(
                    FieldSchema::new("host", TypeDescriptor::String)
                        .with_default("localhost")
                        .comment("Bind address"),
                )
                .field(FieldSchema::new("port", TypeDescriptor::Primitive(ScalarType::Int)).with_default(8080)),
        );
        types.register_class(
            ClassSchema::new("app.Log")
                .key_prefix("log")
                .field(FieldSchema::new("level", TypeDescriptor::String).with_default("info")),
        );
        Arc::new(Registry::new(types, CodecRegistry::new()))
    }

    #[test]
    fn test_render_class_block() {
        let registry = registry();
        let configs = ConfigRegistry::new(Arc::clone(&registry), Settings::default());
        let live = configs.register("app.Server").unwrap();
        let options = GeneratorOptions::default();

        let text = Generator::new(&registry, &options).render(&live, false);
        assert_eq!(
            text,
            "# app.Server\r\n# Bind address\r\nhost=localhost\r\n\r\nport=8080\r\n"
        );
    }

    #[test]
    fn test_render_without_cosmetics() {
        let registry = registry();
        let configs = ConfigRegistry::new(Arc::clone(&registry), Settings::default());
        let live = configs.register("app.Server").unwrap();
        let options = GeneratorOptions {
            add_field_comment: false,
            separate_fields_by_blank_lines: false,
            ..GeneratorOptions::default()
        };

        let text = Generator::new(&registry, &options).render(&live, true);
        assert_eq!(text, "# app.Server\r\nserver.host=localhost\r\nserver.port=8080\r\n");
    }

    #[test]
    fn test_render_all_round_trips() {
        let registry = registry();
        let configs = ConfigRegistry::new(Arc::clone(&registry), Settings::default());
        configs.register("app.Server").unwrap();
        configs.register("app.Log").unwrap();
        let options = GeneratorOptions::default();

        let text = Generator::new(&registry, &options).render_all(&configs);
        assert!(text.contains("server.port=8080\r\n\r\n# app.Log\r\nlog.level=info\r\n"));

        let store = crate::properties::parse_properties(&text);
        let reports = configs.apply_properties(&store, true);
        assert!(reports.iter().all(|r| r.committed && !r.is_updated()));
    }

    #[test]
    fn test_dotted_map_keys_reload_with_shallow_search() {
        let mut types = TypeRegistry::new();
        types.register_class(
            ClassSchema::new("app.Routes").key_prefix("routes").field(FieldSchema::new(
                "targets",
                TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::String),
            )),
        );
        let registry = Arc::new(Registry::new(types, CodecRegistry::new()));
        let mut settings = Settings::default();
        settings.codec.max_map_search_depth = 1;
        let configs = ConfigRegistry::new(Arc::clone(&registry), settings.clone());
        let live = configs.register("app.Routes").unwrap();
        configs.apply_properties(
            &crate::properties::parse_properties(
                "routes.targets=[map]\nroutes.targets.0=[]\nroutes.targets.0.key=api.v1\n\
                 routes.targets.0.value=backend\nroutes.targets.1=[]\n\
                 routes.targets.1.key=home\nroutes.targets.1.value=web\n",
            ),
            true,
        );
        let written = live.snapshot();
        let Some(Value::Map(targets)) = written.get("targets") else {
            panic!("expected map");
        };
        assert_eq!(targets.len(), 2);

        let text = Generator::for_configs(&configs).render_all(&configs);
        assert!(text.contains("routes.targets.0.key=api.v1"));

        let fresh = ConfigRegistry::new(registry, settings);
        let reloaded = fresh.register("app.Routes").unwrap();
        fresh.apply_properties(&crate::properties::parse_properties(&text), true);
        assert!(crate::deep_eq::deep_equals(
            &Value::Object(written),
            &Value::Object(reloaded.snapshot())
        ));
    }

    #[test]
    fn test_write_if_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("app.ini");

        assert!(write_if_changed(&path, "a=1\r\n").unwrap());
        assert!(!write_if_changed(&path, "a=1\r\n").unwrap());
        assert!(write_if_changed(&path, "a=2\r\n").unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a=2\r\n");
    }
}
