use hotconf::descriptor::ScalarType;
use hotconf::{
    ClassSchema, CodecRegistry, ConfigRegistry, Constraint, FieldSchema, Generator, KeyRing,
    Registry, Settings, TypeDescriptor, TypeRegistry, Value, merge_sources,
    parse_properties, properties_from_args, write_if_changed,
};
use serial_test::serial;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn registry() -> Arc<Registry> {
    let mut types = TypeRegistry::new();
    types.register_class(
        ClassSchema::new("app.Server")
            .key_prefix("server")
            .field(FieldSchema::new("host", TypeDescriptor::String).with_default("localhost"))
            .field(
                FieldSchema::new("port", TypeDescriptor::Primitive(ScalarType::Int))
                    .with_default(8080)
                    .constraint(Constraint::Range {
                        min: 1.0,
                        max: 65535.0,
                    }),
            )
            .field(
                FieldSchema::new("password", TypeDescriptor::String)
                    .preferred_codecs(&["secret"])
                    .comment("Encrypted at rest"),
            ),
    );
    types.register_class(
        ClassSchema::new("app.Cache")
            .key_prefix("cache")
            .field(FieldSchema::new(
                "limits",
                TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::Boxed(ScalarType::Int)),
            )),
    );
    let keys = KeyRing::from_hex("00112233445566778899aabbccddeeff", None, None).unwrap();
    Arc::new(Registry::new(types, CodecRegistry::with_defaults(Arc::new(keys))))
}

fn configs() -> ConfigRegistry {
    let configs = ConfigRegistry::new(registry(), Settings::default());
    configs.register("app.Server").unwrap();
    configs.register("app.Cache").unwrap();
    configs
}

#[test]
fn test_combined_file_binds_every_class() {
    let configs = configs();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.ini");
    fs::write(
        &path,
        "server.host=example.org\r\nserver.port=9090\r\ncache.limits=a>1;b>2\r\nstray=1\r\n",
    )
    .unwrap();

    let reports = configs.load_file(&path).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.committed));

    let server = configs.get("app.Server").unwrap();
    assert_eq!(server.get("host"), Some(Value::str("example.org")));
    assert_eq!(server.get("port"), Some(Value::Int(9090)));

    let cache = configs.get("app.Cache").unwrap();
    let Some(Value::Map(limits)) = cache.get("limits") else {
        panic!("expected map");
    };
    assert_eq!(limits.len(), 2);

    let store = configs.read_file(&path).unwrap();
    assert_eq!(configs.unused_keys(&store), vec!["stray".to_string()]);
}

#[test]
fn test_invalid_field_blocks_whole_class() {
    let configs = configs();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    configs.add_update_listener(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let store = parse_properties("server.host=other\nserver.port=0\n");
    let reports = configs.apply_properties(&store, true);
    let server = reports.iter().find(|r| r.class == "app.Server").unwrap();
    assert!(!server.committed);
    assert!(server.has_invalid());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let live = configs.get("app.Server").unwrap();
    assert_eq!(live.get("host"), Some(Value::str("localhost")));

    let store = parse_properties("server.host=other\nserver.port=81\n");
    configs.apply_properties(&store, true);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(live.get("port"), Some(Value::Int(81)));
}

#[test]
fn test_command_line_overrides_file() {
    let configs = configs();
    let file = parse_properties("server.port=9000\nserver.host=file\n");
    let (cli, rest) = properties_from_args(["--c:server.port=9100", "--verbose"]);
    assert_eq!(rest, vec!["--verbose".to_string()]);

    let merged = merge_sources(&[("file", file), ("cli", cli)]);
    configs.apply_properties(&merged, true);

    let live = configs.get("app.Server").unwrap();
    assert_eq!(live.get("port"), Some(Value::Int(9100)));
    assert_eq!(live.get("host"), Some(Value::str("file")));
}

#[test]
#[serial]
fn test_environment_source() {
    unsafe {
        std::env::set_var("HOTCONF_IT_SERVER__PORT", "7070");
    }
    let env = hotconf::properties_from_env("HOTCONF_IT");
    unsafe {
        std::env::remove_var("HOTCONF_IT_SERVER__PORT");
    }
    assert_eq!(env.get("server.port"), Some("7070"));

    let configs = configs();
    configs.apply_properties(&env, true);
    let live = configs.get("app.Server").unwrap();
    assert_eq!(live.get("port"), Some(Value::Int(7070)));
}

#[test]
fn test_generated_file_round_trips() {
    let source = configs();
    let store = parse_properties(
        "server.host=gen.example\nserver.password=hunter2\ncache.limits=b>2;a>1\n",
    );
    source.apply_properties(&store, true);

    let generator = Generator::for_configs(&source);
    let text = generator.render_all(&source);
    assert!(text.starts_with("# app.Server\r\n"));
    assert!(text.contains("# Encrypted at rest\r\nserver.password=[secret:"));
    assert!(!text.contains("hunter2"));
    assert!(text.contains("cache.limits=[map]\r\ncache.limits.a=1\r\ncache.limits.b=2\r\n"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("app.ini");
    assert!(write_if_changed(&path, &text).unwrap());
    assert!(!write_if_changed(&path, &text).unwrap());

    let fresh = configs();
    let reports = fresh.load_file(&path).unwrap();
    assert!(reports.iter().all(|r| r.committed));
    for class in ["app.Server", "app.Cache"] {
        let original = source.get(class).unwrap().snapshot();
        let reloaded = fresh.get(class).unwrap().snapshot();
        assert!(hotconf::deep_equals(
            &Value::Object(original),
            &Value::Object(reloaded)
        ));
    }
}
