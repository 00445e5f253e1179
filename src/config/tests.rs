use super::*;

fn memory_raw() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.database.backend = Some("memory".to_string());
    raw.cache.backend = Some("memory".to_string());
    raw
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = memory_raw();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_documented_values() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("postgres://localhost/recache".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:5000");
    assert_eq!(settings.server.max_body_bytes, 2 * 1024 * 1024);
    assert_eq!(
        settings.database.backend,
        DatabaseBackend::Postgres {
            url: "postgres://localhost/recache".to_string()
        }
    );
    assert_eq!(settings.database.max_connections.get(), 8);
    assert_eq!(
        settings.cache.backend,
        CacheBackend::Redis {
            url: "redis://127.0.0.1:6379/0".to_string()
        }
    );
    assert_eq!(settings.cache.ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.memory_max_entries.get(), 10_000);
}

#[test]
fn postgres_backend_requires_url() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let err = Settings::from_raw(raw).expect_err("missing url");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.url",
            ..
        }
    ));
}

#[test]
fn unknown_backend_is_rejected() {
    let mut raw = memory_raw();
    raw.cache.backend = Some("memcached".to_string());

    let err = Settings::from_raw(raw).expect_err("unknown backend");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.backend",
            ..
        }
    ));
}

#[test]
fn backend_names_are_case_insensitive() {
    let mut raw = memory_raw();
    raw.database.backend = Some("Memory".to_string());
    raw.cache.backend = Some(" REDIS ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.database.backend, DatabaseBackend::Memory);
    assert_eq!(settings.cache.backend.to_string(), "redis");
}

#[test]
fn zero_values_are_rejected() {
    let cases: [(&str, fn(&mut RawSettings)); 4] = [
        ("server.port", |raw| raw.server.port = Some(0)),
        ("server.max_body_bytes", |raw| {
            raw.server.max_body_bytes = Some(0)
        }),
        ("cache.ttl_seconds", |raw| raw.cache.ttl_seconds = Some(0)),
        ("cache.memory_max_entries", |raw| {
            raw.cache.memory_max_entries = Some(0)
        }),
    ];

    for (expected, mutate) in cases {
        let mut raw = memory_raw();
        mutate(&mut raw);
        match Settings::from_raw(raw) {
            Err(LoadError::Invalid { key, .. }) => assert_eq!(key, expected),
            other => panic!("expected invalid `{expected}`, got {other:?}"),
        }
    }
}

#[test]
fn cache_ttl_is_bounded_above() {
    let mut raw = memory_raw();
    raw.cache.ttl_seconds = Some(MAX_TTL_SECS);
    let settings = Settings::from_raw(raw).expect("largest ttl is accepted");
    assert_eq!(settings.cache.ttl, Duration::from_secs(MAX_TTL_SECS));

    for ttl in [MAX_TTL_SECS + 1, u64::MAX] {
        let mut raw = memory_raw();
        raw.cache.ttl_seconds = Some(ttl);
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid {
                key: "cache.ttl_seconds",
                ..
            })
        ));
    }
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = memory_raw();
    raw.logging.level = Some("loud".to_string());

    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "logging.level",
            ..
        })
    ));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = memory_raw();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.format, LogFormat::Json);
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["recache"]);
    let command = args.command.unwrap_or_default();
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_arguments() {
    let args = CliArgs::parse_from([
        "recache",
        "serve",
        "--server-port",
        "8080",
        "--cache-backend",
        "memory",
        "--database-backend",
        "memory",
        "--cache-ttl-seconds",
        "60",
    ]);

    let Some(Command::Serve(serve)) = args.command else {
        panic!("expected serve command");
    };
    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&serve.overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 8080);
    assert_eq!(settings.cache.backend, CacheBackend::Memory);
    assert_eq!(settings.cache.ttl, Duration::from_secs(60));
}

#[test]
fn parse_check_arguments() {
    let args = CliArgs::parse_from([
        "recache",
        "check",
        "--database-url",
        "postgres://example",
        "--cache-url",
        "redis://cache:6379/1",
    ]);

    let Some(Command::Check(check)) = args.command else {
        panic!("expected check command");
    };
    let mut raw = RawSettings::default();
    raw.apply_collaborator_overrides(&check.collaborators);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.database.backend,
        DatabaseBackend::Postgres {
            url: "postgres://example".to_string()
        }
    );
    assert_eq!(
        settings.cache.backend,
        CacheBackend::Redis {
            url: "redis://cache:6379/1".to_string()
        }
    );
}
