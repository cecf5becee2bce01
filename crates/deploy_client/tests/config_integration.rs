//! Integration tests for config load/save.

use deploy_client::{config, Config};
use predicates::prelude::*;

#[test]
fn load_existing_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(
        &config_path,
        r#"
server:
  base_url: "wss://deploy.example.com"
log:
  level: debug
  json: true
"#,
    )
    .unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert_eq!(
        cfg.server.base_url.as_deref(),
        Some("wss://deploy.example.com")
    );
    assert_eq!(cfg.base_url(), "wss://deploy.example.com");
    assert_eq!(cfg.log.level.as_deref(), Some("debug"));
    assert_eq!(cfg.log.json, Some(true));
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "log:\n  level: info\n").unwrap();

    let cfg = config::load(&config_path).expect("load should succeed");
    assert!(cfg.server.base_url.is_none());
    assert_eq!(cfg.base_url(), "ws://localhost:8000");
}

#[test]
fn load_or_default_without_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("absent.yaml");

    let cfg = config::load_or_default(&config_path).expect("defaults expected");
    assert_eq!(cfg.base_url(), "ws://localhost:8000");
    assert!(config::load(&config_path).is_err());
}

#[test]
fn malformed_yaml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.yaml");
    std::fs::write(&config_path, "server: [unclosed").unwrap();

    let err = config::load(&config_path).unwrap_err();
    assert!(matches!(err, config::ConfigError::Yaml(_)));
}

#[test]
fn save_creates_directory_and_file_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("deploy-client");
    let config_path = config_dir.join("config.yaml");
    assert!(!config_dir.exists(), "config dir should not exist yet");

    let mut cfg = Config::default();
    cfg.server.base_url = Some("ws://10.0.0.2:8000".into());
    cfg.log.level = Some("warn".into());

    config::save(&config_path, &cfg).expect("save should succeed");
    assert!(
        predicates::path::exists().eval(&config_path),
        "config file should exist after save"
    );

    let contents = std::fs::read_to_string(&config_path).unwrap();
    assert!(predicates::str::contains("base_url").eval(&contents));
    assert!(
        !predicates::str::contains("json").eval(&contents),
        "unset fields should not be written"
    );

    let reloaded = config::load(&config_path).expect("reload should succeed");
    assert_eq!(reloaded.base_url(), "ws://10.0.0.2:8000");
    assert_eq!(reloaded.log.level.as_deref(), Some("warn"));
}

/// Config path resolves to `~/.deploy-client/config.yaml` using the platform's home dir.
#[test]
fn default_config_path_uses_home_directory() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().to_str().unwrap().to_string();

    let key = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    let original = std::env::var(key).ok();

    std::env::set_var(key, &home);
    let path = config::default_config_path();
    match original {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }

    let path = path.expect("should resolve a config path");
    let expected = dir.path().join(".deploy-client").join("config.yaml");
    assert_eq!(path, expected);
}
