use std::path::{Path, PathBuf};

use practask::config::{Config, ConfigError, DEFAULT_LOG_FILTER, DEFAULT_USER};

#[test]
fn test_partial_config_keeps_defaults() {
    let config = Config::from_toml_str("user_id = \"mei\"\n", Path::new("inline.toml")).unwrap();
    assert_eq!(config.user_id, "mei");
    assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    assert_eq!(config.db_path, Config::default().db_path);
}

#[test]
fn test_full_config() {
    let toml = r#"
        db_path = "/tmp/practask/db.json"
        user_id = "kofi"
        log_filter = "practask=debug"
    "#;
    let config = Config::from_toml_str(toml, Path::new("inline.toml")).unwrap();
    assert_eq!(config.db_path, PathBuf::from("/tmp/practask/db.json"));
    assert_eq!(config.user_id, "kofi");
    assert_eq!(config.log_filter, "practask=debug");
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = Config::from_toml_str("user_id = [", Path::new("bad.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn test_missing_config_file_is_an_error() {
    let err = Config::from_file(Path::new("/nonexistent/practask/config.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_config_file_is_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "user_id = \"ana\"\n").unwrap();
    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.user_id, "ana");
    assert_ne!(config.user_id, DEFAULT_USER);
}
