//! Configuration loading and validation tests.

use std::io::Write;
use std::time::Duration;

use super::*;
use crate::error::ConfigError;

#[test]
fn defaults_are_valid() {
    let config = EngineConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.embedding.dimension, 384);
    assert_eq!(config.embedding.max_text_length, 512);
    assert_eq!(config.grid.hot_capacity, 256);
    assert_eq!(config.grid.filter_bits, 512);
    assert_eq!(config.grid.shard_count, 1024);
    assert_eq!(config.backend.kind, BackendKind::None);
    assert_eq!(config.breaker.failure_threshold, 5);
    assert_eq!(config.breaker.recovery_timeout_ms, 60_000);
    assert_eq!(config.retry.max_retries, 3);
    assert!(config.quantization.enabled);
}

#[test]
fn partial_toml_fills_in_defaults() {
    let toml = r#"
        [grid]
        hot_capacity = 64

        [backend]
        kind = "flat-scan"
    "#;
    let config: EngineConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.grid.hot_capacity, 64);
    assert_eq!(config.grid.shard_count, 1024);
    assert_eq!(config.backend.kind, BackendKind::FlatScan);
    assert!(config.validate().is_ok());
}

#[test]
fn from_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [embedding]
        dimension = 128
        cache_capacity = 16

        [breaker]
        failure_threshold = 2
        recovery_timeout_ms = 50
        "#
    )
    .unwrap();

    let config = EngineConfig::from_file(file.path()).unwrap();
    assert_eq!(config.embedding.dimension, 128);
    assert_eq!(config.embedding.cache_capacity, 16);
    assert_eq!(config.breaker.failure_threshold, 2);
    assert_eq!(config.breaker.recovery_timeout(), Duration::from_millis(50));
}

#[test]
fn missing_file_is_reported() {
    let err = EngineConfig::from_file("/no/such/essence-grid.toml").unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn malformed_toml_is_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[grid\nhot_capacity = ").unwrap();
    let err = EngineConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn zero_capacities_fail_validation() {
    let mut config = EngineConfig::default();
    config.grid.hot_capacity = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid { field, .. }) if field == "grid.hot_capacity"
    ));

    let mut config = EngineConfig::default();
    config.embedding.dimension = 0;
    assert!(config.validate().is_err());

    let mut config = EngineConfig::default();
    config.grid.filter_hashes = 9;
    assert!(config.validate().is_err());

    let mut config = EngineConfig::default();
    config.retry.initial_delay_ms = 5_000;
    config.retry.max_delay_ms = 100;
    assert!(config.validate().is_err());
}

#[test]
fn backend_kind_parses_from_str() {
    assert_eq!("none".parse::<BackendKind>().unwrap(), BackendKind::None);
    assert_eq!(
        "flat-scan".parse::<BackendKind>().unwrap(),
        BackendKind::FlatScan
    );
    assert_eq!("HNSW".parse::<BackendKind>().unwrap(), BackendKind::Hnsw);
    assert!("postgres".parse::<BackendKind>().is_err());
}

#[test]
fn env_override_applies_and_rejects_garbage() {
    // Variable names are unique to this test to avoid interference with
    // parallel tests reading the same environment.
    std::env::set_var("ESSENCE_GRID_HNSW_M", "32");
    let config = EngineConfig::default().with_env_overrides().unwrap();
    assert_eq!(config.hnsw.m, 32);
    std::env::remove_var("ESSENCE_GRID_HNSW_M");

    std::env::set_var("ESSENCE_GRID_HNSW_EF_SEARCH", "not-a-number");
    let err = EngineConfig::default().with_env_overrides().unwrap_err();
    assert!(matches!(err, ConfigError::EnvInvalid { var, .. } if var.ends_with("EF_SEARCH")));
    std::env::remove_var("ESSENCE_GRID_HNSW_EF_SEARCH");
}

#[test]
fn config_serializes_to_toml() {
    let config = EngineConfig::default();
    let rendered = toml::to_string(&config).unwrap();
    let parsed: EngineConfig = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed.grid.hot_capacity, config.grid.hot_capacity);
    assert_eq!(parsed.backend.kind, config.backend.kind);
}
