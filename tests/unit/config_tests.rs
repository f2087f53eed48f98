use std::time::Duration;

use job_board_client::errors::Error;
use job_board_client::retry::JitterStrategy;
use job_board_client::{Config, Environment};

#[test]
fn defaults_match_the_documented_values() {
    let config = Config::default();
    assert_eq!(config.base_url, "http://localhost:3001/api/v1");
    assert_eq!(config.timeout(), Duration::from_secs(10));
    assert_eq!(config.refresh_timeout(), Duration::from_secs(5));
    assert_eq!(config.refresh_threshold(), Duration::from_secs(300));
    assert_eq!(config.token_key, "job_board_token");
    assert_eq!(config.refresh_token_key, "job_board_refresh_token");
    assert_eq!(config.cache_max_size, 100);
    assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.environment, Environment::Development);
    assert!(!config.secure_cookies());
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.json");
    std::fs::write(
        &path,
        r#"{
            "base_url": "https://api.jobs.example.com/v1",
            "timeout_ms": 2500,
            "environment": "production",
            "retry_jitter": "full",
            "cache_max_size": 10
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.base_url, "https://api.jobs.example.com/v1");
    assert_eq!(config.timeout(), Duration::from_millis(2_500));
    assert_eq!(config.environment, Environment::Production);
    assert_eq!(config.retry_jitter, JitterStrategy::Full);
    assert_eq!(config.cache_max_size, 10);
    assert_eq!(config.max_retries, 3);
    assert!(config.secure_cookies());
}

#[test]
fn invalid_values_are_rejected() {
    let err = Config::default().with_base_url("::nope").validate().unwrap_err();
    assert!(matches!(err, Error::Config(msg) if msg.contains("Invalid base URL")));

    let err = Config::default()
        .with_cache(0, Duration::from_secs(1))
        .validate()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn zero_timeout_and_sweep_interval_are_rejected() {
    let config = Config {
        cache_sweep_interval_ms: 0,
        ..Config::default()
    };
    let err = config.validate().unwrap_err();
    assert!(matches!(err, Error::Config(msg) if msg.contains("cache_sweep_interval_ms")));

    let config = Config {
        timeout_ms: 0,
        ..Config::default()
    };
    let err = config.validate().unwrap_err();
    assert!(matches!(err, Error::Config(msg) if msg.contains("timeout_ms")));

    assert!(job_board_client::ApiClient::new(Config {
        cache_sweep_interval_ms: 0,
        ..Config::default()
    })
    .is_err());
}

#[test]
fn unparseable_file_is_a_json_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("client.json");
    std::fs::write(&path, "base_url = 'toml?'").unwrap();
    assert!(matches!(Config::from_file(&path), Err(Error::Json(_))));
}

#[test]
fn environment_parses_names() {
    assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
    assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
    assert!("staging".parse::<Environment>().is_err());
}
