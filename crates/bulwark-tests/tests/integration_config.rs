// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Config Integration Tests
//!
//! Loading configuration files and turning them into a working signer.
//!
//! Every loader uses its own environment prefix so tests never see each
//! other's variables or the developer's `BULWARK_*` settings.

use std::path::Path;
use std::time::Duration;

use bulwark_api::{Claims, TokenSettings, TokenSigner, TokenType};
use bulwark_config::{ConfigError, ConfigLoader, JwtAlgorithm, LogFormat, LogLevel};
use bulwark_tests::common::temp_test_dir;
use bulwark_tests::prelude::*;

fn loader(prefix: &str) -> ConfigLoader {
    ConfigLoader::new().with_env_prefix(prefix)
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_config_yaml_with_key_files() {
    let dir = temp_test_dir("bulwark_config");
    write_key_files(dir.path());
    let path = write(
        dir.path(),
        "bulwark.yaml",
        r#"
server:
  port: 8081
auth:
  auth_token_ttl_secs: 600
jwt:
  algorithm: ES256
  private_key_path: private.pem
  public_key_path: public.pem
  issuer: bulwark-test
logging:
  level: debug
  format: json
"#,
    );

    let config = loader("BULWARK_IT_YAML").load(&path).unwrap();
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.jwt.algorithm, JwtAlgorithm::ES256);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.logging.format, LogFormat::Json);

    // Relative key paths resolve against the config file.
    let keys = config.jwt.load_keys().unwrap();
    let signer = TokenSigner::new(&config.jwt, &keys).unwrap();

    let settings = TokenSettings::from(&config.auth);
    assert_eq!(settings.auth_ttl, Duration::from_secs(600));

    let token = signer
        .sign(Claims::builder("user-1", TokenType::Auth), settings.auth_ttl)
        .unwrap();
    let claims = signer.verify(&token).unwrap();
    assert_eq!(claims.iss.as_deref(), Some("bulwark-test"));
    claims.assert_lifetime(600);

    // The test signer lacks the issuer, so its tokens are refused.
    let unissued = test_signer()
        .sign(Claims::builder("user-1", TokenType::Auth), settings.auth_ttl)
        .unwrap();
    assert!(signer.verify(&unissued).is_err());
}

#[test]
fn test_config_toml_and_json() {
    let dir = temp_test_dir("bulwark_config");

    let toml = write(
        dir.path(),
        "bulwark.toml",
        r#"
[database]
url = "sqlite://data/bulwark.db"
max_connections = 4
"#,
    );
    let config = loader("BULWARK_IT_TOML").load(&toml).unwrap();
    assert_eq!(config.database.url, "sqlite://data/bulwark.db");
    assert_eq!(config.database.max_connections, 4);

    let json = write(
        dir.path(),
        "bulwark.json",
        r#"{ "auth": { "refresh_token_ttl_secs": 86400, "refresh_renew_threshold_secs": 3600 } }"#,
    );
    let config = loader("BULWARK_IT_JSON").load(&json).unwrap();
    assert_eq!(config.auth.refresh_token_ttl_secs, 86400);
}

#[test]
fn test_config_env_overrides_and_placeholders() {
    std::env::set_var("BULWARK_IT_ENV_SERVER_PORT", "9999");
    std::env::set_var("BULWARK_IT_ENV_JWT_PRIVATE_KEY", TEST_PRIVATE_KEY);
    std::env::set_var("BULWARK_IT_ENV_JWT_PUBLIC_KEY", TEST_PUBLIC_KEY);
    std::env::set_var("BULWARK_IT_PLACEHOLDER_DB", "sqlite://from-env.db");

    let dir = temp_test_dir("bulwark_config");
    let path = write(
        dir.path(),
        "bulwark.yaml",
        r#"
server:
  port: 8081
database:
  url: "${BULWARK_IT_PLACEHOLDER_DB:sqlite://default.db}"
  busy_timeout_secs: ${BULWARK_IT_UNSET_TIMEOUT:7}
"#,
    );

    let config = loader("BULWARK_IT_ENV").load(&path).unwrap();
    assert_eq!(config.server.port, 9999);
    assert_eq!(config.database.url, "sqlite://from-env.db");
    assert_eq!(config.database.busy_timeout_secs, 7);

    // Inline keys from the environment win over files that do not exist.
    let keys = config.jwt.load_keys().unwrap();
    assert!(TokenSigner::new(&config.jwt, &keys).is_ok());
}

#[test]
fn test_config_missing_keys_names_the_variable() {
    let dir = temp_test_dir("bulwark_config");
    let path = write(dir.path(), "bulwark.yaml", "server:\n  port: 8081\n");

    let config = loader("BULWARK_IT_NOKEYS").load(&path).unwrap();
    let err = config.jwt.load_keys().unwrap_err();

    assert_eq!(err.error_type(), "missing_key");
    assert!(err.to_string().contains("BULWARK_JWT_PRIVATE_KEY"));
}

#[test]
fn test_config_validation() {
    let dir = temp_test_dir("bulwark_config");
    let path = write(
        dir.path(),
        "bulwark.yaml",
        r#"
auth:
  refresh_token_ttl_secs: 3600
  refresh_renew_threshold_secs: 7200
"#,
    );

    let err = loader("BULWARK_IT_INVALID").load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }), "{}", err);
}

#[test]
fn test_config_rejects_unknown_fields_and_hmac() {
    let dir = temp_test_dir("bulwark_config");

    let unknown = write(dir.path(), "unknown.yaml", "server:\n  bogus: 1\n");
    assert!(loader("BULWARK_IT_UNKNOWN").load(&unknown).is_err());

    let hmac = write(dir.path(), "hmac.yaml", "jwt:\n  algorithm: HS256\n");
    assert!(loader("BULWARK_IT_HMAC").load(&hmac).is_err());
}

#[test]
fn test_config_missing_file() {
    let dir = temp_test_dir("bulwark_config");
    let path = dir.path().join("absent.yaml");

    let err = loader("BULWARK_IT_ABSENT").load(&path).unwrap_err();
    assert!(err.is_io_error());

    let config = loader("BULWARK_IT_ABSENT").load_or_default(&path).unwrap();
    assert_eq!(config.server.port, bulwark_config::schema::DEFAULT_PORT);
}
