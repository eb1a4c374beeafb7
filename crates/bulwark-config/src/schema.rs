// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema.
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 4000
//! database:
//!   url: sqlite://bulwark.db
//! auth:
//!   auth_token_ttl_secs: 900
//!   refresh_token_ttl_secs: 7776000
//!   refresh_renew_threshold_secs: 604800
//! jwt:
//!   algorithm: ES256
//!   private_key_path: keys/private.pem
//!   public_key_path: keys/public.pem
//! logging:
//!   level: info
//!   format: text
//! ```

use std::fmt;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 4000;

/// Default access token lifetime (15 minutes).
pub const DEFAULT_AUTH_TOKEN_TTL_SECS: u64 = 900;

/// Default refresh token lifetime (90 days).
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 90 * 24 * 60 * 60;

/// Default remaining lifetime below which a refresh token is rotated (7 days).
pub const DEFAULT_REFRESH_RENEW_THRESHOLD_SECS: u64 = 7 * 24 * 60 * 60;

// =============================================================================
// BulwarkConfig
// =============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BulwarkConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Relational store settings.
    pub database: DatabaseConfig,
    /// Token lifetimes and password hashing.
    pub auth: AuthConfig,
    /// Signing keys.
    pub jwt: JwtConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl BulwarkConfig {
    /// Validates every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Bind port.
    pub port: u16,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Time allowed for in-flight requests on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,
    /// CORS settings.
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the shutdown grace period.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "must be greater than 0",
            ));
        }
        self.cors.validate()
    }
}

/// CORS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Whether the CORS layer is installed.
    pub enabled: bool,
    /// Allowed origins, `*` for any.
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    pub allowed_methods: Vec<String>,
    /// Allowed request headers, `*` for any.
    pub allowed_headers: Vec<String>,
    /// Whether credentials are allowed.
    pub allow_credentials: bool,
    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PATCH", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: false,
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    fn validate(&self) -> ConfigResult<()> {
        let wildcard = |list: &[String]| list.iter().any(|v| v == "*");
        if self.allow_credentials
            && (wildcard(&self.allowed_origins) || wildcard(&self.allowed_headers))
        {
            return Err(ConfigError::validation(
                "server.cors.allow_credentials",
                "credentials cannot be combined with wildcard origins or headers",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Relational store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Lock wait in seconds.
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://bulwark.db".to_string(),
            max_connections: 10,
            busy_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    /// Returns the busy timeout.
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::validation("database.url", "must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Auth Configuration
// =============================================================================

/// Token lifetimes and password hashing cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Access token lifetime in seconds.
    pub auth_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl_secs: u64,
    /// A refresh token with less remaining lifetime than this is rotated.
    pub refresh_renew_threshold_secs: u64,
    /// Argon2id cost parameters.
    pub password_hash: PasswordHashConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auth_token_ttl_secs: DEFAULT_AUTH_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            refresh_renew_threshold_secs: DEFAULT_REFRESH_RENEW_THRESHOLD_SECS,
            password_hash: PasswordHashConfig::default(),
        }
    }
}

impl AuthConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("auth.auth_token_ttl_secs", self.auth_token_ttl_secs),
            ("auth.refresh_token_ttl_secs", self.refresh_token_ttl_secs),
            (
                "auth.refresh_renew_threshold_secs",
                self.refresh_renew_threshold_secs,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::validation(field, "must be greater than 0"));
            }
            if value > i64::MAX as u64 {
                return Err(ConfigError::validation(field, "is out of range"));
            }
        }

        if self.refresh_renew_threshold_secs >= self.refresh_token_ttl_secs {
            return Err(ConfigError::validation(
                "auth.refresh_renew_threshold_secs",
                "must be less than auth.refresh_token_ttl_secs",
            ));
        }

        self.password_hash.validate()
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordHashConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl PasswordHashConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.iterations == 0 || self.parallelism == 0 {
            return Err(ConfigError::validation(
                "auth.password_hash",
                "iterations and parallelism must be greater than 0",
            ));
        }
        if self.memory_kib < 8 * self.parallelism {
            return Err(ConfigError::validation(
                "auth.password_hash.memory_kib",
                "must be at least 8 KiB per lane",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// JWT Configuration
// =============================================================================

/// Signing configuration.
///
/// Keys are resolved inline PEM first, then file. Inline values are never
/// serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JwtConfig {
    /// Signature algorithm.
    pub algorithm: JwtAlgorithm,
    /// Inline private key PEM.
    #[serde(skip_serializing)]
    pub private_key: Option<SecretValue>,
    /// Inline public key PEM.
    #[serde(skip_serializing)]
    pub public_key: Option<String>,
    /// Private key PEM file.
    pub private_key_path: PathBuf,
    /// Public key PEM file.
    pub public_key_path: PathBuf,
    /// Value for the `iss` claim, checked on verification when set.
    pub issuer: Option<String>,
    /// Clock skew tolerance in seconds.
    pub leeway_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            algorithm: JwtAlgorithm::default(),
            private_key: None,
            public_key: None,
            private_key_path: PathBuf::from("keys/private.pem"),
            public_key_path: PathBuf::from("keys/public.pem"),
            issuer: None,
            leeway_secs: 0,
        }
    }
}

/// Resolved PEM key pair.
#[derive(Clone)]
pub struct KeyPair {
    /// Private key PEM.
    pub private_pem: SecretValue,
    /// Public key PEM.
    pub public_pem: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_pem", &self.private_pem)
            .field("public_pem_len", &self.public_pem.len())
            .finish()
    }
}

impl JwtConfig {
    /// Environment variable carrying the inline private key.
    pub const PRIVATE_KEY_ENV: &'static str = "BULWARK_JWT_PRIVATE_KEY";

    /// Environment variable carrying the inline public key.
    pub const PUBLIC_KEY_ENV: &'static str = "BULWARK_JWT_PUBLIC_KEY";

    /// Sets inline PEM keys.
    pub fn with_keys(mut self, private_pem: impl Into<String>, public_pem: impl Into<String>) -> Self {
        self.private_key = Some(SecretValue::new(private_pem));
        self.public_key = Some(public_pem.into());
        self
    }

    /// Resolves both keys, reading files when no inline PEM is set.
    pub fn load_keys(&self) -> ConfigResult<KeyPair> {
        let private_pem = match &self.private_key {
            Some(secret) if !secret.expose().trim().is_empty() => secret.clone(),
            _ => SecretValue::new(read_pem(
                "private",
                Self::PRIVATE_KEY_ENV,
                &self.private_key_path,
            )?),
        };

        let public_pem = match &self.public_key {
            Some(pem) if !pem.trim().is_empty() => pem.clone(),
            _ => read_pem("public", Self::PUBLIC_KEY_ENV, &self.public_key_path)?,
        };

        Ok(KeyPair {
            private_pem,
            public_pem,
        })
    }
}

fn read_pem(key: &'static str, env_var: &str, path: &Path) -> ConfigResult<String> {
    if !path.exists() {
        return Err(ConfigError::missing_key(key, env_var, path));
    }
    fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
}

/// Asymmetric signature algorithms.
///
/// Symmetric (HMAC) algorithms are deliberately absent: the verification key
/// must be safe to hand to verifier-only components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    /// ECDSA P-256 / SHA-256.
    #[default]
    ES256,
    /// ECDSA P-384 / SHA-384.
    ES384,
    /// RSASSA-PKCS1-v1_5 / SHA-256.
    RS256,
    /// RSASSA-PKCS1-v1_5 / SHA-384.
    RS384,
    /// RSASSA-PKCS1-v1_5 / SHA-512.
    RS512,
    /// RSASSA-PSS / SHA-256.
    PS256,
    /// RSASSA-PSS / SHA-384.
    PS384,
    /// RSASSA-PSS / SHA-512.
    PS512,
    /// Ed25519.
    EdDSA,
}

impl JwtAlgorithm {
    /// Returns the JOSE name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::EdDSA => "EdDSA",
        }
    }

    /// Parses a JOSE name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ES256" => Some(Self::ES256),
            "ES384" => Some(Self::ES384),
            "RS256" => Some(Self::RS256),
            "RS384" => Some(Self::RS384),
            "RS512" => Some(Self::RS512),
            "PS256" => Some(Self::PS256),
            "PS384" => Some(Self::PS384),
            "PS512" => Some(Self::PS512),
            "EdDSA" => Some(Self::EdDSA),
            _ => None,
        }
    }
}

impl fmt::Display for JwtAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,
    /// Log format.
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a level name, accepting `warning` for `warn`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
    /// Condensed single-line text.
    Compact,
}

impl LogFormat {
    /// Parses a format name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "text" | "pretty" => Some(LogFormat::Text),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret string that never shows up in `Debug` or `Display` output.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wraps a secret.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BulwarkConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.socket_addr().to_string(), "0.0.0.0:4000");
        assert_eq!(config.auth.auth_token_ttl_secs, 900);
        assert_eq!(config.auth.refresh_token_ttl_secs, 7_776_000);
        assert_eq!(config.auth.refresh_renew_threshold_secs, 604_800);
        assert_eq!(config.jwt.algorithm, JwtAlgorithm::ES256);
        assert_eq!(config.jwt.private_key_path, PathBuf::from("keys/private.pem"));
        assert_eq!(config.database.url, "sqlite://bulwark.db");
        config.validate().unwrap();
    }

    #[test]
    fn test_threshold_must_be_below_refresh_ttl() {
        let mut config = BulwarkConfig::default();
        config.auth.refresh_renew_threshold_secs = config.auth.refresh_token_ttl_secs;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("refresh_renew_threshold_secs"));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = BulwarkConfig::default();
        config.auth.auth_token_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cors_credentials_with_wildcard_rejected() {
        let mut config = BulwarkConfig::default();
        config.server.cors.allow_credentials = true;
        assert!(config.validate().is_err());

        config.server.cors.allowed_origins = vec!["https://app.example.com".into()];
        config.validate().unwrap();
    }

    #[test]
    fn test_symmetric_algorithm_rejected() {
        let result: Result<JwtConfig, _> = serde_json::from_str(r#"{"algorithm":"HS256"}"#);
        assert!(result.is_err());

        let config: JwtConfig = serde_json::from_str(r#"{"algorithm":"EdDSA"}"#).unwrap();
        assert_eq!(config.algorithm, JwtAlgorithm::EdDSA);
        assert_eq!(JwtAlgorithm::parse("HS256"), None);
    }

    #[test]
    fn test_inline_keys_not_serialized() {
        let config = JwtConfig::default().with_keys("PRIVATE-PEM", "PUBLIC-PEM");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("PRIVATE-PEM"));
        assert!(!json.contains("PUBLIC-PEM"));
        assert!(!format!("{:?}", config).contains("PRIVATE-PEM"));
    }

    #[test]
    fn test_load_keys_inline_first() {
        let config = JwtConfig::default().with_keys("priv", "pub");
        let keys = config.load_keys().unwrap();
        assert_eq!(keys.private_pem.expose(), "priv");
        assert_eq!(keys.public_pem, "pub");
    }

    #[test]
    fn test_load_keys_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let private_path = dir.path().join("private.pem");
        let public_path = dir.path().join("public.pem");
        fs::write(&private_path, "file-priv").unwrap();
        fs::write(&public_path, "file-pub").unwrap();

        let config = JwtConfig {
            private_key_path: private_path,
            public_key_path: public_path,
            ..JwtConfig::default()
        };
        let keys = config.load_keys().unwrap();
        assert_eq!(keys.private_pem.expose(), "file-priv");
        assert_eq!(keys.public_pem, "file-pub");
    }

    #[test]
    fn test_load_keys_missing() {
        let config = JwtConfig {
            private_key_path: PathBuf::from("/nonexistent/private.pem"),
            ..JwtConfig::default()
        };
        let err = config.load_keys().unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { key: "private", .. }));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("nope"), None);
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
    }
}
