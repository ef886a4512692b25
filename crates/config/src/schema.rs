//! Config schema: gateway endpoint, service identity, credential source.

use std::time::Duration;

use {
    gatelink_protocol::{ALREADY_EXISTS_CODE, DYNAMIC_PASSWORD_CODE, ErrorCode},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatelinkConfig {
    pub gateway: GatewayConfig,
    pub service: ServiceConfig,
    pub credentials: CredentialsConfig,
}

/// Where the gateway lives and how to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL, e.g. `http://127.0.0.1:8080`. No trailing slash needed.
    pub url: String,

    /// Upper bound for every outbound call.
    pub request_timeout_secs: u64,

    /// Fixed delay between liveness beats.
    pub heartbeat_interval_secs: u64,

    pub sentinels: SentinelConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".into(),
            request_timeout_secs: 5,
            heartbeat_interval_secs: 10,
            sentinels: SentinelConfig::default(),
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

/// Error codes with special meaning.
///
/// Write them in the representation your gateway actually sends: a TOML
/// integer for numeric codes, a string for symbolic ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Route (or service) already known; treated as success.
    pub already_exists: ErrorCode,

    /// Registration secret was rotated; triggers one credential refresh.
    pub credential_rejected: ErrorCode,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            already_exists: ErrorCode::Numeric(ALREADY_EXISTS_CODE),
            credential_rejected: ErrorCode::from(DYNAMIC_PASSWORD_CODE),
        }
    }
}

/// Identity announced to the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    /// `host:port` the gateway should proxy to.
    pub address: String,
    /// Backend protocol tag, e.g. `http` or `grpc`.
    pub protocol: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: String::new(),
            protocol: "http".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSourceKind {
    /// Shared secret lives in Redis, rotated by the gateway.
    #[default]
    Redis,
    /// Fixed secret from `credentials.value`.
    Static,
    /// Register without a credential.
    None,
}

/// Where the registration secret is read from.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub source: CredentialSourceKind,

    /// `redis://host:port/db`. A bare `host:port` is accepted too.
    pub redis_url: String,

    /// Password of the Redis instance itself (not the gateway secret).
    pub redis_password: Option<String>,

    /// Key holding the gateway secret.
    pub key: String,

    /// Secret for `source = "static"`.
    pub value: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("source", &self.source)
            .field("redis_url", &self.redis_url)
            .field("redis_password", &self.redis_password.as_ref().map(|_| "[REDACTED]"))
            .field("key", &self.key)
            .field("value", &self.value.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            source: CredentialSourceKind::default(),
            redis_url: "redis://127.0.0.1:6379/0".into(),
            redis_password: None,
            key: "gateway:register:password".into(),
            value: None,
        }
    }
}

impl GatelinkConfig {
    /// Reject configs that cannot possibly register.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.gateway.url.trim().is_empty() {
            anyhow::bail!("gateway.url must not be empty");
        }
        if !self.gateway.url.starts_with("http://") && !self.gateway.url.starts_with("https://") {
            anyhow::bail!("gateway.url must be an http(s) URL, got {}", self.gateway.url);
        }
        if self.gateway.request_timeout_secs == 0 {
            anyhow::bail!("gateway.request_timeout_secs must be at least 1");
        }
        if self.gateway.heartbeat_interval_secs == 0 {
            anyhow::bail!("gateway.heartbeat_interval_secs must be at least 1");
        }
        if self.service.name.trim().is_empty() {
            anyhow::bail!("service.name must not be empty");
        }
        if self.service.name.contains('/') {
            anyhow::bail!("service.name must not contain '/'");
        }
        if self.service.address.trim().is_empty() {
            anyhow::bail!("service.address must not be empty");
        }
        match self.credentials.source {
            CredentialSourceKind::Static if self.credentials.value.is_none() => {
                anyhow::bail!("credentials.value is required when credentials.source = \"static\"");
            },
            CredentialSourceKind::Redis if self.credentials.key.is_empty() => {
                anyhow::bail!("credentials.key must not be empty");
            },
            _ => {},
        }
        Ok(())
    }
}
