use std::{fmt, time::Duration};

use {
    async_trait::async_trait,
    redis::AsyncCommands,
    secrecy::Secret,
    tracing::{debug, trace},
    url::Url,
};

use crate::{CredentialError, CredentialSource, DEFAULT_KEY};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads the gateway secret from a Redis key on every call.
pub struct RedisCredentialSource {
    client: redis::Client,
    key: String,
    timeout: Duration,
    /// `host:port/db` with credentials stripped, for logs.
    endpoint: String,
}

impl RedisCredentialSource {
    /// Connect lazily to `url` (`redis://host:port/db` or bare `host:port`,
    /// which selects DB 0). `password` authenticates against Redis itself.
    pub fn new(
        url: &str,
        password: Option<&str>,
        key: Option<&str>,
    ) -> Result<Self, CredentialError> {
        let url = normalize_url(url, password)?;
        let endpoint = format!(
            "{}:{}{}",
            url.host_str().unwrap_or("localhost"),
            url.port().unwrap_or(6379),
            url.path()
        );
        let client = redis::Client::open(url.as_str())
            .map_err(|e| CredentialError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            key: key.unwrap_or(DEFAULT_KEY).to_string(),
            timeout: DEFAULT_TIMEOUT,
            endpoint,
        })
    }

    /// Bound each read (connect + GET). Expiry counts as unavailable.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn read(&self) -> Result<Option<String>, CredentialError> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.get(&self.key).await?;
        Ok(value)
    }
}

fn normalize_url(raw: &str, password: Option<&str>) -> Result<Url, CredentialError> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("redis://{raw}/0")
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| CredentialError::InvalidConfig(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "redis" | "rediss") {
        return Err(CredentialError::InvalidConfig(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if let Some(pw) = password.filter(|p| !p.is_empty()) {
        url.set_password(Some(pw)).map_err(|()| {
            CredentialError::InvalidConfig(format!("{raw}: cannot carry a password"))
        })?;
    }
    Ok(url)
}

impl fmt::Debug for RedisCredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCredentialSource")
            .field("endpoint", &self.endpoint)
            .field("key", &self.key)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl CredentialSource for RedisCredentialSource {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get_token(&self) -> Result<Secret<String>, CredentialError> {
        trace!(endpoint = %self.endpoint, key = %self.key, "reading registration credential");

        let value = tokio::time::timeout(self.timeout, self.read())
            .await
            .map_err(|_| {
                CredentialError::SourceUnavailable(format!(
                    "timed out after {:?} reading {} from {}",
                    self.timeout, self.key, self.endpoint
                ))
            })??;

        match value {
            Some(v) if !v.is_empty() => {
                debug!(endpoint = %self.endpoint, key = %self.key, "read registration credential");
                Ok(Secret::new(v))
            },
            _ => Err(CredentialError::KeyMissing {
                key: self.key.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_address_selects_db_zero() {
        let source = RedisCredentialSource::new("10.0.0.5:6380", None, None).unwrap();
        assert_eq!(source.endpoint(), "10.0.0.5:6380/0");
        assert_eq!(source.key(), DEFAULT_KEY);
    }

    #[test]
    fn full_url_and_custom_key() {
        let source =
            RedisCredentialSource::new("redis://cache.internal:6379/2", None, Some("gw:pw"))
                .unwrap();
        assert_eq!(source.endpoint(), "cache.internal:6379/2");
        assert_eq!(source.key(), "gw:pw");
    }

    #[test]
    fn password_is_embedded_but_not_logged() {
        let url = normalize_url("127.0.0.1:6379", Some("p@ss/word")).unwrap();
        assert_eq!(url.password(), Some("p%40ss%2Fword"));

        let source =
            RedisCredentialSource::new("127.0.0.1:6379", Some("p@ss/word"), None).unwrap();
        let out = format!("{source:?}");
        assert!(!out.contains("p@ss"));
        assert!(!out.contains("p%40ss"));
    }

    #[test]
    fn rejects_other_schemes() {
        let err = RedisCredentialSource::new("http://127.0.0.1:6379", None, None).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidConfig(_)));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn unreachable_store_is_unavailable() {
        // Port 1 is never a Redis server; connect is refused or times out.
        let source = RedisCredentialSource::new("127.0.0.1:1", None, None)
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        let err = source.get_token().await.unwrap_err();
        assert!(matches!(err, CredentialError::SourceUnavailable(_)));
        assert!(err.is_unavailable());
    }
}
