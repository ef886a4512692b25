use std::{fmt, sync::Arc};

use {
    secrecy::Secret,
    tokio::sync::Mutex,
    tracing::{debug, warn},
};

use crate::{CredentialError, CredentialSource};

/// Last credential that was handed to the gateway.
///
/// Not authoritative: the source is. The cache only saves a store round
/// trip on the happy path and is replaced whenever the gateway rejects it.
/// Clones share the same slot.
#[derive(Clone, Default)]
pub struct CredentialCache {
    slot: Arc<Mutex<Option<Secret<String>>>>,
}

impl CredentialCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache, e.g. from a secret the host already has.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(Secret::new(secret.into())))),
        }
    }

    pub async fn current(&self) -> Option<Secret<String>> {
        self.slot.lock().await.clone()
    }

    pub async fn replace(&self, secret: Secret<String>) {
        *self.slot.lock().await = Some(secret);
    }

    pub async fn clear(&self) {
        *self.slot.lock().await = None;
    }

    /// Cached value, or one fresh read from `source` stored for next time.
    ///
    /// The lock is held across the read so concurrent callers trigger a
    /// single fetch.
    pub async fn get_or_fetch(
        &self,
        source: &dyn CredentialSource,
    ) -> Result<Secret<String>, CredentialError> {
        let mut slot = self.slot.lock().await;
        if let Some(secret) = slot.as_ref() {
            return Ok(secret.clone());
        }
        let secret = source.get_token().await?;
        debug!(source = source.name(), "cached registration credential");
        *slot = Some(secret.clone());
        Ok(secret)
    }

    /// Replace the cached value with a fresh read.
    ///
    /// On failure the stale value is dropped, so the next attempt goes back
    /// to the source instead of replaying a secret the gateway refused.
    pub async fn refresh(&self, source: &dyn CredentialSource) -> Result<(), CredentialError> {
        let mut slot = self.slot.lock().await;
        match source.get_token().await {
            Ok(secret) => {
                *slot = Some(secret);
                debug!(source = source.name(), "refreshed registration credential");
                Ok(())
            },
            Err(e) => {
                *slot = None;
                warn!(source = source.name(), error = %e, "credential refresh failed");
                Err(e)
            },
        }
    }
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use {async_trait::async_trait, secrecy::ExposeSecret};

    use super::*;

    /// Hands out `pw-1`, `pw-2`, ... and fails once `fail_after` reads happened.
    struct Rotating {
        reads: AtomicUsize,
        fail_after: usize,
    }

    impl Rotating {
        fn new(fail_after: usize) -> Self {
            Self {
                reads: AtomicUsize::new(0),
                fail_after,
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialSource for Rotating {
        fn name(&self) -> &'static str {
            "rotating"
        }

        async fn get_token(&self) -> Result<Secret<String>, CredentialError> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
            if n > self.fail_after {
                return Err(CredentialError::SourceUnavailable("store down".into()));
            }
            Ok(Secret::new(format!("pw-{n}")))
        }
    }

    #[tokio::test]
    async fn fetches_once_then_reuses() {
        let source = Rotating::new(10);
        let cache = CredentialCache::new();

        let a = cache.get_or_fetch(&source).await.unwrap();
        let b = cache.get_or_fetch(&source).await.unwrap();
        assert_eq!(a.expose_secret(), "pw-1");
        assert_eq!(b.expose_secret(), "pw-1");
        assert_eq!(source.reads(), 1);
    }

    #[tokio::test]
    async fn refresh_replaces_value() {
        let source = Rotating::new(10);
        let cache = CredentialCache::new();
        cache.get_or_fetch(&source).await.unwrap();

        cache.refresh(&source).await.unwrap();
        let current = cache.current().await.unwrap();
        assert_eq!(current.expose_secret(), "pw-2");
    }

    #[tokio::test]
    async fn failed_refresh_drops_stale_value() {
        let source = Rotating::new(1);
        let cache = CredentialCache::new();
        cache.get_or_fetch(&source).await.unwrap();

        assert!(cache.refresh(&source).await.is_err());
        assert!(cache.current().await.is_none());
    }

    #[tokio::test]
    async fn clones_share_the_slot() {
        let cache = CredentialCache::with_secret("seed");
        let other = cache.clone();
        other.replace(Secret::new("rotated".into())).await;
        assert_eq!(cache.current().await.unwrap().expose_secret(), "rotated");
        cache.clear().await;
        assert!(other.current().await.is_none());
    }

    #[test]
    fn debug_hides_contents() {
        let out = format!("{:?}", CredentialCache::with_secret("hidden"));
        assert!(!out.contains("hidden"));
    }
}
