use std::fmt;

use {async_trait::async_trait, secrecy::Secret};

use crate::CredentialError;

/// Supplies the current registration secret.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Read the current secret. Must not cache.
    async fn get_token(&self) -> Result<Secret<String>, CredentialError>;
}

/// A secret that never rotates.
#[derive(Clone)]
pub struct StaticCredentialSource {
    secret: Secret<String>,
}

impl StaticCredentialSource {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Secret::new(secret.into()),
        }
    }
}

impl fmt::Debug for StaticCredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentialSource")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl CredentialSource for StaticCredentialSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_token(&self) -> Result<Secret<String>, CredentialError> {
        Ok(self.secret.clone())
    }
}
