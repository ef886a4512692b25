#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential store unavailable: {0}")]
    SourceUnavailable(String),

    #[error("credential key '{key}' is missing or empty")]
    KeyMissing { key: String },

    #[error("invalid credential store config: {0}")]
    InvalidConfig(String),
}

impl CredentialError {
    /// True when the store could not produce a value right now; a later
    /// read may succeed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::KeyMissing { .. })
    }
}

impl From<redis::RedisError> for CredentialError {
    fn from(e: redis::RedisError) -> Self {
        Self::SourceUnavailable(e.to_string())
    }
}
