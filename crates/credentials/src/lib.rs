//! Where the gateway registration secret comes from.
//!
//! The gateway rotates its shared secret out-of-band and writes the current
//! value to a store both sides can read. Sources here never cache: every
//! [`CredentialSource::get_token`] is a fresh read. Reuse between calls is
//! the job of [`CredentialCache`], which the registration path owns.

mod cache;
mod error;
mod redis_source;
mod source;

pub use {
    cache::CredentialCache,
    error::CredentialError,
    redis_source::RedisCredentialSource,
    source::{CredentialSource, StaticCredentialSource},
};

/// Default key the gateway writes its registration secret under.
pub const DEFAULT_KEY: &str = "gateway:register:password";
