//! One registration attempt, with credential refresh on rejection.

use std::sync::Arc;

use {
    gatelink_credentials::{CredentialCache, CredentialSource},
    gatelink_protocol::{ErrorCode, RegisterServiceRequest, SERVICE_PATH, ServiceIdentity},
    secrecy::{ExposeSecret, Secret},
    tracing::{info, warn},
};

#[cfg(feature = "metrics")]
use {
    crate::telemetry,
    gatelink_metrics::{CREDENTIAL_REFRESHES_TOTAL, REGISTRATIONS_TOTAL, outcome},
};

use crate::{GatewayApi, GatewayError};

/// Announces a service address to the gateway.
///
/// A single call never retries. When the gateway rejects the credential the
/// cache is refreshed from the source so that the caller's next attempt
/// carries the new secret.
pub struct RegistrationClient {
    api: Arc<dyn GatewayApi>,
    source: Option<Arc<dyn CredentialSource>>,
    credential_rejected: ErrorCode,
}

impl RegistrationClient {
    pub fn new(
        api: Arc<dyn GatewayApi>,
        source: Option<Arc<dyn CredentialSource>>,
        credential_rejected: ErrorCode,
    ) -> Self {
        Self {
            api,
            source,
            credential_rejected,
        }
    }

    /// `true` only on HTTP 200. Every failure is logged, none propagates.
    pub async fn register_service_address(
        &self,
        identity: &ServiceIdentity,
        cache: &CredentialCache,
    ) -> bool {
        self.register_service_address_detailed(identity, cache)
            .await
            .is_ok()
    }

    /// Same attempt as [`Self::register_service_address`], keeping the cause.
    pub async fn register_service_address_detailed(
        &self,
        identity: &ServiceIdentity,
        cache: &CredentialCache,
    ) -> Result<(), GatewayError> {
        let credential = self.credential(cache).await;
        let password = credential.as_ref().map(|s| s.expose_secret().as_str());
        let request = RegisterServiceRequest::new(identity, password);

        let reply = match self.api.register_service(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(service = identity.name(), error = %e, "service registration failed");
                #[cfg(feature = "metrics")]
                telemetry::record_outcome(REGISTRATIONS_TOTAL, outcome::FAILED);
                return Err(e);
            },
        };

        if reply.is_ok() {
            info!(
                service = identity.name(),
                address = identity.address(),
                prefix = %request.prefix,
                "service registered with gateway"
            );
            #[cfg(feature = "metrics")]
            telemetry::record_outcome(REGISTRATIONS_TOTAL, outcome::OK);
            return Ok(());
        }

        let response = reply.response();
        let code = response.as_ref().and_then(|r| r.err_code.clone());

        if code.as_ref() == Some(&self.credential_rejected) {
            warn!(
                service = identity.name(),
                status = reply.status,
                "gateway rejected registration credential, refreshing"
            );
            #[cfg(feature = "metrics")]
            telemetry::record_outcome(REGISTRATIONS_TOTAL, outcome::REJECTED);
            self.refresh(cache).await;
            return Err(GatewayError::CredentialRejected);
        }

        let err = GatewayError::Protocol {
            endpoint: SERVICE_PATH,
            status: reply.status,
            code,
            message: response
                .map(|r| r.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| reply.excerpt().to_string()),
        };
        warn!(service = identity.name(), error = %err, "service registration refused");
        #[cfg(feature = "metrics")]
        telemetry::record_outcome(REGISTRATIONS_TOTAL, outcome::FAILED);
        Err(err)
    }

    /// Cached secret, else a fresh read. Without a source only a seeded
    /// cache can supply one. An unavailable store means registering bare.
    async fn credential(&self, cache: &CredentialCache) -> Option<Secret<String>> {
        let Some(source) = self.source.as_deref() else {
            return cache.current().await;
        };
        match cache.get_or_fetch(source).await {
            Ok(secret) => Some(secret),
            Err(e) => {
                warn!(source = source.name(), error = %e, "no registration credential available");
                None
            },
        }
    }

    async fn refresh(&self, cache: &CredentialCache) {
        match self.source.as_deref() {
            Some(source) => {
                if cache.refresh(source).await.is_ok() {
                    #[cfg(feature = "metrics")]
                    telemetry::record(CREDENTIAL_REFRESHES_TOTAL);
                }
            },
            // Nothing to refresh from; stop replaying the refused secret.
            None => cache.clear().await,
        }
    }
}
