//! The one-call integration surface.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    gatelink_config::{CredentialSourceKind, CredentialsConfig, GatelinkConfig, SentinelConfig},
    gatelink_credentials::{
        CredentialCache, CredentialSource, RedisCredentialSource, StaticCredentialSource,
    },
    gatelink_protocol::ServiceIdentity,
    gatelink_routing::Transport,
    tracing::{error, info, warn},
};

use crate::{
    GatewayApi, GatewayError, Heartbeat, HeartbeatHandle, HttpGateway, RegistrationClient,
    RouteRegistrar,
};

const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// What [`GatewayService::connect`] got done.
#[derive(Debug)]
pub struct ConnectReport {
    /// Whether either registration attempt succeeded.
    pub registered: bool,
    /// Routes the transport exposed.
    pub routes_total: usize,
    /// Routes the gateway accepted before `route_error`, or all of them.
    pub routes_submitted: usize,
    /// First route failure; later routes were not attempted.
    pub route_error: Option<GatewayError>,
    /// The running heartbeat. Dropping it does not stop the loop.
    pub heartbeat: HeartbeatHandle,
}

impl ConnectReport {
    pub fn is_complete(&self) -> bool {
        self.registered && self.route_error.is_none()
    }
}

/// Registers one service with the gateway, keeps it alive and publishes
/// its routes.
///
/// Holds the credential cache shared by every registration attempt and
/// guarantees at most one heartbeat per instance.
pub struct GatewayService {
    identity: ServiceIdentity,
    api: Arc<dyn GatewayApi>,
    source: Option<Arc<dyn CredentialSource>>,
    credentials: CredentialCache,
    sentinels: SentinelConfig,
    heartbeat_interval: Duration,
    heartbeat_started: AtomicBool,
}

impl GatewayService {
    /// No credential source, default sentinels, 10s heartbeat.
    pub fn new(identity: ServiceIdentity, api: Arc<dyn GatewayApi>) -> Self {
        Self {
            identity,
            api,
            source: None,
            credentials: CredentialCache::new(),
            sentinels: SentinelConfig::default(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_started: AtomicBool::new(false),
        }
    }

    /// Wire everything from a loaded config file.
    pub fn from_config(config: &GatelinkConfig) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(format!("{e:#}")))?;

        let timeout = config.gateway.request_timeout();
        let api = HttpGateway::with_timeout(&config.gateway.url, timeout)?;
        let identity = ServiceIdentity::new(
            config.service.name.as_str(),
            config.service.address.as_str(),
            config.service.protocol.as_str(),
        );

        let mut service = Self::new(identity, Arc::new(api))
            .with_sentinels(config.gateway.sentinels.clone())
            .with_heartbeat_interval(config.gateway.heartbeat_interval());
        if let Some(source) = credential_source_from_config(&config.credentials, timeout)? {
            service = service.with_credential_source(source);
        }
        Ok(service)
    }

    #[must_use]
    pub fn with_credential_source(mut self, source: Arc<dyn CredentialSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Share a cache with other services, or seed one up front.
    #[must_use]
    pub fn with_credential_cache(mut self, cache: CredentialCache) -> Self {
        self.credentials = cache;
        self
    }

    #[must_use]
    pub fn with_sentinels(mut self, sentinels: SentinelConfig) -> Self {
        self.sentinels = sentinels;
        self
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    pub fn credentials(&self) -> &CredentialCache {
        &self.credentials
    }

    pub fn registration_client(&self) -> RegistrationClient {
        RegistrationClient::new(
            Arc::clone(&self.api),
            self.source.clone(),
            self.sentinels.credential_rejected.clone(),
        )
    }

    pub fn route_registrar(&self) -> RouteRegistrar {
        RouteRegistrar::new(Arc::clone(&self.api), self.sentinels.already_exists.clone())
    }

    /// Register, and on failure try exactly once more. The second attempt
    /// picks up a credential refreshed by the first.
    pub async fn register_with_retry(&self) -> bool {
        let client = self.registration_client();
        if client
            .register_service_address(&self.identity, &self.credentials)
            .await
        {
            return true;
        }

        info!(service = self.identity.name(), "retrying service registration once");
        let registered = client
            .register_service_address(&self.identity, &self.credentials)
            .await;
        if !registered {
            error!(
                service = self.identity.name(),
                "service registration failed after retry"
            );
        }
        registered
    }

    /// Spawn the heartbeat. Only the first call on an instance succeeds.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_heartbeat(&self) -> Result<HeartbeatHandle, GatewayError> {
        self.claim_heartbeat()?;
        Ok(self.spawn_heartbeat())
    }

    /// Take the one heartbeat slot of this instance.
    fn claim_heartbeat(&self) -> Result<(), GatewayError> {
        if self.heartbeat_started.swap(true, Ordering::SeqCst) {
            return Err(GatewayError::HeartbeatAlreadyRunning(
                self.identity.name().to_string(),
            ));
        }
        Ok(())
    }

    fn spawn_heartbeat(&self) -> HeartbeatHandle {
        Heartbeat::new(
            Arc::clone(&self.api),
            self.identity.clone(),
            self.heartbeat_interval,
        )
        .start()
    }

    /// Register (with one retry), start the heartbeat, then publish every
    /// route `transport` exposes.
    ///
    /// Registration and route failures are reported in the
    /// [`ConnectReport`]; the heartbeat runs regardless. The only error is a
    /// second `connect` (or [`Self::start_heartbeat`]) on the same instance.
    pub async fn connect(
        &self,
        mut transport: Transport<'_>,
    ) -> Result<ConnectReport, GatewayError> {
        // Claimed before any await so concurrent callers never both register.
        self.claim_heartbeat()?;

        let registered = self.register_with_retry().await;
        let heartbeat = self.spawn_heartbeat();

        transport.prepare();
        let routes = transport.enumerate_routes(self.identity.name());
        info!(
            service = self.identity.name(),
            transport = transport.kind(),
            count = routes.len(),
            "publishing routes"
        );

        let (routes_submitted, route_error) = self.route_registrar().submit(&routes).await;

        if !registered {
            warn!(
                service = self.identity.name(),
                "connected without a confirmed registration; heartbeat is running"
            );
        }

        Ok(ConnectReport {
            registered,
            routes_total: routes.len(),
            routes_submitted,
            route_error,
            heartbeat,
        })
    }

    /// `GET /gateway/ping`: the body on 200, otherwise why not.
    pub async fn ping(&self) -> String {
        match self.api.ping().await {
            Ok(reply) if reply.is_ok() => reply.body,
            Ok(reply) => format!(
                "gateway ping failed: HTTP {}: {}",
                reply.status,
                reply.excerpt()
            ),
            Err(e) => format!("gateway ping failed: {e}"),
        }
    }
}

/// Build the configured credential source. `None` means register without
/// a credential.
pub fn credential_source_from_config(
    config: &CredentialsConfig,
    timeout: Duration,
) -> Result<Option<Arc<dyn CredentialSource>>, GatewayError> {
    match config.source {
        CredentialSourceKind::Redis => {
            let source = RedisCredentialSource::new(
                &config.redis_url,
                config.redis_password.as_deref(),
                Some(config.key.as_str()),
            )?
            .with_timeout(timeout);
            Ok(Some(Arc::new(source)))
        },
        CredentialSourceKind::Static => match config.value.as_deref() {
            Some(secret) => Ok(Some(Arc::new(StaticCredentialSource::new(secret)))),
            None => Err(GatewayError::Config(
                "credentials.value is required for a static source".into(),
            )),
        },
        CredentialSourceKind::None => Ok(None),
    }
}
