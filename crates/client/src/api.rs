//! The four gateway endpoints behind one trait, plus the reqwest implementation.

use std::time::Duration;

use {
    async_trait::async_trait,
    gatelink_protocol::{
        API_PATH, BEAT_PATH, BeatRequest, GatewayResponse, PING_PATH, RegisterServiceRequest,
        RouteDescriptor, SERVICE_PATH,
    },
    serde::Serialize,
    tracing::{debug, trace},
    url::Url,
};

#[cfg(feature = "metrics")]
use gatelink_metrics::{REQUEST_DURATION_SECONDS, histogram, labels};

use crate::GatewayError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest body fragment carried into errors and logs.
const EXCERPT_LEN: usize = 200;

/// Raw answer from the gateway: status plus whatever body came back.
///
/// Interpretation (sentinels, success) belongs to the caller; the same
/// status means different things on different endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    pub status: u16,
    pub body: String,
}

impl GatewayReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The gateway only ever answers success with a bare 200.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Structured envelope, if the body is JSON.
    pub fn response(&self) -> Option<GatewayResponse> {
        GatewayResponse::parse(&self.body)
    }

    pub fn excerpt(&self) -> &str {
        let trimmed = self.body.trim();
        match trimmed.char_indices().nth(EXCERPT_LEN) {
            Some((idx, _)) => &trimmed[..idx],
            None => trimmed,
        }
    }
}

/// Outbound calls to the gateway.
///
/// Implementations report transport failures as [`GatewayError::Transport`]
/// and hand every HTTP answer back as a [`GatewayReply`], whatever its status.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// `POST /gateway/service`
    async fn register_service(
        &self,
        request: &RegisterServiceRequest<'_>,
    ) -> Result<GatewayReply, GatewayError>;

    /// `POST /gateway/service/beat`
    async fn beat(&self, request: &BeatRequest<'_>) -> Result<GatewayReply, GatewayError>;

    /// `POST /gateway/api`
    async fn register_route(&self, route: &RouteDescriptor) -> Result<GatewayReply, GatewayError>;

    /// `GET /gateway/ping`
    async fn ping(&self) -> Result<GatewayReply, GatewayError>;
}

// ── HTTP implementation ──────────────────────────────────────────────────────

/// [`GatewayApi`] over HTTP/1.1 JSON.
///
/// Every call, connect included, is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let parsed = Url::parse(base_url.trim())
            .map_err(|e| GatewayError::Config(format!("gateway url '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::Config(format!(
                "gateway url '{base_url}' must use http or https"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post_json<T: Serialize + Sync + ?Sized>(
        &self,
        endpoint: &'static str,
        body: &T,
        bearer: Option<&str>,
    ) -> Result<GatewayReply, GatewayError> {
        let mut request = self.client.post(self.url(endpoint)).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        self.send(endpoint, request).await
    }

    async fn send(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<GatewayReply, GatewayError> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();

        let result = self.exchange(endpoint, request).await;

        #[cfg(feature = "metrics")]
        histogram!(REQUEST_DURATION_SECONDS, labels::ENDPOINT => endpoint)
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn exchange(
        &self,
        endpoint: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<GatewayReply, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, &e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(endpoint, &e))?;

        trace!(endpoint, status, body = %body, "gateway reply");
        Ok(GatewayReply { status, body })
    }

    fn transport_error(&self, endpoint: &'static str, e: &reqwest::Error) -> GatewayError {
        let message = if e.is_timeout() {
            format!("timed out after {:?}", self.timeout)
        } else {
            e.to_string()
        };
        debug!(endpoint, error = %message, "gateway call failed");
        GatewayError::transport(endpoint, message)
    }
}

#[async_trait]
impl GatewayApi for HttpGateway {
    async fn register_service(
        &self,
        request: &RegisterServiceRequest<'_>,
    ) -> Result<GatewayReply, GatewayError> {
        self.post_json(SERVICE_PATH, request, request.password).await
    }

    async fn beat(&self, request: &BeatRequest<'_>) -> Result<GatewayReply, GatewayError> {
        self.post_json(BEAT_PATH, request, None).await
    }

    async fn register_route(&self, route: &RouteDescriptor) -> Result<GatewayReply, GatewayError> {
        self.post_json(API_PATH, route, None).await
    }

    async fn ping(&self) -> Result<GatewayReply, GatewayError> {
        self.send(PING_PATH, self.client.get(self.url(PING_PATH))).await
    }
}
