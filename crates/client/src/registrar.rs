//! Route publication.

use std::sync::Arc;

use {
    gatelink_protocol::{API_PATH, ErrorCode, RouteDescriptor},
    tracing::{debug, error, info},
};

#[cfg(feature = "metrics")]
use {
    crate::telemetry,
    gatelink_metrics::{ROUTES_TOTAL, outcome},
};

use crate::{GatewayApi, GatewayError};

/// How the gateway took one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Created,
    /// Registered before; counts as success.
    AlreadyExists,
}

/// Submits route descriptors one by one.
pub struct RouteRegistrar {
    api: Arc<dyn GatewayApi>,
    already_exists: ErrorCode,
}

impl RouteRegistrar {
    pub fn new(api: Arc<dyn GatewayApi>, already_exists: ErrorCode) -> Self {
        Self {
            api,
            already_exists,
        }
    }

    pub async fn register_route(
        &self,
        route: &RouteDescriptor,
    ) -> Result<RouteOutcome, GatewayError> {
        let reply = self.api.register_route(route).await?;
        let response = reply.response();

        // The sentinel wins over the status: the gateway reports duplicates
        // with a non-200 status.
        if response
            .as_ref()
            .is_some_and(|r| r.has_code(&self.already_exists))
        {
            return Ok(RouteOutcome::AlreadyExists);
        }
        if reply.is_ok() {
            return Ok(RouteOutcome::Created);
        }

        Err(GatewayError::Protocol {
            endpoint: API_PATH,
            status: reply.status,
            code: response.as_ref().and_then(|r| r.err_code.clone()),
            message: response
                .map(|r| r.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| reply.excerpt().to_string()),
        })
    }

    /// Submit `routes` in order, stopping at the first failure.
    ///
    /// Returns how many were accepted (created or already present). Routes
    /// after a failure are not attempted; those before it stay registered.
    pub async fn register_routes(&self, routes: &[RouteDescriptor]) -> Result<usize, GatewayError> {
        match self.submit(routes).await {
            (accepted, None) => Ok(accepted),
            (_, Some(e)) => Err(e),
        }
    }

    /// [`Self::register_routes`], keeping the count accepted before a failure.
    pub async fn submit(&self, routes: &[RouteDescriptor]) -> (usize, Option<GatewayError>) {
        for (idx, route) in routes.iter().enumerate() {
            match self.register_route(route).await {
                Ok(RouteOutcome::Created) => {
                    debug!(route = %route, "route registered");
                    #[cfg(feature = "metrics")]
                    telemetry::record_outcome(ROUTES_TOTAL, outcome::OK);
                },
                Ok(RouteOutcome::AlreadyExists) => {
                    debug!(route = %route, "route already registered");
                    #[cfg(feature = "metrics")]
                    telemetry::record_outcome(ROUTES_TOTAL, outcome::ALREADY_EXISTS);
                },
                Err(e) => {
                    error!(
                        route = %route,
                        accepted = idx,
                        skipped = routes.len() - idx - 1,
                        error = %e,
                        "route registration failed, aborting batch"
                    );
                    #[cfg(feature = "metrics")]
                    telemetry::record_outcome(ROUTES_TOTAL, outcome::FAILED);
                    return (idx, Some(e));
                },
            }
        }

        info!(count = routes.len(), "routes registered with gateway");
        (routes.len(), None)
    }
}
