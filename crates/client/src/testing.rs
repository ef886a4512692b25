//! In-memory gateway for exercising the client without sockets.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    gatelink_credentials::{CredentialError, CredentialSource},
    gatelink_protocol::{BeatRequest, RegisterServiceRequest, RouteDescriptor},
    secrecy::Secret,
};

use crate::{GatewayApi, GatewayError, GatewayReply};

type Scripted = Mutex<VecDeque<Result<GatewayReply, GatewayError>>>;

/// Replays queued answers per endpoint; an empty queue answers `200 {}`.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    register: Scripted,
    beats: Scripted,
    routes: Scripted,
    pub passwords_seen: Mutex<Vec<Option<String>>>,
    pub routes_seen: Mutex<Vec<RouteDescriptor>>,
    pub beat_calls: AtomicUsize,
    register_delay: Duration,
}

impl ScriptedGateway {
    /// Make every registration call yield for `delay` before answering.
    pub fn with_register_delay(mut self, delay: Duration) -> Self {
        self.register_delay = delay;
        self
    }

    pub fn push_register(&self, reply: Result<GatewayReply, GatewayError>) -> &Self {
        self.register.lock().unwrap().push_back(reply);
        self
    }

    pub fn push_beat(&self, reply: Result<GatewayReply, GatewayError>) -> &Self {
        self.beats.lock().unwrap().push_back(reply);
        self
    }

    pub fn push_route(&self, reply: Result<GatewayReply, GatewayError>) -> &Self {
        self.routes.lock().unwrap().push_back(reply);
        self
    }

    pub fn register_calls(&self) -> usize {
        self.passwords_seen.lock().unwrap().len()
    }

    pub fn route_calls(&self) -> usize {
        self.routes_seen.lock().unwrap().len()
    }

    pub fn beats(&self) -> usize {
        self.beat_calls.load(Ordering::SeqCst)
    }

    fn next(queue: &Scripted) -> Result<GatewayReply, GatewayError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ok()))
    }
}

#[async_trait]
impl GatewayApi for ScriptedGateway {
    async fn register_service(
        &self,
        request: &RegisterServiceRequest<'_>,
    ) -> Result<GatewayReply, GatewayError> {
        self.passwords_seen
            .lock()
            .unwrap()
            .push(request.password.map(str::to_string));
        if !self.register_delay.is_zero() {
            tokio::time::sleep(self.register_delay).await;
        }
        Self::next(&self.register)
    }

    async fn beat(&self, _request: &BeatRequest<'_>) -> Result<GatewayReply, GatewayError> {
        self.beat_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.beats)
    }

    async fn register_route(&self, route: &RouteDescriptor) -> Result<GatewayReply, GatewayError> {
        self.routes_seen.lock().unwrap().push(route.clone());
        Self::next(&self.routes)
    }

    async fn ping(&self) -> Result<GatewayReply, GatewayError> {
        Ok(GatewayReply::new(200, "pong"))
    }
}

pub(crate) fn ok() -> GatewayReply {
    GatewayReply::new(200, "{}")
}

pub(crate) fn coded(status: u16, code: serde_json::Value) -> GatewayReply {
    GatewayReply::new(
        status,
        serde_json::json!({ "err_code": code, "message": "scripted" }).to_string(),
    )
}

pub(crate) fn unreachable() -> GatewayError {
    GatewayError::transport("scripted", "connection refused")
}

/// Hands out `pw-1`, `pw-2`, ... counting every read.
#[derive(Default)]
pub(crate) struct CountingSource {
    pub reads: AtomicUsize,
}

impl CountingSource {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for CountingSource {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn get_token(&self) -> Result<Secret<String>, CredentialError> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Secret::new(format!("pw-{n}")))
    }
}
