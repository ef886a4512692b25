//! Fixed-interval liveness beats.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use {
    gatelink_protocol::{BEAT_PATH, BeatRequest, ServiceIdentity},
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use {
    crate::telemetry,
    gatelink_metrics::{HEARTBEATS_TOTAL, outcome},
};

use crate::{GatewayApi, GatewayError};

/// Beats `POST /gateway/service/beat` until cancelled.
///
/// A failed beat is logged and the next one goes out on schedule. The
/// interval is the delay between the end of one beat and the start of the
/// next, with no jitter and no backoff.
pub struct Heartbeat {
    api: Arc<dyn GatewayApi>,
    identity: ServiceIdentity,
    interval: Duration,
}

impl Heartbeat {
    pub fn new(api: Arc<dyn GatewayApi>, identity: ServiceIdentity, interval: Duration) -> Self {
        Self {
            api,
            identity,
            interval,
        }
    }

    /// Send a single beat. Anything but HTTP 200 is an error.
    pub async fn beat_once(&self) -> Result<(), GatewayError> {
        let reply = self.api.beat(&BeatRequest::new(&self.identity)).await?;
        if reply.is_ok() {
            return Ok(());
        }
        let response = reply.response();
        Err(GatewayError::Protocol {
            endpoint: BEAT_PATH,
            status: reply.status,
            code: response.as_ref().and_then(|r| r.err_code.clone()),
            message: response
                .map(|r| r.message)
                .unwrap_or_else(|| reply.excerpt().to_string()),
        })
    }

    /// Spawn the loop on the current runtime. The first beat goes out
    /// immediately.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> HeartbeatHandle {
        let cancel = CancellationToken::new();
        let attempts = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(self.run(cancel.clone(), Arc::clone(&attempts)));
        HeartbeatHandle {
            cancel,
            task,
            attempts,
        }
    }

    async fn run(self, cancel: CancellationToken, attempts: Arc<AtomicU64>) {
        let service = self.identity.name().to_string();
        info!(service = %service, interval = ?self.interval, "heartbeat started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                result = self.beat_once() => {
                    attempts.fetch_add(1, Ordering::Relaxed);
                    match result {
                        Ok(()) => {
                            debug!(service = %service, "heartbeat ok");
                            #[cfg(feature = "metrics")]
                            telemetry::record_outcome(HEARTBEATS_TOTAL, outcome::OK);
                        },
                        Err(e) => {
                            warn!(service = %service, error = %e, "heartbeat failed");
                            #[cfg(feature = "metrics")]
                            telemetry::record_outcome(HEARTBEATS_TOTAL, outcome::FAILED);
                        },
                    }
                },
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {},
            }
        }

        info!(service = %service, "heartbeat stopped");
    }
}

/// Control over a running heartbeat.
///
/// Dropping the handle detaches the loop; it keeps beating for the life of
/// the runtime. Use [`HeartbeatHandle::cancel`] or
/// [`HeartbeatHandle::shutdown`] to stop it.
#[derive(Debug)]
pub struct HeartbeatHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    attempts: Arc<AtomicU64>,
}

impl HeartbeatHandle {
    /// Ask the loop to stop. No beat starts after this returns.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that stops the loop when cancelled, for wiring into the
    /// host's own shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Beats sent so far, failed ones included.
    pub fn beats_sent(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Cancel and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "heartbeat task ended abnormally");
        }
    }
}
