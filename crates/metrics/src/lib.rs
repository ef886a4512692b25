//! Metric names recorded by gatelink.
//!
//! The crate only records through the `metrics` facade. Exporting (Prometheus,
//! statsd, ...) is the host process's business: install any recorder and the
//! counters below show up.

pub use metrics::{counter, histogram};

/// Service address registrations, labelled by [`labels::OUTCOME`].
pub const REGISTRATIONS_TOTAL: &str = "gatelink_registrations_total";

/// Liveness beats, labelled by [`labels::OUTCOME`].
pub const HEARTBEATS_TOTAL: &str = "gatelink_heartbeats_total";

/// Route submissions, labelled by [`labels::OUTCOME`].
pub const ROUTES_TOTAL: &str = "gatelink_routes_total";

/// Credential refreshes triggered by a rejected registration.
pub const CREDENTIAL_REFRESHES_TOTAL: &str = "gatelink_credential_refreshes_total";

/// Wall time of one gateway call in seconds, labelled by [`labels::ENDPOINT`].
pub const REQUEST_DURATION_SECONDS: &str = "gatelink_request_duration_seconds";

pub mod labels {
    pub const OUTCOME: &str = "outcome";
    pub const ENDPOINT: &str = "endpoint";
}

pub mod outcome {
    pub const OK: &str = "ok";
    pub const ALREADY_EXISTS: &str = "already_exists";
    pub const REJECTED: &str = "rejected";
    pub const FAILED: &str = "failed";
}
