//! Wire types shared by every gatelink crate.
//!
//! The gateway speaks plain JSON over HTTP. Every reply carries an
//! `err_code`, which is the only thing callers branch on; the HTTP status is
//! secondary.

mod error_code;
mod types;

pub use {
    error_code::ErrorCode,
    types::{
        BeatRequest, GatewayResponse, RegisterServiceRequest, RouteDescriptor, ServiceIdentity,
    },
};

/// Service registration endpoint.
pub const SERVICE_PATH: &str = "/gateway/service";

/// Liveness endpoint.
pub const BEAT_PATH: &str = "/gateway/service/beat";

/// Route table endpoint.
pub const API_PATH: &str = "/gateway/api";

/// Diagnostics probe.
pub const PING_PATH: &str = "/gateway/ping";

/// Code the gateway returns when a route is already in its table.
pub const ALREADY_EXISTS_CODE: i64 = 410_100;

/// Code the gateway returns when the shared registration secret was rotated.
pub const DYNAMIC_PASSWORD_CODE: &str = "Error.RedisDynamicPassword";

/// HTTP method used for every RPC route.
pub const RPC_HTTP_METHOD: &str = "POST";
