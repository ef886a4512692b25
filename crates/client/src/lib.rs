//! Register a service with the API gateway, keep it alive, publish its routes.
//!
//! ```no_run
//! # async fn run() -> Result<(), gatelink_client::GatewayError> {
//! use gatelink_client::GatewayService;
//! use gatelink_routing::RpcServiceTable;
//!
//! let config = gatelink_config::discover_and_load();
//! let service = GatewayService::from_config(&config)?;
//!
//! let mut server = RpcServiceTable::new().service("greeter.Greeter", ["SayHello"]);
//! let report = service.connect(gatelink_routing::Transport::Rpc(&mut server)).await?;
//! // The heartbeat keeps running after `report` is dropped.
//! # Ok(())
//! # }
//! ```

mod api;
mod error;
mod heartbeat;
mod registrar;
mod registration;
mod service;
#[cfg(feature = "metrics")]
mod telemetry;

#[cfg(test)]
mod testing;

pub use {
    api::{GatewayApi, GatewayReply, HttpGateway},
    error::GatewayError,
    heartbeat::{Heartbeat, HeartbeatHandle},
    registrar::{RouteOutcome, RouteRegistrar},
    registration::RegistrationClient,
    service::{ConnectReport, GatewayService, credential_source_from_config},
};
