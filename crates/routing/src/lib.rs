//! What a host process exposes, turned into gateway route descriptors.
//!
//! The host framework is a collaborator: it hands over `(path, method)` pairs
//! for HTTP servers, or service/method tables for RPC servers. This crate
//! converts them into [`RouteDescriptor`]s and owns the method-name → path
//! transform used for RPC routes.

mod catalog;
mod manifest;
pub mod naming;

pub use {
    catalog::{
        HttpRoute, HttpRouteSource, RpcServer, RpcService, RpcServiceTable, StaticHttpRoutes,
        Transport,
    },
    gatelink_protocol::RouteDescriptor,
    manifest::{ManifestCatalog, ManifestError, RouteManifest},
    naming::{method_to_path, method_to_snake},
};
