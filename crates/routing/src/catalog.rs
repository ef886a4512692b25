use std::collections::BTreeMap;

use {
    gatelink_protocol::RouteDescriptor,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::naming::method_to_path;

// ── Collaborator contracts ───────────────────────────────────────────────────

/// One `(path, method)` pair from an HTTP router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRoute {
    pub path: String,
    pub method: String,
}

impl HttpRoute {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
        }
    }
}

/// Anything that can list the routes of an HTTP server.
pub trait HttpRouteSource: Send + Sync {
    fn routes(&self) -> Vec<HttpRoute>;
}

/// One RPC service and the names of its methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcService {
    /// Fully-qualified service name, e.g. `greeter.Greeter`.
    pub name: String,
    pub methods: Vec<String>,
}

/// An RPC server as seen by the registrar: it can describe itself and can
/// be asked to expose reflection so external tooling can discover methods.
pub trait RpcServer: Send {
    fn services(&self) -> Vec<RpcService>;

    fn enable_reflection(&mut self);
}

// ── Transport ────────────────────────────────────────────────────────────────

/// The server whose routes get published.
pub enum Transport<'a> {
    Http(&'a dyn HttpRouteSource),
    Rpc(&'a mut dyn RpcServer),
}

impl Transport<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Rpc(_) => "rpc",
        }
    }

    /// Per-transport setup before enumeration. RPC servers get reflection.
    pub fn prepare(&mut self) {
        if let Self::Rpc(server) = self {
            server.enable_reflection();
            debug!("rpc reflection enabled");
        }
    }

    /// Descriptors for every route the server exposes, owned by
    /// `service_name`. RPC services are visited in name order.
    pub fn enumerate_routes(&self, service_name: &str) -> Vec<RouteDescriptor> {
        match self {
            Self::Http(source) => source
                .routes()
                .into_iter()
                .map(|r| RouteDescriptor::http(service_name, r.path, r.method))
                .collect(),
            Self::Rpc(server) => {
                let mut services = server.services();
                services.sort_by(|a, b| a.name.cmp(&b.name));
                services
                    .iter()
                    .flat_map(|svc| {
                        svc.methods.iter().map(|method| {
                            RouteDescriptor::rpc(
                                service_name,
                                format!("/{}", method_to_path(method)),
                                svc.name.as_str(),
                                method.as_str(),
                            )
                        })
                    })
                    .collect()
            },
        }
    }
}

// ── Static adapters ──────────────────────────────────────────────────────────

/// A fixed route list, for routers that can export their table up front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticHttpRoutes {
    routes: Vec<HttpRoute>,
}

impl StaticHttpRoutes {
    pub fn new(routes: Vec<HttpRoute>) -> Self {
        Self { routes }
    }

    #[must_use]
    pub fn route(mut self, method: &str, path: &str) -> Self {
        self.routes.push(HttpRoute::new(method, path));
        self
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl HttpRouteSource for StaticHttpRoutes {
    fn routes(&self) -> Vec<HttpRoute> {
        self.routes.clone()
    }
}

/// Service table for RPC servers that cannot be introspected directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcServiceTable {
    services: BTreeMap<String, Vec<String>>,
    reflection: bool,
}

impl RpcServiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn service<I, S>(mut self, name: &str, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_service(name, methods);
        self
    }

    pub fn add_service<I, S>(&mut self, name: &str, methods: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services
            .entry(name.to_string())
            .or_default()
            .extend(methods.into_iter().map(Into::into));
    }

    pub fn reflection_enabled(&self) -> bool {
        self.reflection
    }
}

impl RpcServer for RpcServiceTable {
    fn services(&self) -> Vec<RpcService> {
        self.services
            .iter()
            .map(|(name, methods)| RpcService {
                name: name.clone(),
                methods: methods.clone(),
            })
            .collect()
    }

    fn enable_reflection(&mut self) {
        self.reflection = true;
    }
}
