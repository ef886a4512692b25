//! Route manifests: a file listing what a host exposes, for hosts whose
//! framework has no enumeration hook (and for the CLI dry run).
//!
//! ```toml
//! kind = "rpc"
//!
//! [[services]]
//! name = "greeter.Greeter"
//! methods = ["SayHello", "SayGoodbye"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{HttpRoute, RpcService, RpcServiceTable, StaticHttpRoutes, Transport};

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS", "ANY"];

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported manifest format: .{0}")]
    UnsupportedFormat(String),

    #[error("invalid route manifest: {0}")]
    Invalid(String),
}

/// The routes a host exposes, as written in a manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RouteManifest {
    Http {
        #[serde(default)]
        routes: Vec<HttpRoute>,
    },
    Rpc {
        #[serde(default)]
        services: Vec<RpcService>,
    },
}

impl RouteManifest {
    /// Load a `.toml`, `.yaml`/`.yml` or `.json` manifest and validate it.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let parse_err = |message: String| ManifestError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let manifest: Self = match ext {
            "toml" => toml::from_str(&raw).map_err(|e| parse_err(e.to_string()))?,
            "yaml" | "yml" => serde_yaml::from_str(&raw).map_err(|e| parse_err(e.to_string()))?,
            "json" => serde_json::from_str(&raw).map_err(|e| parse_err(e.to_string()))?,
            other => return Err(ManifestError::UnsupportedFormat(other.to_string())),
        };
        manifest.validated()
    }

    /// Uppercase HTTP methods and reject routes the gateway cannot mount.
    pub fn validated(mut self) -> Result<Self, ManifestError> {
        match &mut self {
            Self::Http { routes } => {
                for route in routes.iter_mut() {
                    route.method = route.method.trim().to_ascii_uppercase();
                    if !route.path.starts_with('/') {
                        return Err(ManifestError::Invalid(format!(
                            "path '{}' must start with '/'",
                            route.path
                        )));
                    }
                    if !HTTP_METHODS.contains(&route.method.as_str()) {
                        return Err(ManifestError::Invalid(format!(
                            "unknown HTTP method '{}' for {}",
                            route.method, route.path
                        )));
                    }
                }
            },
            Self::Rpc { services } => {
                for svc in services.iter() {
                    if svc.name.trim().is_empty() {
                        return Err(ManifestError::Invalid("rpc service without a name".into()));
                    }
                    if let Some(bad) = svc.methods.iter().find(|m| !is_identifier(m)) {
                        return Err(ManifestError::Invalid(format!(
                            "method '{bad}' of {} is not an identifier",
                            svc.name
                        )));
                    }
                }
            },
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Http { routes } => routes.len(),
            Self::Rpc { services } => services.iter().map(|s| s.methods.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_catalog(self) -> ManifestCatalog {
        match self {
            Self::Http { routes } => ManifestCatalog::Http(StaticHttpRoutes::new(routes)),
            Self::Rpc { services } => {
                let mut table = RpcServiceTable::new();
                for svc in services {
                    table.add_service(&svc.name, svc.methods);
                }
                ManifestCatalog::Rpc(table)
            },
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Owned route source built from a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestCatalog {
    Http(StaticHttpRoutes),
    Rpc(RpcServiceTable),
}

impl ManifestCatalog {
    pub fn transport(&mut self) -> Transport<'_> {
        match self {
            Self::Http(routes) => Transport::Http(routes),
            Self::Rpc(table) => Transport::Rpc(table),
        }
    }
}
