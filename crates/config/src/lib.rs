//! Configuration for gatelink: where the gateway lives, who this service is,
//! and where the registration credential comes from.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        clear_config_dir, config_dir, discover_and_load, find_config_file, load_config,
        set_config_dir,
    },
    schema::{
        CredentialSourceKind, CredentialsConfig, GatelinkConfig, GatewayConfig, SentinelConfig,
        ServiceConfig,
    },
};
