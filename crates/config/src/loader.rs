use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::GatelinkConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "gatelink.toml",
    "gatelink.yaml",
    "gatelink.yml",
    "gatelink.json",
];

/// Override for the config directory, set via `set_config_dir()`.
static CONFIG_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Set a custom config directory. When set, discovery only looks in this
/// directory; the working directory and the user-global path are skipped.
pub fn set_config_dir(path: PathBuf) {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(path);
}

/// Clear the config directory override, restoring default discovery.
pub fn clear_config_dir() {
    *CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

fn config_dir_override() -> Option<PathBuf> {
    CONFIG_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Load config from the given path (any supported format).
///
/// `${ENV_VAR}` placeholders are substituted before parsing.
pub fn load_config(path: &Path) -> anyhow::Result<GatelinkConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./gatelink.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/gatelink/gatelink.{toml,yaml,yml,json}` (user-global)
///
/// Returns `GatelinkConfig::default()` if no file is found or the file
/// does not parse.
pub fn discover_and_load() -> GatelinkConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return GatelinkConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            GatelinkConfig::default()
        },
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(dir) = config_dir_override() {
        // Override is set; don't fall through to other locations.
        return first_existing(&dir);
    }

    if let Some(p) = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    {
        return Some(p);
    }

    user_config_dir().and_then(|dir| first_existing(&dir))
}

fn first_existing(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the config directory: override, or `~/.config/gatelink/`.
pub fn config_dir() -> Option<PathBuf> {
    config_dir_override().or_else(user_config_dir)
}

fn user_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().join(".config").join("gatelink"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<GatelinkConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::schema::CredentialSourceKind,
        gatelink_protocol::ErrorCode,
    };

    /// Discovery reads a process-wide override; serialize the tests that set it.
    static DIR_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatelink.toml");
        std::fs::write(
            &path,
            r#"
            [gateway]
            url = "http://gw.internal:8080"
            heartbeat_interval_secs = 3

            [service]
            name = "order"
            address = "10.1.2.3:9000"
            protocol = "grpc"

            [credentials]
            source = "static"
            value = "pw"
            "#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.gateway.url, "http://gw.internal:8080");
        assert_eq!(cfg.gateway.heartbeat_interval_secs, 3);
        assert_eq!(cfg.gateway.request_timeout_secs, 5);
        assert_eq!(cfg.service.protocol, "grpc");
        assert_eq!(cfg.credentials.source, CredentialSourceKind::Static);
        assert_eq!(cfg.credentials.value.as_deref(), Some("pw"));
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("gatelink.yaml");
        std::fs::write(&yaml, "service:\n  name: cart\n  address: \"a:1\"\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().service.name, "cart");

        let json = dir.path().join("gatelink.json");
        std::fs::write(
            &json,
            r#"{"gateway": {"sentinels": {"already_exists": "Error.Exists"}}}"#,
        )
        .unwrap();
        assert_eq!(
            load_config(&json).unwrap().gateway.sentinels.already_exists,
            ErrorCode::from("Error.Exists")
        );
    }

    #[test]
    #[allow(unsafe_code)]
    fn substitutes_env_before_parsing() {
        unsafe { std::env::set_var("GATELINK_LOADER_TEST_PW", "from-env") };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatelink.toml");
        std::fs::write(
            &path,
            "[credentials]\nredis_password = \"${GATELINK_LOADER_TEST_PW}\"\n",
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.credentials.redis_password.as_deref(), Some("from-env"));
        unsafe { std::env::remove_var("GATELINK_LOADER_TEST_PW") };
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatelink.ini");
        std::fs::write(&path, "name=x").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn discovery_respects_override() {
        let _guard = DIR_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let dir = tempfile::tempdir().unwrap();
        set_config_dir(dir.path().to_path_buf());

        // Nothing there yet: defaults.
        assert!(find_config_file().is_none());
        assert!(discover_and_load().service.name.is_empty());

        std::fs::write(
            dir.path().join("gatelink.yml"),
            "service:\n  name: billing\n",
        )
        .unwrap();
        assert_eq!(
            find_config_file().unwrap(),
            dir.path().join("gatelink.yml")
        );
        assert_eq!(discover_and_load().service.name, "billing");
        assert_eq!(config_dir().unwrap(), dir.path());

        clear_config_dir();
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let _guard = DIR_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let dir = tempfile::tempdir().unwrap();
        set_config_dir(dir.path().to_path_buf());
        std::fs::write(dir.path().join("gatelink.toml"), "[[[not toml").unwrap();

        let cfg = discover_and_load();
        assert_eq!(cfg.gateway.url, GatelinkConfig::default().gateway.url);

        clear_config_dir();
    }
}
