//! Loads the site config file and picks one environment out of it.
//!
//! The file maps environment names to [`SiteConfig`] sections:
//!
//! ```json
//! {
//!   "development": { "local_root": ".", "remote": { "host": "a93", "root": "/var/www/html" } },
//!   "production":  { "local_root": ".", "exclude": ["\\.md$"] }
//! }
//! ```
//!
//! JSON is the default; `.yaml`/`.yml` files are parsed as YAML with the
//! same schema. Connection details can be overridden from the process
//! environment (`SITEPUSH_HOST`, `SITEPUSH_USER`, `SITEPUSH_PORT`,
//! `SITEPUSH_REMOTE_ROOT`), which the binary fills from `.env` if present.
//!
//! All errors are `anyhow::Error` and surface at the CLI boundary.

use crate::config::{RemoteConfig, SiteConfig};
use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

pub const ENV_HOST: &str = "SITEPUSH_HOST";
pub const ENV_USER: &str = "SITEPUSH_USER";
pub const ENV_PORT: &str = "SITEPUSH_PORT";
pub const ENV_REMOTE_ROOT: &str = "SITEPUSH_REMOTE_ROOT";

pub fn load_config<P: AsRef<Path>>(path: P, environment: &str) -> Result<SiteConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, environment, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let is_yaml = matches!(
        path_ref.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed: Result<BTreeMap<String, SiteConfig>> = if is_yaml {
        serde_yaml::from_str(&config_content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config YAML: {e}"))
    } else {
        serde_json::from_str(&config_content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config JSON: {e}"))
    };
    let mut environments = match parsed {
        Ok(envs) => {
            info!(config_path = ?path_ref, environments = envs.len(), "Parsed config successfully");
            envs
        }
        Err(e) => {
            error!(error = %e, config_path = ?path_ref, "Failed to parse config");
            return Err(e);
        }
    };

    let Some(mut config) = environments.remove(environment) else {
        let known: Vec<_> = environments.keys().cloned().collect();
        error!(environment, ?known, "Environment not present in config");
        anyhow::bail!(
            "Environment {:?} not found in {:?} (available: {})",
            environment,
            path_ref,
            known.join(", ")
        );
    };

    apply_env_overrides(&mut config)?;

    let base = path_ref
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    config.trace_loaded();
    Ok(config)
}

/// Overlay connection settings from the process environment.
fn apply_env_overrides(config: &mut SiteConfig) -> Result<()> {
    let host = std::env::var(ENV_HOST).ok();
    let user = std::env::var(ENV_USER).ok();
    let root = std::env::var(ENV_REMOTE_ROOT).ok();
    let port = match std::env::var(ENV_PORT) {
        Ok(var) => match var.parse::<u16>() {
            Ok(port) => Some(port),
            Err(e) => {
                error!(error = ?e, var = ?var, "{ENV_PORT} must be a valid port number");
                return Err(anyhow::anyhow!("{ENV_PORT} must be a valid port number: {e}"));
            }
        },
        Err(_) => None,
    };

    if config.remote.is_none() {
        match (&host, &root) {
            (Some(host), Some(root)) => {
                info!(host = %host, "Remote section taken from environment");
                config.remote = Some(RemoteConfig {
                    host: host.clone(),
                    user: None,
                    port: None,
                    root: root.clone(),
                    identity_file: None,
                    concurrency: 4,
                });
            }
            (None, None) => {
                if user.is_some() || port.is_some() {
                    warn!("Remote overrides set without {ENV_HOST} and {ENV_REMOTE_ROOT}, ignoring");
                }
                return Ok(());
            }
            _ => {
                warn!("Both {ENV_HOST} and {ENV_REMOTE_ROOT} are needed without a remote section, ignoring");
                return Ok(());
            }
        }
    }

    if let Some(remote) = config.remote.as_mut() {
        if let Some(host) = host {
            info!(host = %host, "{ENV_HOST} override applied");
            remote.host = host;
        }
        if let Some(user) = user {
            info!("{ENV_USER} override applied");
            remote.user = Some(user);
        }
        if let Some(root) = root {
            info!(root = %root, "{ENV_REMOTE_ROOT} override applied");
            remote.root = root;
        }
        if port.is_some() {
            remote.port = port;
        }
    }
    Ok(())
}
