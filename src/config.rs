use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = ".scpconfig.json";
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// One environment's worth of site settings, with paths already resolved
/// against `local_root` by the loader.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_local_root")]
    pub local_root: PathBuf,
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Regexes for paths that are never deployed.
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    pub host: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    pub root: String,
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_local_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_concurrency() -> usize {
    4
}

/// Sections of `content_dir` that become pages, each with its own output
/// directory of the same name.
pub const SECTIONS: [&str; 2] = ["posts", "projects"];

impl SiteConfig {
    /// A config rooted at `local_root` with every other setting defaulted.
    pub fn with_root(local_root: impl Into<PathBuf>) -> Self {
        let mut config = SiteConfig {
            local_root: local_root.into(),
            content_dir: default_content_dir(),
            templates_dir: default_templates_dir(),
            static_dir: None,
            output_dir: default_output_dir(),
            exclude: Vec::new(),
            remote: None,
        };
        config.resolve_paths(Path::new("."));
        config
    }

    /// Make `local_root` absolute-ish relative to `base`, then every other
    /// relative path relative to `local_root`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.local_root.is_relative() {
            self.local_root = base.join(&self.local_root);
        }
        let root = self.local_root.clone();
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };
        resolve(&mut self.content_dir);
        resolve(&mut self.templates_dir);
        resolve(&mut self.output_dir);
        if let Some(dir) = self.static_dir.as_mut() {
            resolve(dir);
        }
    }

    pub fn section_source(&self, section: &str) -> PathBuf {
        self.content_dir.join(section)
    }

    pub fn section_output(&self, section: &str) -> PathBuf {
        self.output_dir.join(section)
    }

    pub fn trace_loaded(&self) {
        info!(
            local_root = %self.local_root.display(),
            output_dir = %self.output_dir.display(),
            exclude_count = self.exclude.len(),
            has_remote = self.remote.is_some(),
            "Loaded site config"
        );
        debug!(config = ?self, "Site config loaded (full debug)");
    }
}

impl RemoteConfig {
    /// `user@host`, or just `host` when no user is configured.
    pub fn target(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }
}
