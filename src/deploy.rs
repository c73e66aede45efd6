//! Push the generated site to a remote host.
//!
//! Deploying is split in two so a dry run can show exactly what would
//! happen:
//! - [`plan_deploy`] lists the local output tree (minus `exclude`
//!   patterns), asks the remote for its directories and file hashes, and
//!   works out which directories to create and which files to copy.
//! - [`execute_deploy`] creates all missing directories in one call, then
//!   uploads with bounded concurrency, stopping at the first failure.
//!
//! A file is copied when it is missing remotely or its SHA-256 differs.
//! `force` copies everything.

use crate::config::SiteConfig;
use crate::contract::{RemoteError, RemoteHost};
use crate::output::sha256_file;
use crate::tree::{to_slash, FileTree, TreeError};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Debug)]
pub enum DeployError {
    /// The selected environment has no `remote` section.
    NoRemote,
    Tree(TreeError),
    Io(std::io::Error),
    Remote { step: &'static str, source: RemoteError },
}

impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::NoRemote => write!(f, "no remote configured for this environment"),
            DeployError::Tree(e) => write!(f, "failed to list local files: {e}"),
            DeployError::Io(e) => write!(f, "failed to read local file: {e}"),
            DeployError::Remote { step, source } => write!(f, "remote {step} failed: {source}"),
        }
    }
}

impl std::error::Error for DeployError {}

impl From<TreeError> for DeployError {
    fn from(e: TreeError) -> Self {
        DeployError::Tree(e)
    }
}

impl From<std::io::Error> for DeployError {
    fn from(e: std::io::Error) -> Self {
        DeployError::Io(e)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeployOptions {
    pub force: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub local: PathBuf,
    /// Absolute remote destination.
    pub remote: String,
    /// Path relative to the site root, used in reports.
    pub relative: String,
}

#[derive(Debug, Clone, Default)]
pub struct DeployPlan {
    pub remote_root: String,
    /// Absolute remote directories to create, parents first.
    pub mkdirs: Vec<String>,
    pub uploads: Vec<Upload>,
    pub unchanged: Vec<String>,
}

#[derive(Debug, Default)]
pub struct DeployReport {
    pub created_dirs: Vec<String>,
    pub uploaded: Vec<String>,
    pub unchanged: Vec<String>,
    pub dry_run: bool,
}

/// How a remote directory listing names the listed root.
const ROOT_ENTRY: &str = ".";

/// Join a remote root and a relative `/` path without doubling slashes.
pub fn remote_join(root: &str, relative: &str) -> String {
    if relative.is_empty() {
        return root.to_string();
    }
    if root.ends_with('/') {
        format!("{root}{relative}")
    } else {
        format!("{root}/{relative}")
    }
}

fn normalise_root(root: &str) -> String {
    let trimmed = root.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Every ancestor directory of the given relative file paths.
pub fn required_dirs(files: &[PathBuf]) -> BTreeSet<String> {
    files
        .iter()
        .flat_map(|f| f.ancestors().skip(1))
        .filter(|d| !d.as_os_str().is_empty())
        .map(to_slash)
        .collect()
}

pub async fn plan_deploy<R>(
    config: &SiteConfig,
    remote: &R,
    force: bool,
) -> Result<DeployPlan, DeployError>
where
    R: RemoteHost + ?Sized,
{
    let remote_config = config.remote.as_ref().ok_or(DeployError::NoRemote)?;
    let root = normalise_root(&remote_config.root);
    info!(
        output_dir = %config.output_dir.display(),
        remote_root = %root,
        force,
        "[DEPLOY] Planning deploy"
    );

    let tree = FileTree::new(&config.exclude)?;
    let files = tree.list_relative(&config.output_dir)?;
    debug!(count = files.len(), "[DEPLOY] Local files selected");

    let existing_dirs: BTreeSet<String> = remote
        .list_dirs(&root)
        .await
        .map_err(|source| remote_failure("directory listing", source))?
        .into_iter()
        .collect();
    let remote_files: HashMap<String, String> = remote
        .list_files(&root)
        .await
        .map_err(|source| remote_failure("file listing", source))?
        .into_iter()
        .map(|f| (f.path, f.sha256))
        .collect();

    let mut mkdirs = Vec::new();
    if !existing_dirs.contains(ROOT_ENTRY) {
        debug!(remote_root = %root, "[DEPLOY] Remote root is missing");
        mkdirs.push(root.clone());
    }
    mkdirs.extend(
        required_dirs(&files)
            .into_iter()
            .filter(|d| !existing_dirs.contains(d))
            .map(|d| remote_join(&root, &d)),
    );

    let mut uploads = Vec::new();
    let mut unchanged = Vec::new();
    for rel in files {
        let relative = to_slash(&rel);
        let local = config.output_dir.join(&rel);
        let local_hash = sha256_file(&local)?;
        let same = remote_files.get(&relative) == Some(&local_hash);
        if same && !force {
            debug!(file = %relative, "[DEPLOY] Unchanged, skipping");
            unchanged.push(relative);
            continue;
        }
        uploads.push(Upload {
            local,
            remote: remote_join(&root, &relative),
            relative,
        });
    }

    info!(
        mkdirs = mkdirs.len(),
        uploads = uploads.len(),
        unchanged = unchanged.len(),
        "[DEPLOY] Plan ready"
    );
    Ok(DeployPlan {
        remote_root: root,
        mkdirs,
        uploads,
        unchanged,
    })
}

pub async fn execute_deploy<R>(
    plan: DeployPlan,
    remote: &R,
    concurrency: usize,
) -> Result<DeployReport, DeployError>
where
    R: RemoteHost + ?Sized,
{
    if !plan.mkdirs.is_empty() {
        info!(count = plan.mkdirs.len(), "[DEPLOY] Creating remote directories");
        remote
            .make_dirs(plan.mkdirs.clone())
            .await
            .map_err(|source| remote_failure("mkdir", source))?;
    }

    let mut uploaded: Vec<String> = stream::iter(plan.uploads)
        .map(|upload| async move {
            debug!(file = %upload.relative, remote = %upload.remote, "[DEPLOY] Uploading");
            remote
                .upload(upload.local, upload.remote)
                .await
                .map(|()| upload.relative)
        })
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await
        .map_err(|source| remote_failure("upload", source))?;
    uploaded.sort();

    info!(uploaded = uploaded.len(), "[DEPLOY] Upload complete");
    Ok(DeployReport {
        created_dirs: plan.mkdirs,
        uploaded,
        unchanged: plan.unchanged,
        dry_run: false,
    })
}

/// Plan, then execute unless `options.dry_run`.
pub async fn deploy<R>(
    config: &SiteConfig,
    remote: &R,
    options: DeployOptions,
) -> Result<DeployReport, DeployError>
where
    R: RemoteHost + ?Sized,
{
    let plan = plan_deploy(config, remote, options.force).await?;
    if options.dry_run {
        info!("[DEPLOY] Dry run, nothing sent");
        return Ok(DeployReport {
            created_dirs: plan.mkdirs,
            uploaded: plan.uploads.into_iter().map(|u| u.relative).collect(),
            unchanged: plan.unchanged,
            dry_run: true,
        });
    }
    let concurrency = config.remote.as_ref().map_or(1, |r| r.concurrency);
    execute_deploy(plan, remote, concurrency).await
}

fn remote_failure(step: &'static str, source: RemoteError) -> DeployError {
    error!(step, error = %source, "[DEPLOY][ERROR] Remote step failed");
    DeployError::Remote { step, source }
}
