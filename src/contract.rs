//! # contract: the seam between the deploy pipeline and a remote host
//!
//! The deploy step only needs four things from the machine it publishes to:
//! which directories exist, which files exist (and what they hash to), a way
//! to create directories, and a way to copy one file. [`RemoteHost`] names
//! exactly those. [`crate::ssh::SshRemote`] implements it with the OpenSSH
//! client binaries; tests use the generated `MockRemoteHost`.
//!
//! Paths crossing this trait are remote paths as strings with `/` separators.
//! Listings are relative to the root passed in; `make_dirs` and `upload`
//! take absolute remote paths.

use async_trait::async_trait;
use mockall::automock;
use std::path::PathBuf;

pub type RemoteError = Box<dyn std::error::Error + Send + Sync>;

/// A file that already exists on the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Path relative to the listed root, `/`-separated, no leading `./`.
    pub path: String,
    /// Hex SHA-256 of the file's content.
    pub sha256: String,
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Every directory under `root`, relative to it, with the root itself as
    /// `.`. A missing root is an empty listing, not an error.
    async fn list_dirs(&self, root: &str) -> Result<Vec<String>, RemoteError>;

    /// Every regular file under `root` with its content hash.
    async fn list_files(&self, root: &str) -> Result<Vec<RemoteFile>, RemoteError>;

    /// Create each directory (and its parents) if missing.
    async fn make_dirs(&self, dirs: Vec<String>) -> Result<(), RemoteError>;

    /// Copy one local file to an absolute remote path, preserving mode and mtime.
    async fn upload(&self, local: PathBuf, remote: String) -> Result<(), RemoteError>;
}
