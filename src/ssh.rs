//! [`RemoteHost`] over the system `ssh` and `scp` binaries.
//!
//! Every call is a non-interactive (`BatchMode=yes`) child process, so keys
//! must already be loaded in an agent or given as `identity_file`. Children
//! are killed when their future is dropped, so a failed deploy does not leave
//! uploads running behind it. Remote
//! paths are single-quoted inside ssh commands; scp destinations are passed
//! as-is, since SFTP-mode scp does not run them through a shell.

use crate::config::RemoteConfig;
use crate::contract::{RemoteError, RemoteFile, RemoteHost};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, error, info};

pub struct SshRemote {
    target: String,
    port: Option<u16>,
    identity_file: Option<PathBuf>,
}

impl SshRemote {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            target: config.target(),
            port: config.port,
            identity_file: config.identity_file.clone(),
        }
    }

    fn ssh(&self, remote_command: &str) -> Command {
        let mut cmd = client("ssh");
        if let Some(port) = self.port {
            cmd.arg("-p").arg(port.to_string());
        }
        if let Some(identity) = &self.identity_file {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg("-o")
            .arg("BatchMode=yes")
            .arg(&self.target)
            .arg(remote_command);
        cmd
    }

    fn scp(&self, local: &Path, remote: &str) -> Command {
        let mut cmd = client("scp");
        // scp spells the port flag in uppercase
        if let Some(port) = self.port {
            cmd.arg("-P").arg(port.to_string());
        }
        if let Some(identity) = &self.identity_file {
            cmd.arg("-i").arg(identity);
        }
        cmd.arg("-o")
            .arg("BatchMode=yes")
            .arg("-p")
            .arg(local)
            .arg(format!("{}:{}", self.target, remote));
        cmd
    }

    async fn run(&self, mut cmd: Command, what: &str) -> Result<String, RemoteError> {
        debug!(host = %self.target, what, "Running remote command");
        let output = cmd.output().await.map_err(|e| {
            error!(error = ?e, what, "Failed to launch ssh client");
            Box::new(e) as RemoteError
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                host = %self.target,
                what,
                status = ?output.status,
                stderr = %stderr.trim(),
                "Remote command exited with non-zero code"
            );
            return Err(format!("{what} failed ({}): {}", output.status, stderr.trim()).into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl RemoteHost for SshRemote {
    async fn list_dirs(&self, root: &str) -> Result<Vec<String>, RemoteError> {
        let command = in_existing_dir(root, "find . -type d");
        let stdout = self.run(self.ssh(&command), "list remote directories").await?;
        let dirs = parse_find_output(&stdout);
        info!(root, count = dirs.len(), "Listed remote directories");
        Ok(dirs)
    }

    async fn list_files(&self, root: &str) -> Result<Vec<RemoteFile>, RemoteError> {
        let command = in_existing_dir(root, "find . -type f -exec sha256sum {} +");
        let stdout = self.run(self.ssh(&command), "list remote files").await?;
        let files = parse_sha256sum_output(&stdout);
        info!(root, count = files.len(), "Listed remote files");
        Ok(files)
    }

    async fn make_dirs(&self, dirs: Vec<String>) -> Result<(), RemoteError> {
        if dirs.is_empty() {
            return Ok(());
        }
        let quoted: Vec<String> = dirs.iter().map(|d| shell_quote(d)).collect();
        let command = format!("mkdir -p {}", quoted.join(" "));
        self.run(self.ssh(&command), "create remote directories").await?;
        info!(count = dirs.len(), "Created remote directories");
        Ok(())
    }

    async fn upload(&self, local: PathBuf, remote: String) -> Result<(), RemoteError> {
        self.run(self.scp(&local, &remote), "scp upload").await?;
        info!(local = %local.display(), remote = %remote, "Uploaded file");
        Ok(())
    }
}

fn client(program: &str) -> Command {
    let mut cmd = Command::new(program);
    cmd.kill_on_drop(true);
    cmd
}

/// Run `command` inside `root`, printing nothing when `root` is missing.
fn in_existing_dir(root: &str, command: &str) -> String {
    let quoted = shell_quote(root);
    format!("if [ -d {quoted} ]; then cd {quoted} && {command}; fi")
}

/// Single-quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

fn strip_dot(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// `find . -type d` output → relative dirs. The root itself stays as `.`.
pub fn parse_find_output(stdout: &str) -> Vec<String> {
    let mut dirs: Vec<String> = stdout
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(|l| strip_dot(l).to_string())
        .collect();
    dirs.sort();
    dirs
}

/// `sha256sum` output (`<hex>  ./path`) → remote files.
///
/// GNU coreutils prefixes the line with `\` when the name holds a backslash
/// or newline, and escapes those as `\\` and `\n` in the path.
pub fn parse_sha256sum_output(stdout: &str) -> Vec<RemoteFile> {
    let mut files: Vec<RemoteFile> = stdout
        .lines()
        .filter_map(|line| {
            let (escaped, line) = match line.strip_prefix('\\') {
                Some(rest) => (true, rest),
                None => (false, line),
            };
            let (hash, path) = line.split_once(char::is_whitespace)?;
            // binary mode marks the path with a leading '*'
            let path = path.trim_start().trim_start_matches('*');
            if hash.len() != 64 || path.is_empty() {
                return None;
            }
            let path = if escaped {
                unescape_name(path)
            } else {
                path.to_string()
            };
            Some(RemoteFile {
                path: strip_dot(&path).to_string(),
                sha256: hash.to_ascii_lowercase(),
            })
        })
        .collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

fn unescape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
