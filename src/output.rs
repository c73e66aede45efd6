//! Helpers for writing generated files.

use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, error};

/// Write `contents` to `path` through a temp file in the same directory, so
/// a reader never observes a half-written page. Parent directories are
/// created as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(path).map_err(|e| {
        error!(error = ?e.error, path = %path.display(), "Failed to persist generated file");
        e.error
    })?;
    debug!(path = %path.display(), size = contents.len(), "Wrote file");
    Ok(())
}

pub fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// True when `target` exists and is at least as new as every one of `inputs`.
pub fn is_fresh(target: &Path, inputs: &[Option<SystemTime>]) -> bool {
    let Some(target_time) = modified(target) else {
        return false;
    };
    inputs
        .iter()
        .all(|input| matches!(input, Some(t) if *t <= target_time))
}

/// Hex-encoded SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    Ok(sha256_hex(&std::fs::read(path)?))
}
