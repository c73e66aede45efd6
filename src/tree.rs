//! Recursive file listing with regex filters.
//!
//! [`FileTree`] walks a directory depth-first and returns every file whose
//! path survives the configured exclusion patterns. Patterns are matched
//! unanchored against the full, root-prefixed path string, so `"\.git/"`
//! drops everything under any `.git` directory and `"\.md$"` drops Markdown
//! sources wherever they live.
//!
//! Used by the build step (collecting Markdown sources and generated pages)
//! and by the deploy step (collecting the output tree to push).

use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

#[derive(Debug)]
pub enum TreeError {
    /// An exclusion or inclusion pattern failed to compile.
    Pattern(regex::Error),
    /// The root handed to [`FileTree::list`] does not exist.
    NotFound(PathBuf),
    Io(std::io::Error),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Pattern(e) => write!(f, "invalid path pattern: {e}"),
            TreeError::NotFound(p) => write!(f, "path \"{}\" doesn't exist", p.display()),
            TreeError::Io(e) => write!(f, "I/O error while listing files: {e}"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreeError::Pattern(e) => Some(e),
            TreeError::Io(e) => Some(e),
            TreeError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for TreeError {
    fn from(e: std::io::Error) -> Self {
        TreeError::Io(e)
    }
}

impl From<regex::Error> for TreeError {
    fn from(e: regex::Error) -> Self {
        TreeError::Pattern(e)
    }
}

/// A reusable, filtered recursive listing.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    exclude: Vec<Regex>,
    only: Vec<Regex>,
}

impl FileTree {
    /// Compile the exclusion patterns. An empty slice lists everything.
    pub fn new<S: AsRef<str>>(exclude: &[S]) -> Result<Self, TreeError> {
        Ok(Self {
            exclude: compile(exclude)?,
            only: Vec::new(),
        })
    }

    /// Restrict the listing to paths matching at least one of `patterns`.
    pub fn only<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, TreeError> {
        self.only = compile(patterns)?;
        Ok(self)
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.exclude.iter().any(|re| re.is_match(&path))
    }

    fn is_selected(&self, path: &Path) -> bool {
        if self.is_excluded(path) {
            return false;
        }
        if self.only.is_empty() {
            return true;
        }
        let path = path.to_string_lossy();
        self.only.iter().any(|re| re.is_match(&path))
    }

    /// List every selected file under `root`, sorted by path.
    ///
    /// A `root` that is itself a file yields just that file (if selected).
    pub fn list(&self, root: &Path) -> Result<Vec<PathBuf>, TreeError> {
        if !root.exists() {
            warn!(path = %root.display(), "Listing root doesn't exist");
            return Err(TreeError::NotFound(root.to_path_buf()));
        }

        let mut files = Vec::new();
        if root.is_dir() {
            self.visit_dir(root, &mut files)?;
        } else if self.is_selected(root) {
            debug!(path = %root.display(), "Listing root is a file, returning it as-is");
            files.push(root.to_path_buf());
        }
        files.sort();
        debug!(root = %root.display(), count = files.len(), "Listed file tree");
        Ok(files)
    }

    /// Same as [`FileTree::list`] with `root` stripped from every entry.
    pub fn list_relative(&self, root: &Path) -> Result<Vec<PathBuf>, TreeError> {
        let files = self.list(root)?;
        if !root.is_dir() {
            return Ok(files
                .into_iter()
                .filter_map(|p| p.file_name().map(PathBuf::from))
                .collect());
        }
        Ok(files
            .into_iter()
            .filter_map(|p| p.strip_prefix(root).ok().map(Path::to_path_buf))
            .collect())
    }

    fn visit_dir(&self, dir: &Path, results: &mut Vec<PathBuf>) -> Result<(), TreeError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            error!(error = ?e, path = %dir.display(), "Failed to read directory");
            TreeError::Io(e)
        })?;
        for entry_res in entries {
            let entry = entry_res?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.visit_dir(&path, results)?;
                continue;
            }
            // symlinks are never descended, and only listed when they resolve to a file
            if file_type.is_symlink() && !path.is_file() {
                debug!(path = %path.display(), "Skipping symlink that isn't a file");
                continue;
            }
            if self.is_selected(&path) {
                results.push(path);
            } else {
                debug!(path = %path.display(), "Excluded by pattern");
            }
        }
        Ok(())
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, TreeError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p.as_ref()).map_err(|e| {
                error!(pattern = p.as_ref(), error = %e, "Invalid path pattern");
                TreeError::Pattern(e)
            })
        })
        .collect()
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
