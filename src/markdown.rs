//! Markdown to HTML with a fixed set of extensions.
//!
//! Every page on the site goes through the same [`MarkdownParser`], so the
//! options live here and nowhere else:
//! - autolinks, tables, strikethrough, footnotes, `__underline__`
//! - heading anchors for a table of contents
//! - smart quotes and hard line breaks
//! - raw HTML in the source is escaped, not passed through

use crate::output::{is_fresh, modified, write_atomic};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug)]
pub enum MarkdownError {
    Io(std::io::Error),
    NotADirectory(PathBuf),
}

impl fmt::Display for MarkdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkdownError::Io(e) => write!(f, "I/O error while converting Markdown: {e}"),
            MarkdownError::NotADirectory(p) => {
                write!(f, "\"{}\" is not a directory", p.display())
            }
        }
    }
}

impl std::error::Error for MarkdownError {}

impl From<std::io::Error> for MarkdownError {
    fn from(e: std::io::Error) -> Self {
        MarkdownError::Io(e)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownParser;

fn apply_site_options(options: &mut comrak::Options) {
    options.extension.autolink = true;
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.footnotes = true;
    options.extension.underline = true;
    options.extension.header_ids = Some(String::new());
    options.parse.smart = true;
    options.render.hardbreaks = true;
    options.render.escape = true;
}

impl MarkdownParser {
    pub fn new() -> Self {
        MarkdownParser
    }

    pub fn render(&self, source: &str) -> String {
        let mut options = comrak::Options::default();
        apply_site_options(&mut options);
        comrak::markdown_to_html(source, &options)
    }

    pub fn render_file(&self, path: &Path) -> Result<String, MarkdownError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            error!(error = ?e, path = %path.display(), "Failed to read Markdown source");
            MarkdownError::Io(e)
        })?;
        Ok(self.render(&source))
    }
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("md")
}

/// Convert every `*.md` directly inside `dir` into `<stem>.html` beside it.
///
/// Targets newer than their source are left alone unless `force` is set.
/// Returns the paths that were written.
pub fn convert_dir(dir: &Path, force: bool) -> Result<Vec<PathBuf>, MarkdownError> {
    if !dir.is_dir() {
        error!(path = %dir.display(), "Markdown conversion target is not a directory");
        return Err(MarkdownError::NotADirectory(dir.to_path_buf()));
    }

    let parser = MarkdownParser::new();
    let mut sources: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_markdown(p))
        .collect();
    sources.sort();

    let mut written = Vec::new();
    for source in sources {
        let target = source.with_extension("html");
        if !force && is_fresh(&target, &[modified(&source)]) {
            debug!(source = %source.display(), "HTML is up to date, skipping");
            continue;
        }
        let html = parser.render_file(&source)?;
        write_atomic(&target, html.as_bytes())?;
        info!(source = %source.display(), target = %target.display(), "Converted Markdown");
        written.push(target);
    }
    Ok(written)
}
