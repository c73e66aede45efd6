//! Static-site build: Markdown sections → post pages → index pages.
//!
//! [`build_site`] runs the whole local half of a deploy:
//!   1. every `*.md` under `content/posts` and `content/projects` is rendered
//!      and wrapped in the post template, landing at the same relative path
//!      (with `.html`) under the output directory
//!   2. the static directory, if configured, is mirrored into the output
//!   3. the index, projects and contact pages are rendered with link lists
//!      built from the generated post and project pages
//!
//! Post pages are incremental: a page newer than its source and every
//! template is skipped unless `force` is set. Top-level pages are always
//! rendered since their link lists depend on every page in a section.

use crate::config::{SiteConfig, SECTIONS};
use crate::links::generate_links;
use crate::markdown::{MarkdownError, MarkdownParser};
use crate::output::{is_fresh, modified, sha256_file, write_atomic};
use crate::render::{Page, RenderError, SiteRenderer};
use crate::tree::{FileTree, TreeError};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[derive(Debug)]
pub enum BuildError {
    Io(std::io::Error),
    Tree(TreeError),
    Markdown(MarkdownError),
    Render(RenderError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Io(e) => write!(f, "build I/O error: {e}"),
            BuildError::Tree(e) => write!(f, "build listing error: {e}"),
            BuildError::Markdown(e) => write!(f, "build Markdown error: {e}"),
            BuildError::Render(e) => write!(f, "build render error: {e}"),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<std::io::Error> for BuildError {
    fn from(e: std::io::Error) -> Self {
        BuildError::Io(e)
    }
}

impl From<TreeError> for BuildError {
    fn from(e: TreeError) -> Self {
        BuildError::Tree(e)
    }
}

impl From<MarkdownError> for BuildError {
    fn from(e: MarkdownError) -> Self {
        BuildError::Markdown(e)
    }
}

impl From<RenderError> for BuildError {
    fn from(e: RenderError) -> Self {
        BuildError::Render(e)
    }
}

/// What a build touched, by output path.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub rendered: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
}

pub fn build_site(config: &SiteConfig, force: bool) -> Result<BuildReport, BuildError> {
    info!(
        content_dir = %config.content_dir.display(),
        output_dir = %config.output_dir.display(),
        force,
        "[BUILD] Starting site build"
    );
    let renderer = SiteRenderer::load(&config.templates_dir)?;
    let parser = MarkdownParser::new();
    let mut report = BuildReport::default();

    for section in SECTIONS {
        build_section(config, section, &renderer, &parser, force, &mut report)?;
    }

    if let Some(static_dir) = &config.static_dir {
        copy_static(static_dir, &config.output_dir, &mut report)?;
    }

    let pages = [
        (Page::Index, Some("posts"), "index.html"),
        (Page::Projects, Some("projects"), "projects.html"),
        (Page::Contact, None, "contact.html"),
    ];
    for (page, section, file_name) in pages {
        let links = match section {
            Some(section) => generate_links(&config.section_output(section), &config.output_dir)?,
            None => Vec::new(),
        };
        let html = renderer.render(&page, &links)?;
        let target = config.output_dir.join(file_name);
        write_atomic(&target, html.as_bytes())?;
        info!(page = file_name, links = links.len(), "[BUILD] Rendered page");
        report.rendered.push(target);
    }

    info!(
        rendered = report.rendered.len(),
        skipped = report.skipped.len(),
        copied = report.copied.len(),
        "[BUILD] Site build complete"
    );
    Ok(report)
}

fn build_section(
    config: &SiteConfig,
    section: &str,
    renderer: &SiteRenderer,
    parser: &MarkdownParser,
    force: bool,
    report: &mut BuildReport,
) -> Result<(), BuildError> {
    let source_dir = config.section_source(section);
    if !source_dir.is_dir() {
        debug!(section, path = %source_dir.display(), "[BUILD] Section has no sources");
        return Ok(());
    }

    let sources = FileTree::default().only(&["\\.md$"])?.list(&source_dir)?;
    info!(section, count = sources.len(), "[BUILD] Rendering section");

    let template_time = renderer.newest_mtime();
    let output_dir = config.section_output(section);
    for source in sources {
        let rel = source.strip_prefix(&source_dir).unwrap_or(&source);
        let target = output_dir.join(rel).with_extension("html");

        if !force && is_fresh(&target, &[modified(&source), template_time]) {
            debug!(source = %source.display(), "[BUILD] Page is up to date, skipping");
            report.skipped.push(target);
            continue;
        }

        let body = parser.render_file(&source)?;
        let html = renderer.render(&Page::Post { body }, &[])?;
        write_atomic(&target, html.as_bytes()).map_err(|e| {
            error!(error = ?e, target = %target.display(), "[BUILD] Failed to write page");
            BuildError::Io(e)
        })?;
        debug!(source = %source.display(), target = %target.display(), "[BUILD] Rendered page");
        report.rendered.push(target);
    }
    Ok(())
}

/// Mirror `static_dir` into `output_dir`, skipping files whose content is
/// already identical.
fn copy_static(
    static_dir: &Path,
    output_dir: &Path,
    report: &mut BuildReport,
) -> Result<(), BuildError> {
    if !static_dir.is_dir() {
        debug!(path = %static_dir.display(), "[BUILD] No static directory");
        return Ok(());
    }
    for rel in FileTree::default().list_relative(static_dir)? {
        let source = static_dir.join(&rel);
        let target = output_dir.join(&rel);
        if target.exists() && sha256_file(&target)? == sha256_file(&source)? {
            continue;
        }
        let bytes = std::fs::read(&source)?;
        write_atomic(&target, &bytes)?;
        debug!(source = %source.display(), "[BUILD] Copied static file");
        report.copied.push(target);
    }
    info!(copied = report.copied.len(), "[BUILD] Static files mirrored");
    Ok(())
}
