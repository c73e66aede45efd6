//! Page rendering: Tera templates plus the shared head and navbar partials.
//!
//! The templates directory holds one template per page kind and two raw
//! HTML partials that every page embeds:
//!
//! ```text
//! templates/
//!   index.html        posts link list
//!   projects.html     projects link list
//!   contact.html
//!   post.html         wraps a rendered Markdown body
//!   head.html.part
//!   navbar.html.part
//! ```
//!
//! Each template sees `head_partial`, `navbar_partial`, `links` (list of
//! `{href, title}`), `gl` (the same links pre-rendered as `<a>` tags),
//! `post_body` and `title`. HTML values need the `safe` filter, since
//! `.html` templates are autoescaped.

use crate::links::{extract_title, PageLink};
use crate::output::modified;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tera::{Context, Tera};
use tracing::{debug, error, info};

pub const HEAD_PARTIAL: &str = "head.html.part";
pub const NAVBAR_PARTIAL: &str = "navbar.html.part";

/// The kinds of page the site is made of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Index,
    Projects,
    Contact,
    /// A single post or project page, wrapping already-rendered HTML.
    Post { body: String },
}

impl Page {
    pub fn template_name(&self) -> &'static str {
        match self {
            Page::Index => "index.html",
            Page::Projects => "projects.html",
            Page::Contact => "contact.html",
            Page::Post { .. } => "post.html",
        }
    }

    const TEMPLATES: [&'static str; 4] =
        ["index.html", "projects.html", "contact.html", "post.html"];
}

#[derive(Debug)]
pub enum RenderError {
    Io { path: PathBuf, source: std::io::Error },
    Template(tera::Error),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Io { path, source } => {
                write!(f, "failed to read template {}: {source}", path.display())
            }
            // tera's top-level message is terse, the cause carries the detail
            RenderError::Template(e) => match std::error::Error::source(e) {
                Some(cause) => write!(f, "template error: {e}: {cause}"),
                None => write!(f, "template error: {e}"),
            },
        }
    }
}

impl std::error::Error for RenderError {}

impl From<tera::Error> for RenderError {
    fn from(e: tera::Error) -> Self {
        RenderError::Template(e)
    }
}

pub struct SiteRenderer {
    tera: Tera,
    head_partial: String,
    navbar_partial: String,
    newest_mtime: Option<SystemTime>,
}

impl SiteRenderer {
    /// Load every page template and both partials from `templates_dir`.
    pub fn load(templates_dir: &Path) -> Result<Self, RenderError> {
        info!(path = %templates_dir.display(), "Loading templates");
        let mut tera = Tera::default();
        let mut newest_mtime = None;

        for name in Page::TEMPLATES {
            let path = templates_dir.join(name);
            let source = read(&path)?;
            tera.add_raw_template(name, &source).map_err(|e| {
                error!(template = name, error = ?e, "Failed to parse template");
                RenderError::Template(e)
            })?;
            newest_mtime = newest_mtime.max(modified(&path));
        }

        let head_path = templates_dir.join(HEAD_PARTIAL);
        let navbar_path = templates_dir.join(NAVBAR_PARTIAL);
        let head_partial = read(&head_path)?;
        let navbar_partial = read(&navbar_path)?;
        newest_mtime = newest_mtime
            .max(modified(&head_path))
            .max(modified(&navbar_path));

        debug!(templates = Page::TEMPLATES.len(), "Templates loaded");
        Ok(Self {
            tera,
            head_partial,
            navbar_partial,
            newest_mtime,
        })
    }

    /// Modification time of the most recently changed template or partial.
    pub fn newest_mtime(&self) -> Option<SystemTime> {
        self.newest_mtime
    }

    pub fn render(&self, page: &Page, links: &[PageLink]) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("head_partial", &self.head_partial);
        context.insert("navbar_partial", &self.navbar_partial);
        context.insert("links", links);
        let gl: Vec<String> = links.iter().map(PageLink::to_html).collect();
        context.insert("gl", &gl);

        match page {
            Page::Post { body } => {
                context.insert("post_body", body);
                context.insert("title", &extract_title(body).unwrap_or_default());
            }
            _ => {
                context.insert("post_body", "");
                context.insert("title", "");
            }
        }

        let name = page.template_name();
        self.tera.render(name, &context).map_err(|e| {
            error!(template = name, error = ?e, "Failed to render page");
            RenderError::Template(e)
        })
    }
}

fn read(path: &Path) -> Result<String, RenderError> {
    std::fs::read_to_string(path).map_err(|source| {
        error!(error = ?source, path = %path.display(), "Failed to read template");
        RenderError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}
