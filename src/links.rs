//! Page titles and the generated link lists on the index and projects pages.
//!
//! A page's title is the text of its first `<h1>`.

use crate::tree::{to_slash, FileTree};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

fn h1_pattern() -> &'static Regex {
    static H1: OnceLock<Regex> = OnceLock::new();
    H1.get_or_init(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").expect("static h1 pattern"))
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static tag pattern"))
}

/// Text content of the first `<h1>` in `html`, with inner tags removed and
/// surrounding whitespace trimmed. Entities and inner whitespace are kept as
/// written. `None` when there is no `<h1>` or the first one is blank.
pub fn extract_title(html: &str) -> Option<String> {
    let inner = h1_pattern().captures(html)?.get(1)?.as_str();
    let stripped = tag_pattern().replace_all(inner, "");
    let text = stripped.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

pub fn read_title(path: &Path) -> std::io::Result<Option<String>> {
    Ok(extract_title(&std::fs::read_to_string(path)?))
}

/// One entry of a generated link list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub href: String,
    pub title: String,
}

impl PageLink {
    pub fn to_html(&self) -> String {
        format!("<a href=\"{}\">{}</a>", self.href, self.title)
    }
}

fn html_only() -> FileTree {
    FileTree::default()
        .only(&["\\.html?$"])
        .expect("static html pattern")
}

/// Links to every HTML page under `dir`, with hrefs relative to `base`.
///
/// Pages without an `<h1>` fall back to their file stem. A missing `dir`
/// yields an empty list.
pub fn generate_links(dir: &Path, base: &Path) -> std::io::Result<Vec<PageLink>> {
    if !dir.exists() {
        debug!(path = %dir.display(), "No pages to link, directory missing");
        return Ok(Vec::new());
    }
    let pages = html_only().list(dir).map_err(std::io::Error::other)?;

    let mut links = Vec::with_capacity(pages.len());
    for page in pages {
        let title = match read_title(&page)? {
            Some(title) => title,
            None => {
                warn!(path = %page.display(), "Page has no <h1>, using file name as title");
                stem(&page)
            }
        };
        let rel = page.strip_prefix(base).unwrap_or(&page);
        links.push(PageLink {
            href: to_slash(rel),
            title,
        });
    }
    links.sort_by(|a, b| a.href.cmp(&b.href));
    debug!(dir = %dir.display(), count = links.len(), "Generated page links");
    Ok(links)
}

/// `(path, title)` for every HTML page under `dir`, for the `titles` command.
pub fn list_titles(dir: &Path) -> std::io::Result<Vec<(PathBuf, Option<String>)>> {
    let pages = html_only().list(dir).map_err(std::io::Error::other)?;
    pages
        .into_iter()
        .map(|page| {
            let title = read_title(&page)?;
            Ok((page, title))
        })
        .collect()
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_strips_attributes_and_inner_tags() {
        let html = "<h1 id=\"hello\"><a href=\"#hello\"></a>Hello <em>there</em></h1><h1>Second</h1>";
        assert_eq!(extract_title(html).as_deref(), Some("Hello there"));
    }

    #[test]
    fn missing_or_empty_h1_has_no_title() {
        assert_eq!(extract_title("<h2>Nope</h2>"), None);
        assert_eq!(extract_title("<h1>  </h1>"), None);
    }

    #[test]
    fn title_is_trimmed_but_inner_whitespace_kept() {
        let html = "<h1>\n  Hello\n  World  </h1>";
        assert_eq!(extract_title(html).as_deref(), Some("Hello\n  World"));
    }

    #[test]
    fn blank_first_h1_hides_later_headings() {
        assert_eq!(extract_title("<h1></h1><h1>Later</h1>"), None);
    }

    #[test]
    fn link_renders_quoted_href() {
        let link = PageLink {
            href: "posts/a.html".into(),
            title: "A".into(),
        };
        assert_eq!(link.to_html(), "<a href=\"posts/a.html\">A</a>");
    }
}
