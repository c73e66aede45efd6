use sitepush::build::build_site;
use sitepush::config::SiteConfig;
use std::fs::{create_dir_all, read_to_string, write, File};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

/// Push `path`'s mtime past anything written so far.
fn touch_later(path: &Path) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();
}

/// Lay out a minimal site (templates, two posts, one project, one static
/// file) under `root` and return its config.
fn write_site(root: &Path) -> SiteConfig {
    let templates = root.join("templates");
    create_dir_all(&templates).unwrap();
    write(templates.join("head.html.part"), "<link rel=\"stylesheet\" href=\"/css/site.css\">").unwrap();
    write(templates.join("navbar.html.part"), "<nav><a href=\"/\">Home</a></nav>").unwrap();
    write(
        templates.join("index.html"),
        "<html><head>{{ head_partial | safe }}</head><body>{{ navbar_partial | safe }}\
         {% for link in gl %}<p>{{ link | safe }}</p>{% endfor %}</body></html>",
    )
    .unwrap();
    write(
        templates.join("projects.html"),
        "<html><body>{% for link in gl %}<p>{{ link | safe }}</p>{% endfor %}</body></html>",
    )
    .unwrap();
    write(templates.join("contact.html"), "<html><body><form></form></body></html>").unwrap();
    write(
        templates.join("post.html"),
        "<html><head><title>{{ title }}</title></head><body>{{ post_body | safe }}</body></html>",
    )
    .unwrap();

    let posts = root.join("content/posts");
    let projects = root.join("content/projects");
    create_dir_all(posts.join("2024")).unwrap();
    create_dir_all(&projects).unwrap();
    write(posts.join("hello.md"), "# Hello World\n\nFirst post.\n").unwrap();
    write(posts.join("2024/trip.md"), "# Trip Report\n\nIt rained.\n").unwrap();
    write(posts.join("draft.txt"), "not a post").unwrap();
    write(projects.join("sitepush.md"), "# sitepush\n\nThis site.\n").unwrap();

    create_dir_all(root.join("static/css")).unwrap();
    write(root.join("static/css/site.css"), "body { margin: 0 }").unwrap();

    let mut config = SiteConfig::with_root(root);
    config.static_dir = Some(root.join("static"));
    config
}

#[test]
fn build_renders_posts_projects_and_top_level_pages() {
    let tmp = tempdir().unwrap();
    let config = write_site(tmp.path());

    let report = build_site(&config, false).expect("build should succeed");

    let out = &config.output_dir;
    assert!(out.join("posts/hello.html").exists());
    assert!(out.join("posts/2024/trip.html").exists());
    assert!(out.join("projects/sitepush.html").exists());
    assert!(!out.join("posts/draft.html").exists());
    assert!(out.join("contact.html").exists());
    assert_eq!(read_to_string(out.join("css/site.css")).unwrap(), "body { margin: 0 }");

    // 3 content pages + index, projects, contact
    assert_eq!(report.rendered.len(), 6, "rendered: {:?}", report.rendered);
    assert!(report.skipped.is_empty());
    assert_eq!(report.copied.len(), 1);

    let post = read_to_string(out.join("posts/hello.html")).unwrap();
    assert!(post.contains("<title>Hello World</title>"), "got: {post}");
    assert!(post.contains("First post."));
}

#[test]
fn index_links_every_post_by_title() {
    let tmp = tempdir().unwrap();
    let config = write_site(tmp.path());
    build_site(&config, false).unwrap();

    let index = read_to_string(config.output_dir.join("index.html")).unwrap();
    assert!(index.contains("<nav><a href=\"/\">Home</a></nav>"));
    assert!(index.contains("<a href=\"posts/2024/trip.html\">Trip Report</a>"), "got: {index}");
    assert!(index.contains("<a href=\"posts/hello.html\">Hello World</a>"), "got: {index}");
    // sorted by href
    let trip = index.find("Trip Report").unwrap();
    let hello = index.find("Hello World").unwrap();
    assert!(trip < hello);

    let projects = read_to_string(config.output_dir.join("projects.html")).unwrap();
    assert!(projects.contains("<a href=\"projects/sitepush.html\">sitepush</a>"));
    assert!(!projects.contains("Hello World"));
}

#[test]
fn second_build_skips_up_to_date_pages_unless_forced() {
    let tmp = tempdir().unwrap();
    let config = write_site(tmp.path());
    build_site(&config, false).unwrap();

    let second = build_site(&config, false).unwrap();
    assert_eq!(second.skipped.len(), 3, "skipped: {:?}", second.skipped);
    // top-level pages are always rendered
    assert_eq!(second.rendered.len(), 3);
    assert!(second.copied.is_empty(), "identical static files are not recopied");

    let forced = build_site(&config, true).unwrap();
    assert!(forced.skipped.is_empty());
    assert_eq!(forced.rendered.len(), 6);
}

#[test]
fn missing_content_sections_still_build_top_level_pages() {
    let tmp = tempdir().unwrap();
    let config = write_site(tmp.path());
    std::fs::remove_dir_all(tmp.path().join("content")).unwrap();

    let report = build_site(&config, false).unwrap();
    assert_eq!(report.rendered.len(), 3);
    let index = read_to_string(config.output_dir.join("index.html")).unwrap();
    assert!(!index.contains("<p><a href"), "no posts to link: {index}");
}

#[test]
fn missing_templates_fail_the_build() {
    let tmp = tempdir().unwrap();
    let config = write_site(tmp.path());
    std::fs::remove_dir_all(tmp.path().join("templates")).unwrap();

    let err = build_site(&config, false).unwrap_err();
    assert!(err.to_string().contains("template"), "got: {err}");
}

#[test]
fn touching_a_source_re_renders_only_that_page() {
    let tmp = tempdir().unwrap();
    let config = write_site(tmp.path());
    build_site(&config, false).unwrap();

    touch_later(&tmp.path().join("content/posts/hello.md"));
    let report = build_site(&config, false).unwrap();

    let hello = config.output_dir.join("posts/hello.html");
    assert!(report.rendered.contains(&hello), "rendered: {:?}", report.rendered);
    assert!(!report.skipped.contains(&hello));
    assert_eq!(report.skipped.len(), 2, "skipped: {:?}", report.skipped);
}

#[test]
fn touching_a_partial_re_renders_every_page() {
    let tmp = tempdir().unwrap();
    let config = write_site(tmp.path());
    build_site(&config, false).unwrap();

    touch_later(&tmp.path().join("templates/navbar.html.part"));
    let report = build_site(&config, false).unwrap();

    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);
    assert_eq!(report.rendered.len(), 6);
}

#[test]
fn deploy_exclusions_do_not_filter_the_build() {
    let tmp = tempdir().unwrap();
    let mut config = write_site(tmp.path());
    config.exclude = vec!["\\.md$".to_string(), "posts".to_string()];

    let report = build_site(&config, false).unwrap();
    assert_eq!(report.rendered.len(), 6, "rendered: {:?}", report.rendered);
    assert!(config.output_dir.join("posts/hello.html").exists());
    assert!(config.output_dir.join("posts/2024/trip.html").exists());
}
