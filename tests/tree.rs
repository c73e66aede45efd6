use sitepush::tree::{FileTree, TreeError};
use std::fs::{create_dir_all, write};
use std::path::PathBuf;
use tempfile::tempdir;

fn sample_tree() -> tempfile::TempDir {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    create_dir_all(root.join("posts/2024")).unwrap();
    create_dir_all(root.join(".git/objects")).unwrap();
    write(root.join("index.html"), "<h1>Home</h1>").unwrap();
    write(root.join("notes.md"), "# Notes").unwrap();
    write(root.join("posts/first.html"), "<h1>First</h1>").unwrap();
    write(root.join("posts/2024/second.html"), "<h1>Second</h1>").unwrap();
    write(root.join(".git/objects/abc"), "blob").unwrap();
    tmp
}

#[test]
fn lists_every_file_recursively_and_sorted() {
    let tmp = sample_tree();
    let files = FileTree::new::<&str>(&[]).unwrap().list_relative(tmp.path()).unwrap();
    assert_eq!(
        files,
        vec![
            PathBuf::from(".git/objects/abc"),
            PathBuf::from("index.html"),
            PathBuf::from("notes.md"),
            PathBuf::from("posts/2024/second.html"),
            PathBuf::from("posts/first.html"),
        ]
    );
}

#[test]
fn exclusion_patterns_drop_matching_files_at_any_depth() {
    let tmp = sample_tree();
    let tree = FileTree::new(&["\\.git/", "\\.md$"]).unwrap();
    let files = tree.list_relative(tmp.path()).unwrap();
    let names: Vec<String> = files.iter().map(|p| p.to_string_lossy().into_owned()).collect();

    assert_eq!(names.len(), 3, "got: {names:?}");
    assert!(!names.iter().any(|n| n.contains(".git")));
    assert!(!names.iter().any(|n| n.ends_with(".md")));
}

#[test]
fn listed_paths_keep_the_root_prefix() {
    let tmp = sample_tree();
    let files = FileTree::new(&["\\.git/"]).unwrap().list(tmp.path()).unwrap();
    assert!(files.iter().all(|p| p.starts_with(tmp.path())));
}

#[test]
fn only_filter_selects_matching_files() {
    let tmp = sample_tree();
    let tree = FileTree::new(&["\\.git/"]).unwrap().only(&["\\.html$"]).unwrap();
    let files = tree.list_relative(tmp.path()).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|p| p.extension().unwrap() == "html"));
}

#[test]
fn a_file_root_lists_itself_unless_excluded() {
    let tmp = sample_tree();
    let file = tmp.path().join("notes.md");

    let kept = FileTree::new::<&str>(&[]).unwrap().list(&file).unwrap();
    assert_eq!(kept, vec![file.clone()]);

    let dropped = FileTree::new(&["\\.md$"]).unwrap().list(&file).unwrap();
    assert!(dropped.is_empty());
}

#[test]
fn missing_root_is_not_found() {
    let tmp = tempdir().unwrap();
    let err = FileTree::new::<&str>(&[])
        .unwrap()
        .list(&tmp.path().join("nope"))
        .unwrap_err();
    assert!(matches!(err, TreeError::NotFound(_)));
    assert!(err.to_string().contains("doesn't exist"));
}

#[test]
fn invalid_pattern_is_rejected() {
    let err = FileTree::new(&["(unclosed"]).unwrap_err();
    assert!(matches!(err, TreeError::Pattern(_)));
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_descended() {
    use std::os::unix::fs::symlink;

    let tmp = sample_tree();
    let root = tmp.path();
    // a link back to an ancestor would otherwise be walked until ELOOP
    symlink(root, root.join("posts/loop")).unwrap();
    symlink(root.join("index.html"), root.join("home.html")).unwrap();
    symlink(root.join("gone.html"), root.join("dangling.html")).unwrap();

    let files = FileTree::new(&["\\.git/"]).unwrap().list_relative(root).unwrap();
    assert_eq!(
        files,
        vec![
            PathBuf::from("home.html"),
            PathBuf::from("index.html"),
            PathBuf::from("notes.md"),
            PathBuf::from("posts/2024/second.html"),
            PathBuf::from("posts/first.html"),
        ]
    );
}
