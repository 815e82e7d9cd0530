use jflat::core::FileScanner;
use std::fs;

#[test]
fn finds_java_files_recursively() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Main.java"), "public class Main {}").unwrap();
    fs::create_dir_all(dir.path().join("utils")).unwrap();
    fs::write(dir.path().join("utils/Util.java"), "public class Util {}").unwrap();
    fs::write(dir.path().join("notes.txt"), "not java").unwrap();

    let files = FileScanner::new().scan_directory(dir.path()).unwrap();
    let mut names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Main.java", "Util.java"]);
}

#[test]
fn skips_hidden_directories() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Main.java"), "public class Main {}").unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    fs::write(dir.path().join(".git/Sneaky.java"), "public class Sneaky {}").unwrap();

    let files = FileScanner::new().scan_directory(dir.path()).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("Main.java"));
}
