use jflat::core::Project;
use std::fs;

#[test]
fn indexes_classes_by_name_qualified_and_package() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("Solver.java"),
        "public class Solver {\n    public static void main(String[] args) {\n    }\n}\n",
    )
    .unwrap();
    fs::create_dir_all(dir.path().join("utils")).unwrap();
    fs::write(
        dir.path().join("utils/Util.java"),
        "package utils;\n\npublic class Util {\n}\n",
    )
    .unwrap();

    let project = Project::load(dir.path()).unwrap();
    assert_eq!(project.file_count(), 2);

    let util = project.class_by_qualified("utils.Util").unwrap();
    assert_eq!(util.simple_name, "Util");
    assert!(util.file.ends_with("utils/Util.java"));

    assert_eq!(project.classes_by_name("Solver").len(), 1);
    assert_eq!(project.classes_in_package("utils").len(), 1);
    assert_eq!(project.classes_in_package("").len(), 1);
    assert!(project.has_package("utils"));
    assert!(!project.has_package("missing"));
}

#[test]
fn file_lookup_tolerates_unnormalized_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("A.java"), "public class A {\n}\n").unwrap();

    let project = Project::load(dir.path()).unwrap();
    let file = project.file(&dir.path().join("A.java")).unwrap();
    assert_eq!(file.top_level_classes().len(), 1);
}
