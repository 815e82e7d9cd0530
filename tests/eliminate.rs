use jflat::core::{eliminate_unused, MergedUnit, Project};
use jflat::formatters::render_unit;
use std::fs;

fn eliminate(source: &str) -> (String, usize) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Main.java");
    fs::write(&path, source).unwrap();
    let project = Project::load(dir.path()).unwrap();
    let mut unit = MergedUnit::from_file(project.file(&path).unwrap());
    let outcome = eliminate_unused(&mut unit);
    (render_unit(&unit), outcome.removed)
}

#[test]
fn removes_unreferenced_field() {
    let (out, removed) = eliminate(
        "public class Main {\n    private int unused = 5;\n\n    public static void main(String[] args) {\n        System.out.println(\"hi\");\n    }\n}\n",
    );
    assert!(!out.contains("unused"));
    assert_eq!(removed, 1);
}

#[test]
fn keeps_public_static_main_of_public_class() {
    let (out, removed) = eliminate(
        "public class Main {\n    public static void main(String[] args) {\n    }\n}\n",
    );
    assert!(out.contains("public static void main"));
    assert_eq!(removed, 0);
}

#[test]
fn keeps_override_methods() {
    let (out, _) = eliminate(
        "public class Main {\n    public static void main(String[] args) {\n    }\n\n    @Override\n    public String toString() {\n        return \"m\";\n    }\n}\n",
    );
    assert!(out.contains("toString"));
}

#[test]
fn keeps_field_with_side_effecting_initializer() {
    let (out, _) = eliminate(
        "public class Main {\n    private int a = compute();\n\n    public static void main(String[] args) {\n    }\n\n    static int compute() {\n        return 1;\n    }\n}\n",
    );
    assert!(out.contains("compute()"));
    assert!(out.contains("private int a"));
}

#[test]
fn getter_initializer_cascades_away() {
    let (out, removed) = eliminate(
        "public class Main {\n    private int b = getValue();\n\n    public static void main(String[] args) {\n    }\n\n    static int getValue() {\n        return 2;\n    }\n}\n",
    );
    // The field goes first; the getter becomes unreferenced and goes next pass.
    assert!(!out.contains("getValue"));
    assert_eq!(removed, 2);
}

#[test]
fn removes_unused_container_field() {
    let (out, _) = eliminate(
        "import java.util.ArrayList;\nimport java.util.List;\n\npublic class Main {\n    private List<Integer> cache = new ArrayList<>();\n\n    public static void main(String[] args) {\n    }\n}\n",
    );
    assert!(!out.contains("cache"));
}

#[test]
fn keeps_field_constructing_a_project_type() {
    let (out, _) = eliminate(
        "public class Main {\n    private Worker w = new Worker();\n\n    public static void main(String[] args) {\n    }\n}\n\nclass Worker {\n    Worker() {\n    }\n}\n",
    );
    assert!(out.contains("new Worker()"));
    assert!(out.contains("class Worker"));
}

#[test]
fn removes_unreferenced_package_private_class() {
    let (out, _) = eliminate(
        "public class Main {\n    public static void main(String[] args) {\n    }\n}\n\nclass Orphan {\n    void x() {\n    }\n}\n",
    );
    assert!(!out.contains("Orphan"));
    assert!(out.contains("class Main"));
}
