use jflat::core::{Consolidator, Diagnostic, Project};
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, source: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, source).unwrap();
}

#[test]
fn inlines_imported_class_and_strips_dead_code() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Solver.java",
        "import java.util.Scanner;\nimport utils.Util;\n\npublic class Solver {\n    public static void main(String[] args) {\n        Scanner in = new Scanner(System.in);\n        System.out.println(Util.gcd(in.nextInt(), in.nextInt()));\n    }\n}\n",
    );
    write(
        dir.path(),
        "utils/Util.java",
        "package utils;\n\npublic class Util {\n    private boolean debugFlag = false;\n\n    public static int gcd(int a, int b) {\n        return b == 0 ? a : gcd(b, a % b);\n    }\n\n    public static int unusedHelper(int x) {\n        return x - 1;\n    }\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Solver.java"))
        .unwrap();
    let out = &consolidation.source;

    assert!(out.contains("public class Main"));
    assert!(out.contains("class Util"));
    assert!(!out.contains("public class Util"));
    assert!(out.contains("Util.gcd("));
    assert!(out.contains("static int gcd(int a, int b)"));
    assert!(!out.contains("debugFlag"));
    assert!(!out.contains("unusedHelper"));
    assert!(out.contains("import java.util.Scanner;"));
    assert!(!out.contains("import utils.Util"));
    assert!(!out.contains("package"));

    assert_eq!(consolidation.stats.inlined_classes, 1);
    assert_eq!(consolidation.renames, vec![("Solver".to_string(), "Main".to_string())]);
    assert!(consolidation.diagnostics.is_empty());
}

#[test]
fn self_references_follow_the_entry_rename() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Solver.java",
        "public class Solver {\n    private int x;\n\n    public Solver(int x) {\n        this.x = x;\n    }\n\n    public static void main(String[] args) {\n        Solver s = new Solver(5);\n        System.out.println(s.x);\n    }\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Solver.java"))
        .unwrap();
    let out = &consolidation.source;

    assert!(out.contains("public class Main"));
    assert!(out.contains("public Main(int x)"));
    assert!(out.contains("new Main(5)"));
    assert!(!out.contains("Solver"));
}

#[test]
fn wildcard_import_pulls_only_referenced_classes() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "App.java",
        "import utils.*;\n\npublic class App {\n    public static void main(String[] args) {\n        Helper.run();\n    }\n}\n",
    );
    write(
        dir.path(),
        "utils/Helper.java",
        "package utils;\n\npublic class Helper {\n    public static void run() {\n    }\n}\n",
    );
    write(
        dir.path(),
        "utils/Unrelated.java",
        "package utils;\n\npublic class Unrelated {\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("App.java"))
        .unwrap();
    let out = &consolidation.source;

    assert!(out.contains("class Helper"));
    assert!(!out.contains("Unrelated"));
    assert!(!out.contains("import utils"));
}

#[test]
fn transitive_dependencies_and_import_dedup() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "A.java",
        "import java.util.List;\n\npublic class A {\n    public static void main(String[] args) {\n        B.go();\n    }\n}\n",
    );
    write(
        dir.path(),
        "B.java",
        "import java.util.List;\nimport java.util.Scanner;\n\npublic class B {\n    static void go() {\n        C c = new C();\n        List<String> xs = new java.util.ArrayList<>();\n        Scanner sc = new Scanner(System.in);\n        c.run();\n        System.out.println(xs.size() + sc.nextInt());\n    }\n}\n",
    );
    write(
        dir.path(),
        "C.java",
        "public class C {\n    void run() {\n    }\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("A.java"))
        .unwrap();
    let out = &consolidation.source;

    assert!(out.contains("class B"));
    assert!(out.contains("class C"));
    assert!(!out.contains("public class B"));
    assert_eq!(out.matches("import java.util.List;").count(), 1);
    assert!(out.contains("import java.util.Scanner;"));
    assert_eq!(consolidation.stats.inlined_classes, 2);
}

#[test]
fn rerun_on_entry_file_skips_integration() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "A.java",
        "public class A {\n    public static void main(String[] args) {\n        B.go();\n    }\n}\n",
    );
    write(
        dir.path(),
        "B.java",
        "public class B {\n    static void go() {\n    }\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let first = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("A.java"))
        .unwrap();
    fs::write(dir.path().join("Main.java"), &first.source).unwrap();

    let project = Project::load(dir.path()).unwrap();
    let second = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Main.java"))
        .unwrap();

    assert_eq!(second.stats.inlined_classes, 0);
    assert!(second.source.contains("public class Main"));
    assert!(second.source.contains("class B"));
}

#[test]
fn static_import_inlines_the_member_owner() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Solver.java",
        "import static utils.Util.gcd;\n\npublic class Solver {\n    public static void main(String[] args) {\n        System.out.println(gcd(12, 8));\n    }\n}\n",
    );
    write(
        dir.path(),
        "utils/Util.java",
        "package utils;\n\npublic class Util {\n    public static int gcd(int a, int b) {\n        return b == 0 ? a : gcd(b, a % b);\n    }\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Solver.java"))
        .unwrap();
    let out = &consolidation.source;

    assert!(out.contains("class Util"));
    // Bare member calls get the owner spelled out once the import is gone.
    assert!(out.contains("Util.gcd(12, 8)"));
    assert!(out.contains("Util.gcd(b, a % b)"));
    assert!(!out.contains("import"));
    assert_eq!(consolidation.stats.inlined_classes, 1);
    assert!(consolidation.diagnostics.is_empty());
}

#[test]
fn library_import_wins_over_project_class_with_same_name() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Solver.java",
        "import java.util.List;\n\npublic class Solver {\n    public static void main(String[] args) {\n        List<String> xs = null;\n        System.out.println(xs);\n    }\n}\n",
    );
    write(
        dir.path(),
        "other/List.java",
        "package other;\n\npublic class List {\n    int size;\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Solver.java"))
        .unwrap();
    let out = &consolidation.source;

    assert!(!out.contains("class List"));
    assert!(out.contains("import java.util.List;"));
    assert_eq!(consolidation.stats.inlined_classes, 0);
    assert!(consolidation.diagnostics.is_empty());
}

#[test]
fn colliding_simple_names_keep_the_first_class() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Solver.java",
        "import a.*;\nimport b.*;\n\npublic class Solver {\n    public static void main(String[] args) {\n        System.out.println(Util.fromA());\n    }\n}\n",
    );
    write(
        dir.path(),
        "a/Util.java",
        "package a;\n\npublic class Util {\n    static int fromA() {\n        return 1;\n    }\n}\n",
    );
    write(
        dir.path(),
        "b/Util.java",
        "package b;\n\npublic class Util {\n    static int fromB() {\n        return 2;\n    }\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Solver.java"))
        .unwrap();
    let out = &consolidation.source;

    assert!(out.contains("fromA"));
    assert!(!out.contains("fromB"));
    assert_eq!(consolidation.stats.inlined_classes, 1);
    assert!(consolidation.diagnostics.contains(&Diagnostic::NameCollision {
        name: "Util".to_string(),
        kept: "a.Util".to_string(),
        skipped: "b.Util".to_string(),
    }));
}

#[test]
fn unreadable_donor_surfaces_unresolved_import() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Solver.java",
        "import utils.Broken;\n\npublic class Solver {\n    public static void main(String[] args) {\n        System.out.println(Broken.value());\n    }\n}\n",
    );
    write(
        dir.path(),
        "utils/Helper.java",
        "package utils;\n\npublic class Helper {\n}\n",
    );
    // Not valid UTF-8; the file is scanned but never parsed.
    fs::write(dir.path().join("utils/Broken.java"), [0xFFu8, 0xFE, 0x00]).unwrap();

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Solver.java"))
        .unwrap();

    assert_eq!(consolidation.stats.inlined_classes, 0);
    assert!(consolidation
        .diagnostics
        .contains(&Diagnostic::UnresolvedImport {
            qualified: "utils.Broken".to_string(),
        }));
}

#[test]
fn dangling_reference_into_project_package_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Solver.java",
        "public class Solver {\n    public static void main(String[] args) {\n        System.out.println(utils.Broken.value());\n    }\n}\n",
    );
    write(
        dir.path(),
        "utils/Helper.java",
        "package utils;\n\npublic class Helper {\n}\n",
    );
    fs::write(dir.path().join("utils/Broken.java"), [0xFFu8, 0xFE, 0x00]).unwrap();

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Solver.java"))
        .unwrap();

    assert!(consolidation
        .diagnostics
        .contains(&Diagnostic::CannotFixReference {
            qualified: "utils.Broken".to_string(),
        }));
}

#[test]
fn flags_public_class_not_named_after_file() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Foo.java",
        "public class Bar {\n    public static void main(String[] args) {\n    }\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Foo.java"))
        .unwrap();

    assert!(consolidation.diagnostics.contains(&Diagnostic::IncorrectPublicClassName {
        found: "Bar".to_string(),
        expected: "Foo".to_string(),
    }));
    assert!(consolidation.source.contains("public class Main"));
}

#[test]
fn adds_missing_public_modifier_to_entry_class() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "Baz.java",
        "class Baz {\n    public static void main(String[] args) {\n    }\n}\n",
    );

    let project = Project::load(dir.path()).unwrap();
    let consolidation = Consolidator::new(&project, "Main")
        .consolidate(&dir.path().join("Baz.java"))
        .unwrap();

    assert!(consolidation
        .diagnostics
        .contains(&Diagnostic::ClassShouldBePublic {
            name: "Baz".to_string(),
        }));
    assert!(consolidation.source.contains("public class Main"));
}
