use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jflat::core::{Consolidator, Project};

fn benchmark_consolidation(c: &mut Criterion) {
    let mut group = c.benchmark_group("consolidation");

    let test_dir = std::env::temp_dir().join("jflat_bench");
    std::fs::create_dir_all(test_dir.join("steps")).unwrap();

    // A chain of classes so the closure has something to chase.
    let mut main_body = String::new();
    for i in 0..20 {
        main_body.push_str(&format!("        steps.Step{i}.run();\n"));
    }
    std::fs::write(
        test_dir.join("Solver.java"),
        format!(
            "import java.util.Scanner;\n\npublic class Solver {{\n    public static void main(String[] args) {{\n        Scanner in = new Scanner(System.in);\n{main_body}        System.out.println(in.nextInt());\n    }}\n}}\n"
        ),
    )
    .unwrap();

    for i in 0..20 {
        let next = if i + 1 < 20 {
            format!("        Step{}.run();\n", i + 1)
        } else {
            String::new()
        };
        std::fs::write(
            test_dir.join(format!("steps/Step{i}.java")),
            format!(
                "package steps;\n\npublic class Step{i} {{\n    public static void run() {{\n{next}    }}\n\n    static int unused{i}() {{\n        return {i};\n    }}\n}}\n"
            ),
        )
        .unwrap();
    }

    group.bench_function("load_project", |b| {
        b.iter(|| {
            let project = Project::load(black_box(&test_dir)).unwrap();
            black_box(project.file_count())
        });
    });

    let project = Project::load(&test_dir).unwrap();
    let target = test_dir.join("Solver.java");
    group.bench_function("consolidate_chain", |b| {
        b.iter(|| {
            let consolidation = Consolidator::new(black_box(&project), "Main")
                .consolidate(black_box(&target))
                .unwrap();
            black_box(consolidation.source.len())
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_consolidation);
criterion_main!(benches);
