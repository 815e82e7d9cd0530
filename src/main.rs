use anyhow::{bail, Context, Result};
use clap::Parser;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use jflat::core::{Consolidator, Project};
use jflat::formatters::ReportFormatter;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "jflat",
    version = "0.1.0",
    author = "jflat developers",
    about = "Merge a Java project into one self-contained source file"
)]
struct Cli {
    /// Target .java file to consolidate
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Source root to resolve project classes against; defaults to the
    /// target's directory
    #[arg(short, long, value_name = "PATH")]
    project: Option<PathBuf>,

    /// Where to write the merged file; defaults to <project>/<entry>.java
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Name of the merged public class
    #[arg(short, long, value_name = "NAME", default_value = "Main")]
    entry: String,

    /// Also write a JSON run report to this path
    #[arg(short, long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        input,
        project,
        output,
        entry,
        report,
    } = cli;

    let identifier = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
    if !identifier.is_match(&entry) {
        bail!("{entry} is not a valid Java class name");
    }

    let start_time = Instant::now();

    let root = match project {
        Some(path) => path,
        None => {
            let parent = input.parent().unwrap_or_else(|| Path::new("."));
            if parent.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                parent.to_path_buf()
            }
        }
    };

    println!("jflat - single-file Java consolidation");
    println!("Input: {}", input.display());
    println!("Project root: {}", root.display());
    println!("Entry class: {entry}");

    let project = Project::load(&root)?;
    println!("Parsed {} source files", project.file_count());

    let consolidator = Consolidator::new(&project, &entry);
    let consolidation = consolidator.consolidate(&input)?;

    let output = output.unwrap_or_else(|| project.root().join(format!("{entry}.java")));
    fs::write(&output, &consolidation.source)
        .with_context(|| format!("cannot write {}", output.display()))?;

    println!("Merged file: {}", output.display());
    println!(
        "Inlined {} classes, removed {} declarations in {} passes",
        consolidation.stats.inlined_classes,
        consolidation.stats.removed_declarations,
        consolidation.stats.elimination_passes
    );
    for diagnostic in &consolidation.diagnostics {
        println!("warning: {}", diagnostic.message());
    }

    if let Some(report_path) = report {
        ReportFormatter::new().format_to_file(&consolidation, &report_path)?;
        println!("Report: {}", report_path.display());
    }

    println!(
        "Total execution time: {:.2}s",
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}
