use anyhow::{Context, Result};
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::core::arena::{Arena, NodeId, NodeKind};
use crate::core::scanner::FileScanner;
use crate::parsers::java::JavaParser;

/// One parsed Java file, lowered into its own arena. References to classes
/// declared in the same file are already bound.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: Option<String>,
    pub arena: Arena,
    pub root: NodeId,
}

impl SourceFile {
    /// Top-level class declarations as `(simple name, node)` pairs.
    pub fn top_level_classes(&self) -> Vec<(String, NodeId)> {
        self.arena
            .children(self.root)
            .iter()
            .filter_map(|&child| match self.arena.kind(child) {
                NodeKind::Class(decl) => Some((decl.name.clone(), child)),
                _ => None,
            })
            .collect()
    }

    pub fn qualified_name(&self, simple_name: &str) -> String {
        match &self.package {
            Some(package) => format!("{package}.{simple_name}"),
            None => simple_name.to_string(),
        }
    }
}

/// Where a project class lives.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub simple_name: String,
    pub qualified: String,
    pub file: PathBuf,
}

/// Every visible source file of the project plus class and package indexes.
/// This is the "visible source files" boundary the core resolves against;
/// loading it up front is what lets the algorithms run without further I/O.
pub struct Project {
    root: PathBuf,
    files: HashMap<PathBuf, SourceFile>,
    by_name: HashMap<String, Vec<ClassEntry>>,
    by_qualified: HashMap<String, ClassEntry>,
    by_package: HashMap<String, Vec<ClassEntry>>,
}

impl Project {
    pub fn load(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("project root {} not found", root.display()))?;

        let paths = FileScanner::new().scan_directory(&root)?;
        debug!("found {} java files under {}", paths.len(), root.display());

        let parsed: DashMap<PathBuf, SourceFile> = DashMap::new();
        paths.par_iter().for_each(|path| {
            let result = JavaParser::new().and_then(|mut parser| parser.parse_file(path));
            match result {
                Ok(file) => {
                    parsed.insert(path.clone(), file);
                }
                Err(err) => warn!("failed to parse {}: {err}", path.display()),
            }
        });

        let mut files = HashMap::with_capacity(parsed.len());
        for (path, file) in parsed {
            files.insert(path, file);
        }

        let mut by_name: HashMap<String, Vec<ClassEntry>> = HashMap::new();
        let mut by_qualified = HashMap::new();
        let mut by_package: HashMap<String, Vec<ClassEntry>> = HashMap::new();
        for file in files.values() {
            for (simple_name, _) in file.top_level_classes() {
                let entry = ClassEntry {
                    qualified: file.qualified_name(&simple_name),
                    simple_name: simple_name.clone(),
                    file: file.path.clone(),
                };
                by_qualified.insert(entry.qualified.clone(), entry.clone());
                by_package
                    .entry(file.package.clone().unwrap_or_default())
                    .or_default()
                    .push(entry.clone());
                by_name.entry(simple_name).or_default().push(entry);
            }
        }

        Ok(Self {
            root,
            files,
            by_name,
            by_qualified,
            by_package,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        match path.canonicalize() {
            Ok(canonical) => self.files.get(&canonical),
            Err(_) => self.files.get(path),
        }
    }

    pub fn class_by_qualified(&self, qualified: &str) -> Option<&ClassEntry> {
        self.by_qualified.get(qualified)
    }

    pub fn classes_by_name(&self, simple_name: &str) -> &[ClassEntry] {
        self.by_name
            .get(simple_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn classes_in_package(&self, package: &str) -> &[ClassEntry] {
        self.by_package
            .get(package)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_package(&self, package: &str) -> bool {
        self.by_package.contains_key(package)
    }
}
