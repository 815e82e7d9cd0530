use std::path::{Path, PathBuf};

use crate::core::arena::{NodeId, NodeKind};
use crate::core::project::{ClassEntry, Project};
use crate::core::unit::MergedUnit;

/// Boundary for resolution and liveness search: a source root, optionally
/// minus one file (the output slot of a previous run must not feed back into
/// discovery). Files outside the scope are immutable externals: never copied,
/// never deleted, never renamed.
#[derive(Debug, Clone)]
pub struct SearchScope {
    root: PathBuf,
    exclude: Option<PathBuf>,
}

impl SearchScope {
    pub fn directory(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            exclude: None,
        }
    }

    pub fn excluding(mut self, path: &Path) -> Self {
        self.exclude = Some(path.to_path_buf());
        self
    }

    pub fn contains(&self, path: &Path) -> bool {
        if self.exclude.as_deref() == Some(path) {
            return false;
        }
        path.starts_with(&self.root)
    }
}

/// What a reference statically binds to.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A declaration inside the merged unit.
    Unit(NodeId),
    /// A project-local class outside the unit but inside the scope.
    Project(ClassEntry),
    /// Anything else: library symbols, out-of-scope files, unresolvable names.
    External,
}

/// Pure name-based binding against the unit and the project index. Never
/// mutates; a dangling or unknown reference reports [`Resolution::External`]
/// so callers treat it conservatively.
pub struct SymbolResolver<'a> {
    project: &'a Project,
    scope: &'a SearchScope,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(project: &'a Project, scope: &'a SearchScope) -> Self {
        Self { project, scope }
    }

    pub fn resolve(&self, unit: &MergedUnit, reference: NodeId) -> Resolution {
        if !unit.arena.is_alive(reference) {
            return Resolution::External;
        }
        let NodeKind::Reference(ref_data) = unit.arena.kind(reference) else {
            return Resolution::External;
        };
        if let Some(target) = ref_data.target {
            if unit.arena.is_alive(target) {
                return Resolution::Unit(target);
            }
        }
        self.resolve_name(unit, &ref_data.name, &ref_data.text)
    }

    /// Resolve a class name. `text` may be the qualified source spelling,
    /// which wins over simple-name lookup when it matches a project class.
    pub fn resolve_name(&self, unit: &MergedUnit, name: &str, text: &str) -> Resolution {
        if let Some(class) = unit.class_by_name(name) {
            return Resolution::Unit(class);
        }
        if text != name {
            if let Some(entry) = self.project.class_by_qualified(text) {
                return if self.scope.contains(&entry.file) {
                    Resolution::Project(entry.clone())
                } else {
                    Resolution::External
                };
            }
        }
        // A surviving single-type import decides the name. Project-local
        // imports are removed before resolution runs, so a match here is a
        // library binding even when the project declares the same simple name.
        for import_node in unit.imports() {
            let NodeKind::Import(entry) = unit.arena.kind(import_node) else {
                continue;
            };
            if entry.wildcard {
                continue;
            }
            let target = entry.target_class();
            let simple = target.rsplit('.').next().unwrap_or(&target);
            if simple == name {
                return Resolution::External;
            }
        }
        // Same-package classes shadow same-named classes elsewhere.
        if let Some(package) = &unit.original_package {
            let preferred = format!("{package}.{name}");
            if let Some(entry) = self.project.class_by_qualified(&preferred) {
                if self.scope.contains(&entry.file) {
                    return Resolution::Project(entry.clone());
                }
            }
        }
        let hit = self
            .project
            .classes_by_name(name)
            .iter()
            .find(|entry| self.scope.contains(&entry.file));
        match hit {
            Some(entry) => Resolution::Project(entry.clone()),
            None => Resolution::External,
        }
    }

    /// Every live reference in the unit matching one of `names`, excluding
    /// those inside the `exclude` subtree (a declaration does not keep itself
    /// alive).
    pub fn find_references(
        unit: &MergedUnit,
        names: &[String],
        exclude: Option<NodeId>,
    ) -> Vec<NodeId> {
        unit.references()
            .into_iter()
            .filter(|&r| match exclude {
                Some(subtree) => !unit.arena.contains(subtree, r),
                None => true,
            })
            .filter(|&r| match unit.arena.kind(r) {
                NodeKind::Reference(ref_data) => names.iter().any(|n| *n == ref_data.name),
                _ => false,
            })
            .collect()
    }

    /// Liveness verdict used by the eliminator: does anything outside the
    /// declaration's own subtree name it?
    pub fn is_used(unit: &MergedUnit, decl: NodeId, names: &[String]) -> bool {
        !Self::find_references(unit, names, Some(decl)).is_empty()
    }
}
