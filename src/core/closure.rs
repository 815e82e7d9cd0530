use petgraph::graph::{Graph, NodeIndex};
use petgraph::Directed;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::core::arena::{ImportEntry, NodeId, NodeKind, RefData};
use crate::core::diagnostics::Diagnostic;
use crate::core::project::{ClassEntry, Project, SourceFile};
use crate::core::rename::rewrite_reference;
use crate::core::resolver::{Resolution, SearchScope, SymbolResolver};
use crate::core::unit::MergedUnit;

/// Class-level dependency graph recorded while the closure is built; report
/// material only, the algorithms never read it back.
pub type ClassGraph = Graph<ClassNode, (), Directed>;

#[derive(Debug, Clone, Serialize)]
pub struct ClassNode {
    pub name: String,
    pub qualified: String,
}

pub struct ClosureOutcome {
    pub inlined: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub graph: ClassGraph,
}

/// How an import relates to the search scope.
enum ImportDisposition {
    /// Library or out-of-scope symbol; the statement is kept, deduplicated.
    External,
    /// Names a project-local class.
    Class(ClassEntry),
    /// Wildcard over a project-local package.
    Package(String),
}

/// Transitively inlines every project-local class the unit reaches via
/// references, imports or package membership, until a full pass discovers
/// nothing new. Grows the unit only; elimination shrinks it afterwards.
pub struct ClosureBuilder<'a> {
    project: &'a Project,
    scope: &'a SearchScope,
    /// Simple name -> qualified name of every class already in the unit.
    /// Bookkeeping is by simple name; the first class inlined wins the slot.
    present: HashMap<String, String>,
    /// Names whose processing was attempted; keeps unparsable files from
    /// being rediscovered forever.
    attempted: HashSet<String>,
    /// Textual import keys already in the unit.
    imports_seen: HashSet<String>,
    graph: ClassGraph,
    graph_nodes: HashMap<String, NodeIndex>,
    diagnostics: Vec<Diagnostic>,
    inlined: usize,
}

impl<'a> ClosureBuilder<'a> {
    pub fn new(project: &'a Project, scope: &'a SearchScope) -> Self {
        Self {
            project,
            scope,
            present: HashMap::new(),
            attempted: HashSet::new(),
            imports_seen: HashSet::new(),
            graph: Graph::new(),
            graph_nodes: HashMap::new(),
            diagnostics: Vec::new(),
            inlined: 0,
        }
    }

    pub fn run(mut self, unit: &mut MergedUnit) -> ClosureOutcome {
        info!("integrating dependencies...");

        let package = unit.original_package.clone();
        for class in unit.top_level_classes() {
            if let Some(name) = unit.class_name(class) {
                let qualified = match &package {
                    Some(pkg) => format!("{pkg}.{name}"),
                    None => name.to_string(),
                };
                let name = name.to_string();
                self.graph_node(&name, &qualified);
                self.present.insert(name, qualified);
            }
        }

        self.process_unit_file(unit);

        // Fixed point: walk references, pull in anything that still resolves
        // outside the file, repeat until a pass discovers nothing.
        let mut outside_refs: HashSet<NodeId> = HashSet::new();
        loop {
            let mut discovered: Vec<(NodeId, ClassEntry)> = Vec::new();
            let mut discovered_names: HashSet<String> = HashSet::new();
            {
                let resolver = SymbolResolver::new(self.project, self.scope);
                for reference in unit.references() {
                    if let Resolution::Project(entry) = resolver.resolve(unit, reference) {
                        outside_refs.insert(reference);
                        if !self.present.contains_key(&entry.simple_name)
                            && !self.attempted.contains(&entry.simple_name)
                            && discovered_names.insert(entry.simple_name.clone())
                        {
                            discovered.push((reference, entry));
                        }
                    }
                }
            }
            if discovered.is_empty() {
                break;
            }
            info!(
                "processing {:?}",
                discovered
                    .iter()
                    .map(|(_, e)| e.qualified.as_str())
                    .collect::<Vec<_>>()
            );
            for (reference, entry) in discovered {
                let referrer = unit
                    .arena
                    .enclosing_class(reference)
                    .and_then(|c| unit.class_name(c).map(str::to_string));
                self.process_class(unit, &entry, referrer.as_deref(), false);
            }
        }

        self.fix_references(unit, &outside_refs);
        self.check_integration(unit);

        ClosureOutcome {
            inlined: self.inlined,
            diagnostics: self.diagnostics,
            graph: self.graph,
        }
    }

    /// Process the unit's own file: implicit package, then its import list.
    /// Project-local imports are inlined and dropped; external imports stay,
    /// deduplicated.
    fn process_unit_file(&mut self, unit: &mut MergedUnit) {
        // Seed the dedup set before anything gets inlined, so a donor file
        // cannot splice in an import the unit already carries.
        for import_node in unit.imports() {
            if let NodeKind::Import(entry) = unit.arena.kind(import_node) {
                self.imports_seen.insert(entry.key());
            }
        }

        let unit_class = unit
            .top_level_classes()
            .first()
            .and_then(|&c| unit.class_name(c).map(str::to_string));

        let implicit = unit.original_package.clone().unwrap_or_default();
        self.process_package(unit, &implicit, unit_class.as_deref());

        let mut kept: HashSet<String> = HashSet::new();
        for import_node in unit.imports() {
            let NodeKind::Import(entry) = unit.arena.kind(import_node) else {
                continue;
            };
            let entry = entry.clone();
            match self.classify_import(&entry) {
                ImportDisposition::External => {
                    if !kept.insert(entry.key()) {
                        unit.arena.remove_child_coalescing(import_node);
                    }
                }
                ImportDisposition::Class(target) => {
                    self.process_class(unit, &target, unit_class.as_deref(), entry.is_static);
                    unit.arena.remove_child_coalescing(import_node);
                    if let Some(member) = entry.static_member() {
                        self.qualify_static_members(unit, &target.simple_name, &member);
                    }
                }
                ImportDisposition::Package(package) => {
                    self.process_package(unit, &package, unit_class.as_deref());
                    unit.arena.remove_child_coalescing(import_node);
                }
            }
        }
    }

    /// A class became interesting; if the unit actually references it, pull
    /// in its whole containing file. A static import counts as a reference to
    /// its owner class even when no body names the class itself.
    fn process_class(
        &mut self,
        unit: &mut MergedUnit,
        entry: &ClassEntry,
        referrer: Option<&str>,
        via_static_import: bool,
    ) {
        if let Some(kept) = self.present.get(&entry.simple_name).cloned() {
            if kept != entry.qualified {
                self.push_collision(&entry.simple_name, kept, entry.qualified.clone());
            }
            return;
        }
        if self.attempted.contains(&entry.simple_name) {
            return;
        }
        debug!("checking {}", entry.qualified);
        // Not referenced yet is not a verdict; the class may become
        // interesting once more code lands in the unit.
        if !via_static_import
            && SymbolResolver::find_references(unit, &[entry.simple_name.clone()], None).is_empty()
        {
            return;
        }
        self.attempted.insert(entry.simple_name.clone());
        if let Some(referrer) = referrer {
            self.add_dependency(referrer, &entry.simple_name, &entry.qualified);
        }
        let project = self.project;
        let Some(donor) = project.file(&entry.file) else {
            warn!("no parsed source for {}", entry.file.display());
            return;
        };
        self.process_file(unit, donor);
    }

    /// Inline every top-level class of a donor file, then chase the file's
    /// implicit package and import list.
    fn process_file(&mut self, unit: &mut MergedUnit, donor: &'a SourceFile) {
        info!("processing {}", donor.path.display());

        for (name, class_id) in donor.top_level_classes() {
            let qualified = donor.qualified_name(&name);
            if let Some(kept) = self.present.get(&name).cloned() {
                if kept != qualified {
                    self.push_collision(&name, kept, qualified);
                }
                continue;
            }
            self.present.insert(name.clone(), qualified.clone());
            self.attempted.insert(name.clone());
            self.integrate(unit, donor, class_id, &name, &qualified);
        }

        let donor_class = donor
            .top_level_classes()
            .first()
            .map(|(name, _)| name.clone());

        let implicit = donor.package.clone().unwrap_or_default();
        self.process_package(unit, &implicit, donor_class.as_deref());

        let imports: Vec<ImportEntry> = donor
            .arena
            .children(donor.root)
            .iter()
            .filter_map(|&child| match donor.arena.kind(child) {
                NodeKind::Import(entry) => Some(entry.clone()),
                _ => None,
            })
            .collect();
        for entry in imports {
            match self.classify_import(&entry) {
                ImportDisposition::External => {
                    if self.imports_seen.insert(entry.key()) {
                        self.splice_import(unit, &entry);
                    }
                }
                ImportDisposition::Class(target) => {
                    self.process_class(unit, &target, donor_class.as_deref(), entry.is_static);
                    if let Some(member) = entry.static_member() {
                        self.qualify_static_members(unit, &target.simple_name, &member);
                    }
                }
                ImportDisposition::Package(package) => {
                    self.process_package(unit, &package, donor_class.as_deref());
                }
            }
        }
    }

    /// Inline classes of a project package that the unit references.
    fn process_package(&mut self, unit: &mut MergedUnit, package: &str, referrer: Option<&str>) {
        let entries: Vec<ClassEntry> = self
            .project
            .classes_in_package(package)
            .iter()
            .filter(|entry| self.scope.contains(&entry.file))
            .cloned()
            .collect();
        for entry in entries {
            self.process_class(unit, &entry, referrer, false);
        }
    }

    /// Copy one class declaration into the unit: strip its documentation,
    /// demote `public`, append with a blank-line separator, and rely on the
    /// copy remap for self-reference consistency.
    fn integrate(
        &mut self,
        unit: &mut MergedUnit,
        donor: &SourceFile,
        class_id: NodeId,
        name: &str,
        qualified: &str,
    ) {
        info!("integrating {qualified}");
        let new_class = unit.arena.deep_copy_from(&donor.arena, class_id);
        if let NodeKind::Class(decl) = unit.arena.kind_mut(new_class) {
            decl.doc = None;
            decl.demote_visibility();
        }

        let needs_separator = match unit.arena.children(unit.root).last() {
            Some(&last) => !matches!(unit.arena.kind(last), NodeKind::Whitespace(_)),
            None => false,
        };
        if needs_separator {
            let newline = unit.arena.alloc(NodeKind::Whitespace("\n".to_string()));
            unit.arena.push_child(unit.root, newline);
        }
        unit.arena.push_child(unit.root, new_class);
        let newline = unit.arena.alloc(NodeKind::Whitespace("\n".to_string()));
        unit.arena.push_child(unit.root, newline);

        self.inlined += 1;
        self.graph_node(name, qualified);
    }

    fn classify_import(&mut self, entry: &ImportEntry) -> ImportDisposition {
        if entry.wildcard && !entry.is_static {
            if entry.qualified.starts_with("java.") {
                return ImportDisposition::External;
            }
            let local = self
                .project
                .classes_in_package(&entry.qualified)
                .iter()
                .any(|e| self.scope.contains(&e.file));
            if local {
                ImportDisposition::Package(entry.qualified.clone())
            } else {
                ImportDisposition::External
            }
        } else {
            let class_name = entry.target_class();
            if class_name.starts_with("java.") {
                return ImportDisposition::External;
            }
            match self.project.class_by_qualified(&class_name) {
                Some(target) if self.scope.contains(&target.file) => {
                    ImportDisposition::Class(target.clone())
                }
                _ => {
                    // A miss inside one of the project's own packages means a
                    // stale or broken import, worth surfacing.
                    if let Some((package, _)) = class_name.rsplit_once('.') {
                        if self.project.has_package(package) {
                            warn!("cannot resolve import {}", entry.key());
                            self.diagnostics.push(Diagnostic::UnresolvedImport {
                                qualified: entry.key(),
                            });
                        }
                    }
                    ImportDisposition::External
                }
            }
        }
    }

    /// Keep an external import that an inlined file carried, splicing it in
    /// after the unit's existing imports.
    fn splice_import(&mut self, unit: &mut MergedUnit, entry: &ImportEntry) {
        let index = unit.import_insertion_index();
        let import = unit.arena.alloc(NodeKind::Import(entry.clone()));
        let newline = unit.arena.alloc(NodeKind::Whitespace("\n".to_string()));
        if index == 0 {
            unit.arena.insert_child(unit.root, 0, import);
            unit.arena.insert_child(unit.root, 1, newline);
        } else {
            unit.arena.insert_child(unit.root, index, newline);
            unit.arena.insert_child(unit.root, index + 1, import);
        }
    }

    /// A dropped single-member static import leaves bare member calls behind;
    /// qualify them with the inlined owner so they keep binding. Calls that
    /// already have a receiver are left alone.
    fn qualify_static_members(&self, unit: &mut MergedUnit, owner: &str, member: &str) {
        let Some(class) = unit.class_by_name(owner) else {
            return;
        };
        for reference in unit.references() {
            let NodeKind::Reference(ref_data) = unit.arena.kind(reference) else {
                continue;
            };
            if ref_data.name != member || ref_data.text != member {
                continue;
            }
            let has_receiver = match unit.arena.prev_sibling(reference) {
                Some(prev) => match unit.arena.kind(prev) {
                    NodeKind::Token(text) => text.trim_end().ends_with('.'),
                    _ => false,
                },
                None => false,
            };
            if has_receiver {
                continue;
            }
            let Some(parent) = unit.arena.parent(reference) else {
                continue;
            };
            let Some(index) = unit.arena.child_index(reference) else {
                continue;
            };
            let owner_ref = unit.arena.alloc(NodeKind::Reference(RefData {
                name: owner.to_string(),
                text: owner.to_string(),
                target: Some(class),
                rewritten: true,
            }));
            let dot = unit.arena.alloc(NodeKind::Token(".".to_string()));
            unit.arena.insert_child(parent, index, owner_ref);
            unit.arena.insert_child(parent, index + 1, dot);
        }
    }

    /// Post-closure consistency: rebind every dangling reference whose name
    /// now matches an in-file class, and report the out-of-file references
    /// that could not be fixed.
    fn fix_references(&mut self, unit: &mut MergedUnit, outside_refs: &HashSet<NodeId>) {
        let references = unit.references();
        for reference in references {
            let NodeKind::Reference(ref_data) = unit.arena.kind(reference) else {
                continue;
            };
            let bound = ref_data
                .target
                .map(|t| unit.arena.is_alive(t))
                .unwrap_or(false);
            if bound {
                continue;
            }
            let name = ref_data.name.clone();
            let text = ref_data.text.clone();
            if let Some(class) = unit.class_by_name(&name) {
                if text != name {
                    debug!("fixing {text}");
                }
                rewrite_reference(&mut unit.arena, reference, class, &name);
            }
        }

        // Anything still dangling that pointed at project code is a broken
        // output: either it resolved out-of-file during discovery or it
        // spells a package the project declares.
        let mut reported: HashSet<String> = HashSet::new();
        for reference in unit.references() {
            let NodeKind::Reference(ref_data) = unit.arena.kind(reference) else {
                continue;
            };
            let fixed = ref_data
                .target
                .map(|t| unit.arena.is_alive(t))
                .unwrap_or(false);
            if fixed {
                continue;
            }
            let project_spelling = ref_data
                .text
                .rsplit_once('.')
                .map(|(package, _)| self.project.has_package(package))
                .unwrap_or(false);
            if !outside_refs.contains(&reference) && !project_spelling {
                continue;
            }
            if reported.insert(ref_data.text.clone()) {
                warn!("cannot fix reference to {}", ref_data.text);
                self.diagnostics.push(Diagnostic::CannotFixReference {
                    qualified: ref_data.text.clone(),
                });
            }
        }
    }

    fn check_integration(&mut self, unit: &MergedUnit) {
        if unit.top_level_classes().len() == self.present.len() {
            return;
        }
        let problem: Vec<String> = self
            .present
            .keys()
            .filter(|name| unit.class_by_name(name).is_none())
            .cloned()
            .collect();
        if !problem.is_empty() {
            warn!("cannot integrate {problem:?}");
            self.diagnostics
                .push(Diagnostic::CannotIntegrate { classes: problem });
        }
    }

    fn push_collision(&mut self, name: &str, kept: String, skipped: String) {
        let diagnostic = Diagnostic::NameCollision {
            name: name.to_string(),
            kept,
            skipped,
        };
        if !self.diagnostics.contains(&diagnostic) {
            warn!("{}", diagnostic.message());
            self.diagnostics.push(diagnostic);
        }
    }

    fn graph_node(&mut self, name: &str, qualified: &str) -> NodeIndex {
        if let Some(&index) = self.graph_nodes.get(name) {
            return index;
        }
        let index = self.graph.add_node(ClassNode {
            name: name.to_string(),
            qualified: qualified.to_string(),
        });
        self.graph_nodes.insert(name.to_string(), index);
        index
    }

    fn add_dependency(&mut self, from: &str, to: &str, to_qualified: &str) {
        let Some(&source) = self.graph_nodes.get(from) else {
            return;
        };
        let target = self.graph_node(to, to_qualified);
        if !self.graph.contains_edge(source, target) {
            self.graph.add_edge(source, target, ());
        }
    }
}
