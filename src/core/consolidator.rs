use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

use crate::core::arena::NodeKind;
use crate::core::closure::{ClassGraph, ClosureBuilder};
use crate::core::diagnostics::Diagnostic;
use crate::core::eliminate::eliminate_unused;
use crate::core::project::Project;
use crate::core::rename::rename_class;
use crate::core::resolver::SearchScope;
use crate::core::unit::MergedUnit;
use crate::formatters::java_source::render_unit;

pub struct ConsolidateStats {
    pub inlined_classes: usize,
    pub removed_declarations: usize,
    pub elimination_passes: usize,
}

/// Everything one run produces: the merged source plus the material the
/// report formatter works from.
pub struct Consolidation {
    pub source: String,
    pub diagnostics: Vec<Diagnostic>,
    /// `(old, new)` class renames applied while preparing the entry class.
    pub renames: Vec<(String, String)>,
    pub graph: ClassGraph,
    pub stats: ConsolidateStats,
}

/// Drives one consolidation: prepare the target's entry class, build the
/// dependency closure, eliminate dead declarations, render.
pub struct Consolidator<'a> {
    project: &'a Project,
    entry_name: String,
}

impl<'a> Consolidator<'a> {
    pub fn new(project: &'a Project, entry_name: &str) -> Self {
        Self {
            project,
            entry_name: entry_name.to_string(),
        }
    }

    pub fn consolidate(&self, target: &Path) -> Result<Consolidation> {
        let file = self
            .project
            .file(target)
            .with_context(|| format!("{} is not a parsed project file", target.display()))?;
        let stem = file
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!("copying {} into a working unit", file.path.display());
        let mut unit = MergedUnit::from_file(file);
        unit.trim_leading_whitespace();

        let mut diagnostics = Vec::new();
        let mut renames = Vec::new();
        self.prepare_entry_class(&mut unit, &stem, &mut diagnostics, &mut renames);

        // Re-running on the previous output skips the closure; the file is
        // already self-contained and only gets another elimination round.
        let (graph, inlined) = if stem == self.entry_name {
            info!("{stem} is already the entry file, skipping integration");
            (ClassGraph::new(), 0)
        } else {
            let output_slot = self.project.root().join(format!("{}.java", self.entry_name));
            let scope = SearchScope::directory(self.project.root()).excluding(&output_slot);
            let outcome = ClosureBuilder::new(self.project, &scope).run(&mut unit);
            diagnostics.extend(outcome.diagnostics);
            (outcome.graph, outcome.inlined)
        };

        let elimination = eliminate_unused(&mut unit);
        diagnostics.extend(elimination.diagnostics);

        let source = render_unit(&unit);
        Ok(Consolidation {
            source,
            diagnostics,
            renames,
            graph,
            stats: ConsolidateStats {
                inlined_classes: inlined,
                removed_declarations: elimination.removed,
                elimination_passes: elimination.passes,
            },
        })
    }

    /// Locate the class the file is named after, fix its visibility if needed,
    /// and rename it to the entry name. Self-references inside the unit follow
    /// the rename.
    fn prepare_entry_class(
        &self,
        unit: &mut MergedUnit,
        stem: &str,
        diagnostics: &mut Vec<Diagnostic>,
        renames: &mut Vec<(String, String)>,
    ) {
        let mut entry_class = None;
        for class in unit.top_level_classes() {
            let NodeKind::Class(decl) = unit.arena.kind(class) else {
                continue;
            };
            if decl.is_public() {
                if decl.name != stem {
                    warn!("public class {} does not match file name {stem}", decl.name);
                    diagnostics.push(Diagnostic::IncorrectPublicClassName {
                        found: decl.name.clone(),
                        expected: stem.to_string(),
                    });
                }
                entry_class = Some(class);
                break;
            }
            if decl.name == stem {
                warn!("class {stem} should be public, adding the modifier");
                diagnostics.push(Diagnostic::ClassShouldBePublic {
                    name: decl.name.clone(),
                });
                if let NodeKind::Class(decl) = unit.arena.kind_mut(class) {
                    // Keep `public` after any annotations.
                    let at = decl
                        .modifiers
                        .iter()
                        .position(|m| !m.starts_with('@'))
                        .unwrap_or(decl.modifiers.len());
                    decl.modifiers.insert(at, "public".to_string());
                }
                entry_class = Some(class);
                break;
            }
        }

        let Some(class) = entry_class else {
            return;
        };
        let old_name = match unit.arena.kind(class) {
            NodeKind::Class(decl) => decl.name.clone(),
            _ => return,
        };
        if old_name != self.entry_name {
            rename_class(&mut unit.arena, class, &self.entry_name, unit.root);
            renames.push((old_name, self.entry_name.clone()));
        }
    }
}
