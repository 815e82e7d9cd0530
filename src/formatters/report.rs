use anyhow::Result;
use petgraph::visit::EdgeRef;
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::core::consolidator::Consolidation;

/// JSON run report: what was inlined, what was removed, what went wrong.
pub struct ReportFormatter;

impl ReportFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format_to_file(&self, consolidation: &Consolidation, output_path: &Path) -> Result<()> {
        let json_content = self.format(consolidation)?;
        fs::write(output_path, json_content)?;
        Ok(())
    }

    pub fn format(&self, consolidation: &Consolidation) -> Result<String> {
        let graph = &consolidation.graph;

        let mut index_map = HashMap::new();
        let mut nodes = Vec::new();
        for idx in graph.node_indices() {
            if let Some(class) = graph.node_weight(idx) {
                index_map.insert(idx, nodes.len());
                nodes.push(json!({
                    "name": class.name,
                    "qualified": class.qualified
                }));
            }
        }

        let mut edges = Vec::new();
        for edge_ref in graph.edge_references() {
            if let (Some(&src), Some(&tgt)) = (
                index_map.get(&edge_ref.source()),
                index_map.get(&edge_ref.target()),
            ) {
                edges.push(json!([src, tgt]));
            }
        }

        let renames: Vec<_> = consolidation
            .renames
            .iter()
            .map(|(old, new)| json!({ "from": old, "to": new }))
            .collect();

        let output = json!({
            "meta": {
                "inlined_classes": consolidation.stats.inlined_classes,
                "removed_declarations": consolidation.stats.removed_declarations,
                "elimination_passes": consolidation.stats.elimination_passes
            },
            "renames": renames,
            "diagnostics": consolidation.diagnostics,
            "graph": {
                "nodes": nodes,
                "edges": edges
            }
        });

        Ok(serde_json::to_string_pretty(&output)?)
    }
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self::new()
    }
}
