use regex::Regex;

use crate::core::arena::{Arena, NodeId, NodeKind};
use crate::core::unit::MergedUnit;

/// Render the merged unit back to Java source. In-order concatenation of the
/// live tree, then runs of three or more newlines left behind by deletions are
/// collapsed to one blank line.
pub fn render_unit(unit: &MergedUnit) -> String {
    let mut out = String::new();
    render_node(&unit.arena, unit.root, &mut out);

    let blank_runs = Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap();
    let mut result = blank_runs.replace_all(&out, "\n\n").into_owned();
    if !result.ends_with('\n') {
        result.push('\n');
    }
    result
}

fn render_node(arena: &Arena, id: NodeId, out: &mut String) {
    match arena.kind(id) {
        NodeKind::Unit { .. } => render_children(arena, id, out),
        NodeKind::Import(entry) => out.push_str(&entry.render()),
        NodeKind::Class(decl) => {
            if let Some(doc) = &decl.doc {
                out.push_str(doc);
                out.push('\n');
            }
            for modifier in &decl.modifiers {
                out.push_str(modifier);
                out.push(' ');
            }
            out.push_str(&decl.keyword);
            out.push(' ');
            out.push_str(&decl.name);
            render_children(arena, id, out);
        }
        NodeKind::Method(_) | NodeKind::Field(_) => render_children(arena, id, out),
        NodeKind::Reference(ref_data) => {
            out.push_str(if ref_data.rewritten {
                &ref_data.name
            } else {
                &ref_data.text
            });
        }
        NodeKind::CtorName => {
            if let Some(class) = arena.enclosing_class(id) {
                if let NodeKind::Class(decl) = arena.kind(class) {
                    out.push_str(&decl.name);
                }
            }
        }
        NodeKind::Token(text) | NodeKind::Whitespace(text) => out.push_str(text),
    }
}

fn render_children(arena: &Arena, id: NodeId, out: &mut String) {
    for &child in arena.children(id) {
        render_node(arena, child, out);
    }
}
