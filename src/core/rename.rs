use tracing::info;

use crate::core::arena::{Arena, NodeId, NodeKind};

/// Repoint a single reference at a new declaration. The reference renders as
/// the bare `name` from here on; any package qualifier it carried is gone.
pub fn rewrite_reference(arena: &mut Arena, reference: NodeId, target: NodeId, name: &str) {
    if let NodeKind::Reference(ref_data) = arena.kind_mut(reference) {
        ref_data.target = Some(target);
        ref_data.name = name.to_string();
        ref_data.rewritten = true;
    }
}

/// Rename a class declaration and rewrite every reference within `boundary`
/// that resolves to it. Two-phase: collect over a snapshot, then apply, so the
/// rewrites cannot disturb the walk. References outside the boundary are left
/// alone and become the caller's problem.
pub fn rename_class(arena: &mut Arena, class: NodeId, new_name: &str, boundary: NodeId) {
    let old_name = match arena.kind(class) {
        NodeKind::Class(decl) => decl.name.clone(),
        _ => return,
    };
    info!("renaming {old_name} -> {new_name}");

    let self_references: Vec<NodeId> = arena
        .descendants(boundary)
        .into_iter()
        .filter(|&node| {
            matches!(
                arena.kind(node),
                NodeKind::Reference(ref_data) if ref_data.target == Some(class)
            )
        })
        .collect();

    if let NodeKind::Class(decl) = arena.kind_mut(class) {
        decl.name = new_name.to_string();
    }
    for reference in self_references {
        rewrite_reference(arena, reference, class, new_name);
    }
}
