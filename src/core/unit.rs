use crate::core::arena::{Arena, NodeId, NodeKind};
use crate::core::project::SourceFile;

/// The compilation unit being built: a private copy of the target file that
/// the closure builder grows and the eliminator shrinks. Owns its arena
/// exclusively for the whole operation.
#[derive(Debug)]
pub struct MergedUnit {
    pub arena: Arena,
    pub root: NodeId,
    /// Package the target file declared before it was stripped; used as the
    /// implicit package during dependency discovery.
    pub original_package: Option<String>,
}

impl MergedUnit {
    /// Copy a parsed file into a fresh unit. Intra-file reference bindings
    /// survive the copy; the package declaration does not (the merged file is
    /// written without one).
    pub fn from_file(file: &SourceFile) -> Self {
        let mut arena = Arena::new();
        let root = arena.deep_copy_from(&file.arena, file.root);
        if let NodeKind::Unit { package } = arena.kind_mut(root) {
            *package = None;
        }
        Self {
            arena,
            root,
            original_package: file.package.clone(),
        }
    }

    /// Live top-level class declarations, in file order.
    pub fn top_level_classes(&self) -> Vec<NodeId> {
        self.arena
            .children(self.root)
            .iter()
            .copied()
            .filter(|&c| matches!(self.arena.kind(c), NodeKind::Class(_)))
            .collect()
    }

    pub fn class_by_name(&self, name: &str) -> Option<NodeId> {
        self.top_level_classes().into_iter().find(|&c| {
            matches!(self.arena.kind(c), NodeKind::Class(decl) if decl.name == name)
        })
    }

    pub fn class_name(&self, class: NodeId) -> Option<&str> {
        match self.arena.kind(class) {
            NodeKind::Class(decl) => Some(&decl.name),
            _ => None,
        }
    }

    /// Live import statements, in file order.
    pub fn imports(&self) -> Vec<NodeId> {
        self.arena
            .children(self.root)
            .iter()
            .copied()
            .filter(|&c| matches!(self.arena.kind(c), NodeKind::Import(_)))
            .collect()
    }

    /// Every live reference node in the unit, preorder.
    pub fn references(&self) -> Vec<NodeId> {
        self.arena
            .descendants(self.root)
            .into_iter()
            .filter(|&n| matches!(self.arena.kind(n), NodeKind::Reference(_)))
            .collect()
    }

    /// Index right after the last import, where kept external imports from
    /// inlined files are spliced in. Falls back to the front of the unit.
    pub fn import_insertion_index(&self) -> usize {
        let children = self.arena.children(self.root);
        let mut index = 0;
        for (i, &child) in children.iter().enumerate() {
            if matches!(self.arena.kind(child), NodeKind::Import(_)) {
                index = i + 1;
            }
        }
        index
    }

    /// Drop a leading pure-whitespace run, if any.
    pub fn trim_leading_whitespace(&mut self) {
        if let Some(&first) = self.arena.children(self.root).first() {
            if matches!(self.arena.kind(first), NodeKind::Whitespace(_)) {
                self.arena.remove_subtree(first);
            }
        }
    }
}
