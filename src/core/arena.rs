use std::collections::HashMap;

/// Stable handle into an [`Arena`]. Indices are never reused; deleted subtrees
/// keep their slots but fail the liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Import statement, normalized. `qualified` never carries the trailing `.*`;
/// the flags do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportEntry {
    pub qualified: String,
    pub wildcard: bool,
    pub is_static: bool,
}

impl ImportEntry {
    /// Textual dedup key. Two imports with equal keys are the same statement.
    pub fn key(&self) -> String {
        let mut key = String::new();
        if self.is_static {
            key.push_str("static ");
        }
        key.push_str(&self.qualified);
        if self.wildcard {
            key.push_str(".*");
        }
        key
    }

    pub fn render(&self) -> String {
        format!("import {};", self.key())
    }

    /// Member name of a single-member static import, `None` for everything
    /// else.
    pub fn static_member(&self) -> Option<String> {
        if !self.is_static || self.wildcard {
            return None;
        }
        self.qualified
            .rsplit_once('.')
            .map(|(_, member)| member.to_string())
    }

    /// Qualified name of the class an import binds to. For a static member
    /// import that is the owner class (everything up to the last segment).
    pub fn target_class(&self) -> String {
        if self.is_static && !self.wildcard {
            match self.qualified.rsplit_once('.') {
                Some((owner, _member)) => owner.to_string(),
                None => self.qualified.clone(),
            }
        } else {
            self.qualified.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    /// `class`, `interface` or `enum`.
    pub keyword: String,
    /// Raw modifier tokens in source order, annotations included.
    pub modifiers: Vec<String>,
    /// Attached documentation comment, stripped when the class is inlined.
    pub doc: Option<String>,
}

impl ClassDecl {
    pub fn is_public(&self) -> bool {
        self.modifiers.iter().any(|m| m == "public")
    }

    pub fn demote_visibility(&mut self) {
        self.modifiers.retain(|m| m != "public");
    }
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Vec<String>,
    pub is_ctor: bool,
    pub is_override: bool,
}

impl MethodDecl {
    pub fn is_public(&self) -> bool {
        self.modifiers.iter().any(|m| m == "public")
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.iter().any(|m| m == "static")
    }
}

/// Shape of a field initializer, classified at lowering time. Drives the
/// side-effect exemptions during elimination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldInit {
    None,
    /// `= new Type(...)`
    New { type_text: String },
    /// `= call(...)`, callee name recorded.
    Call { callee: String },
    Other,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// All declarator names; `int a, b;` declares two.
    pub names: Vec<String>,
    pub modifiers: Vec<String>,
    pub type_text: String,
    pub is_array_type: bool,
    pub init: FieldInit,
}

/// Use of a named declaration. `text` is the original source spelling (may be
/// package-qualified); once `rewritten`, the reference renders as the bare
/// `name` of its new in-file target.
#[derive(Debug, Clone)]
pub struct RefData {
    pub name: String,
    pub text: String,
    pub target: Option<NodeId>,
    pub rewritten: bool,
}

impl RefData {
    pub fn plain(name: &str) -> Self {
        Self {
            name: name.to_string(),
            text: name.to_string(),
            target: None,
            rewritten: false,
        }
    }
}

/// Closed set of node kinds; every algorithm matches exhaustively.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Compilation unit root. `package` is the declaring package of the file
    /// the unit was lowered from; the merged unit renders without one.
    Unit { package: Option<String> },
    Import(ImportEntry),
    Class(ClassDecl),
    Method(MethodDecl),
    Field(FieldDecl),
    Reference(RefData),
    /// Renders the current name of the enclosing class; constructor names
    /// follow class renames through this node.
    CtorName,
    Token(String),
    Whitespace(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    alive: bool,
}

/// Mutable AST arena. Parent links are navigation only; a node owns its
/// children. Removal detaches a subtree and flags it dead in place, so
/// outstanding [`NodeId`]s stay valid to hold but fail [`Arena::is_alive`].
#[derive(Debug, Default, Clone)]
pub struct Arena {
    nodes: Vec<NodeData>,
}

impl Arena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            alive: true,
        });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.index()].kind
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes[id.index()].alive
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.insert(index, child);
    }

    /// Position of `child` among its parent's children.
    pub fn child_index(&self, child: NodeId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Detach a subtree from its parent and mark every node in it dead.
    pub fn remove_subtree(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent {
            self.nodes[parent.index()].children.retain(|&c| c != id);
        }
        self.nodes[id.index()].parent = None;
        self.mark_dead(id);
    }

    fn mark_dead(&mut self, id: NodeId) {
        self.nodes[id.index()].alive = false;
        let children = self.nodes[id.index()].children.clone();
        for child in children {
            self.mark_dead(child);
        }
    }

    /// Remove a declaration and coalesce the surrounding whitespace so exactly
    /// one separating run remains: when the removed node sat between two
    /// whitespace siblings, the leading one goes with it.
    pub fn remove_child_coalescing(&mut self, id: NodeId) {
        let prev = self.prev_sibling(id);
        let next = self.next_sibling(id);
        self.remove_subtree(id);
        if let (Some(prev), Some(next)) = (prev, next) {
            let both_ws = matches!(self.kind(prev), NodeKind::Whitespace(_))
                && matches!(self.kind(next), NodeKind::Whitespace(_));
            if both_ws {
                self.remove_subtree(prev);
            }
        }
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let index = self.child_index(id)?;
        if index == 0 {
            return None;
        }
        let parent = self.parent(id)?;
        self.children(parent).get(index - 1).copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let index = self.child_index(id)?;
        let parent = self.parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Preorder walk of the live subtree rooted at `id`, root included.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        if !self.is_alive(id) {
            return;
        }
        out.push(id);
        for &child in self.children(id) {
            self.collect_descendants(child, out);
        }
    }

    /// True when `node` lies inside the subtree rooted at `ancestor`
    /// (`node == ancestor` counts).
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Nearest enclosing class of `id`, excluding `id` itself.
    pub fn enclosing_class(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if matches!(self.kind(node), NodeKind::Class(_)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Deep-copy a subtree from another arena into this one. Reference targets
    /// that point inside the copied subtree are remapped onto the new copy
    /// (this is what keeps an inlined class self-consistent); targets outside
    /// it are cleared and must be rebound by name later.
    pub fn deep_copy_from(&mut self, src: &Arena, src_root: NodeId) -> NodeId {
        let mut map: HashMap<NodeId, NodeId> = HashMap::new();
        let new_root = self.copy_rec(src, src_root, &mut map);
        for &new_id in map.values() {
            if let NodeKind::Reference(ref_data) = self.kind_mut(new_id) {
                ref_data.target = match ref_data.target {
                    Some(old) => map.get(&old).copied(),
                    None => None,
                };
            }
        }
        new_root
    }

    fn copy_rec(&mut self, src: &Arena, src_id: NodeId, map: &mut HashMap<NodeId, NodeId>) -> NodeId {
        let new_id = self.alloc(src.kind(src_id).clone());
        map.insert(src_id, new_id);
        for &child in src.children(src_id) {
            let new_child = self.copy_rec(src, child, map);
            self.push_child(new_id, new_child);
        }
        new_id
    }
}
