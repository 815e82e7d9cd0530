use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Node as TSNode;

use super::common::{extract_text, find_child_by_kind, TreeSitterParser};
use crate::core::arena::{
    Arena, ClassDecl, FieldDecl, FieldInit, ImportEntry, MethodDecl, NodeId, NodeKind, RefData,
};
use crate::core::project::SourceFile;

/// Parses one Java file and lowers the tree-sitter CST into the mutable arena
/// the core algorithms work on. Declarations become structured nodes; their
/// bodies become token streams with every identifier lifted into a
/// [`NodeKind::Reference`], which is what makes name-based liveness and
/// repointing possible later.
pub struct JavaParser {
    parser: TreeSitterParser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let language = tree_sitter_java::language();
        let parser = TreeSitterParser::new(language)?;
        Ok(Self { parser })
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<SourceFile> {
        let source = self
            .parser
            .read_source(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        self.parse_source(path, &source)
    }

    pub fn parse_source(&mut self, path: &Path, source: &str) -> Result<SourceFile> {
        let tree = self
            .parser
            .parse(source)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        let root_node = tree.root_node();

        let mut lowering = Lowering {
            source: source.as_bytes(),
            arena: Arena::new(),
        };
        let (root, package) = lowering.lower_unit(&root_node);
        let mut arena = lowering.arena;
        bind_same_file_references(&mut arena, root);

        Ok(SourceFile {
            path: path.to_path_buf(),
            package,
            arena,
            root,
        })
    }
}

/// References to classes declared in the same file get their target bound up
/// front, so a deep copy of any class carries consistent self-references.
fn bind_same_file_references(arena: &mut Arena, root: NodeId) {
    let classes: HashMap<String, NodeId> = arena
        .children(root)
        .iter()
        .filter_map(|&child| match arena.kind(child) {
            NodeKind::Class(decl) => Some((decl.name.clone(), child)),
            _ => None,
        })
        .collect();

    for node in arena.descendants(root) {
        let name = match arena.kind(node) {
            NodeKind::Reference(ref_data) if ref_data.target.is_none() => ref_data.name.clone(),
            _ => continue,
        };
        if let Some(&class) = classes.get(&name) {
            if let NodeKind::Reference(ref_data) = arena.kind_mut(node) {
                ref_data.target = Some(class);
            }
        }
    }
}

/// An identifier occurrence (or a pre-built replacement node) found inside a
/// byte range, in source order.
struct Leaf {
    start: usize,
    end: usize,
    kind: NodeKind,
}

struct Lowering<'s> {
    source: &'s [u8],
    arena: Arena,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: &TSNode) -> &'s str {
        extract_text(node, self.source)
    }

    fn lower_unit(&mut self, root: &TSNode) -> (NodeId, Option<String>) {
        let unit = self.arena.alloc(NodeKind::Unit { package: None });
        let mut package: Option<String> = None;
        let mut pending_doc: Option<String> = None;
        let mut last_end = 0usize;

        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            let gap_start = last_end;
            let gap_end = child.start_byte();
            last_end = child.end_byte();

            match child.kind() {
                // The statement is recorded on the unit and dropped from the
                // stream; the merged file renders without a package.
                "package_declaration" => {
                    self.flush_doc(unit, &mut pending_doc);
                    self.emit_run(unit, gap_start, gap_end);
                    let name_node = find_child_by_kind(&child, "scoped_identifier")
                        .or_else(|| find_child_by_kind(&child, "identifier"));
                    if let Some(name_node) = name_node {
                        package = Some(self.text(&name_node).to_string());
                    }
                }
                "import_declaration" => {
                    self.flush_doc(unit, &mut pending_doc);
                    self.emit_run(unit, gap_start, gap_end);
                    let entry = self.parse_import(&child);
                    let import = self.arena.alloc(NodeKind::Import(entry));
                    self.arena.push_child(unit, import);
                }
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    let doc = pending_doc.take();
                    if doc.is_none() {
                        self.emit_run(unit, gap_start, gap_end);
                    }
                    let class = self.lower_class(&child, doc);
                    self.arena.push_child(unit, class);
                }
                "comment" | "block_comment" | "line_comment" => {
                    self.flush_doc(unit, &mut pending_doc);
                    self.emit_run(unit, gap_start, gap_end);
                    let text = self.text(&child).to_string();
                    if text.starts_with("/**") {
                        pending_doc = Some(text);
                    } else {
                        let token = self.arena.alloc(NodeKind::Token(text));
                        self.arena.push_child(unit, token);
                    }
                }
                _ => {
                    self.flush_doc(unit, &mut pending_doc);
                    self.emit_run(unit, gap_start, gap_end);
                    self.lower_opaque(unit, &child);
                }
            }
        }
        self.flush_doc(unit, &mut pending_doc);
        self.emit_run(unit, last_end, self.source.len());

        (unit, package)
    }

    fn parse_import(&self, node: &TSNode) -> ImportEntry {
        let mut qualified = String::new();
        let mut wildcard = false;
        let mut is_static = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "static" => is_static = true,
                "asterisk" => wildcard = true,
                "scoped_identifier" | "identifier" => {
                    qualified = self.text(&child).to_string();
                }
                _ => {}
            }
        }
        ImportEntry {
            qualified,
            wildcard,
            is_static,
        }
    }

    fn lower_class(&mut self, node: &TSNode, doc: Option<String>) -> NodeId {
        let keyword = match node.kind() {
            "interface_declaration" => "interface",
            "enum_declaration" => "enum",
            _ => "class",
        };
        let name_node = node.child_by_field_name("name");
        let name = name_node
            .map(|n| self.text(&n).to_string())
            .unwrap_or_default();
        let modifiers = self.modifier_tokens(node);
        let body = node.child_by_field_name("body");

        let class = self.arena.alloc(NodeKind::Class(ClassDecl {
            name,
            keyword: keyword.to_string(),
            modifiers,
            doc,
        }));

        // Type parameters and supertypes sit between the name and the body;
        // their identifiers count as uses.
        let head_from = name_node.map(|n| n.end_byte()).unwrap_or(node.start_byte());
        let head_to = body.map(|b| b.start_byte()).unwrap_or(node.end_byte());
        let mut leaves = Vec::new();
        self.collect_leaves(node, head_from, head_to, &HashMap::new(), &mut leaves);
        self.emit_stream(class, head_from, head_to, leaves);

        if let Some(body) = body {
            self.lower_class_body(class, &body);
        }
        class
    }

    fn lower_class_body(&mut self, class: NodeId, body: &TSNode) {
        let mut pending_doc: Option<String> = None;
        let mut last_end = body.start_byte();

        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            let gap_start = last_end;
            let gap_end = child.start_byte();
            last_end = child.end_byte();

            match child.kind() {
                "field_declaration" => {
                    let doc = self.take_member_doc(&mut pending_doc, gap_start, gap_end);
                    if doc.is_none() {
                        self.emit_run(class, gap_start, gap_end);
                    }
                    let member = self.lower_field(&child, doc);
                    self.arena.push_child(class, member);
                }
                "method_declaration" | "constructor_declaration" => {
                    let doc = self.take_member_doc(&mut pending_doc, gap_start, gap_end);
                    if doc.is_none() {
                        self.emit_run(class, gap_start, gap_end);
                    }
                    let member = self.lower_method(&child, doc);
                    self.arena.push_child(class, member);
                }
                "class_declaration" | "interface_declaration" | "enum_declaration" => {
                    let doc = pending_doc.take();
                    if doc.is_none() {
                        self.emit_run(class, gap_start, gap_end);
                    }
                    let nested = self.lower_class(&child, doc);
                    self.arena.push_child(class, nested);
                }
                "comment" | "block_comment" | "line_comment" => {
                    self.flush_doc(class, &mut pending_doc);
                    self.emit_run(class, gap_start, gap_end);
                    let text = self.text(&child).to_string();
                    if text.starts_with("/**") {
                        pending_doc = Some(text);
                    } else {
                        let token = self.arena.alloc(NodeKind::Token(text));
                        self.arena.push_child(class, token);
                    }
                }
                // Braces, semicolons, static initializers, enum constants.
                _ => {
                    self.flush_doc(class, &mut pending_doc);
                    self.emit_run(class, gap_start, gap_end);
                    self.lower_opaque(class, &child);
                }
            }
        }
        self.flush_doc(class, &mut pending_doc);
    }

    fn lower_field(&mut self, node: &TSNode, doc: Option<String>) -> NodeId {
        let modifiers = self.modifier_tokens(node);
        let type_node = node.child_by_field_name("type");
        let type_text = type_node
            .map(|t| self.text(&t).to_string())
            .unwrap_or_default();
        let is_array_type = type_node.map(|t| t.kind() == "array_type").unwrap_or(false);

        let mut names = Vec::new();
        let mut init = FieldInit::None;
        let mut replace: HashMap<(usize, usize), NodeKind> = HashMap::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            if let Some(name_node) = child.child_by_field_name("name") {
                let name = self.text(&name_node).to_string();
                // Declared names are plain tokens, not uses.
                replace.insert(
                    (name_node.start_byte(), name_node.end_byte()),
                    NodeKind::Token(name.clone()),
                );
                names.push(name);
            }
            if init == FieldInit::None {
                if let Some(value) = child.child_by_field_name("value") {
                    init = self.classify_init(&value);
                }
            }
        }

        let field = self.arena.alloc(NodeKind::Field(FieldDecl {
            names,
            modifiers,
            type_text,
            is_array_type,
            init,
        }));
        if let Some(doc) = doc {
            let token = self.arena.alloc(NodeKind::Token(doc));
            self.arena.push_child(field, token);
        }
        let mut leaves = Vec::new();
        self.collect_leaves(node, node.start_byte(), node.end_byte(), &replace, &mut leaves);
        self.emit_stream(field, node.start_byte(), node.end_byte(), leaves);
        field
    }

    fn classify_init(&self, value: &TSNode) -> FieldInit {
        match value.kind() {
            "object_creation_expression" | "array_creation_expression" => {
                let type_text = value
                    .child_by_field_name("type")
                    .map(|t| self.text(&t).to_string())
                    .unwrap_or_default();
                FieldInit::New { type_text }
            }
            "method_invocation" => {
                let callee = value
                    .child_by_field_name("name")
                    .map(|n| self.text(&n).to_string())
                    .unwrap_or_default();
                FieldInit::Call { callee }
            }
            _ => FieldInit::Other,
        }
    }

    fn lower_method(&mut self, node: &TSNode, doc: Option<String>) -> NodeId {
        let modifiers = self.modifier_tokens(node);
        let is_ctor = node.kind() == "constructor_declaration";
        let is_override = modifiers
            .iter()
            .any(|m| m == "@Override" || m.starts_with("@Override("));
        let name_node = node.child_by_field_name("name");
        let name = name_node
            .map(|n| self.text(&n).to_string())
            .unwrap_or_default();

        let mut replace: HashMap<(usize, usize), NodeKind> = HashMap::new();
        if let Some(name_node) = &name_node {
            // A constructor name renders as whatever its class is called, so
            // it follows the class through renames.
            let kind = if is_ctor {
                NodeKind::CtorName
            } else {
                NodeKind::Token(name.clone())
            };
            replace.insert((name_node.start_byte(), name_node.end_byte()), kind);
        }

        let method = self.arena.alloc(NodeKind::Method(MethodDecl {
            name,
            modifiers,
            is_ctor,
            is_override,
        }));
        if let Some(doc) = doc {
            let token = self.arena.alloc(NodeKind::Token(doc));
            self.arena.push_child(method, token);
        }
        let mut leaves = Vec::new();
        self.collect_leaves(node, node.start_byte(), node.end_byte(), &replace, &mut leaves);
        self.emit_stream(method, node.start_byte(), node.end_byte(), leaves);
        method
    }

    /// Lower an arbitrary CST node as a flat stream under `parent`, lifting
    /// its identifiers into references.
    fn lower_opaque(&mut self, parent: NodeId, node: &TSNode) {
        let mut leaves = Vec::new();
        self.collect_leaves(node, node.start_byte(), node.end_byte(), &HashMap::new(), &mut leaves);
        self.emit_stream(parent, node.start_byte(), node.end_byte(), leaves);
    }

    fn modifier_tokens(&self, node: &TSNode) -> Vec<String> {
        match find_child_by_kind(node, "modifiers") {
            Some(mods) => {
                let mut cursor = mods.walk();
                mods.children(&mut cursor)
                    .map(|c| self.text(&c).to_string())
                    .collect()
            }
            None => Vec::new(),
        }
    }

    /// Find every identifier inside `[from, to)` under `node`. A pure dotted
    /// chain whose last segment looks like a class name becomes one qualified
    /// reference; anything else is taken apart identifier by identifier.
    fn collect_leaves(
        &self,
        node: &TSNode,
        from: usize,
        to: usize,
        replace: &HashMap<(usize, usize), NodeKind>,
        out: &mut Vec<Leaf>,
    ) {
        if node.end_byte() <= from || node.start_byte() >= to {
            return;
        }
        let range = (node.start_byte(), node.end_byte());
        if let Some(kind) = replace.get(&range) {
            out.push(Leaf {
                start: range.0,
                end: range.1,
                kind: kind.clone(),
            });
            return;
        }
        match node.kind() {
            "identifier" | "type_identifier" => {
                let text = self.text(node);
                out.push(Leaf {
                    start: range.0,
                    end: range.1,
                    kind: NodeKind::Reference(RefData::plain(text)),
                });
            }
            "field_access" | "scoped_identifier" | "scoped_type_identifier" => {
                let text = self.text(node);
                if let Some(last) = dotted_class_suffix(text) {
                    out.push(Leaf {
                        start: range.0,
                        end: range.1,
                        kind: NodeKind::Reference(RefData {
                            name: last.to_string(),
                            text: text.to_string(),
                            target: None,
                            rewritten: false,
                        }),
                    });
                    return;
                }
                self.descend(node, from, to, replace, out);
            }
            _ => self.descend(node, from, to, replace, out),
        }
    }

    fn descend(
        &self,
        node: &TSNode,
        from: usize,
        to: usize,
        replace: &HashMap<(usize, usize), NodeKind>,
        out: &mut Vec<Leaf>,
    ) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_leaves(&child, from, to, replace, out);
        }
    }

    /// Interleave `leaves` with the literal text between them.
    fn emit_stream(&mut self, parent: NodeId, from: usize, to: usize, leaves: Vec<Leaf>) {
        let mut pos = from;
        for leaf in leaves {
            if leaf.start > pos {
                self.emit_run(parent, pos, leaf.start);
            }
            let id = self.arena.alloc(leaf.kind);
            self.arena.push_child(parent, id);
            pos = leaf.end;
        }
        if pos < to {
            self.emit_run(parent, pos, to);
        }
    }

    fn emit_run(&mut self, parent: NodeId, from: usize, to: usize) {
        if from >= to {
            return;
        }
        let text = std::str::from_utf8(&self.source[from..to])
            .unwrap_or("")
            .to_string();
        if text.is_empty() {
            return;
        }
        let kind = if text.chars().all(char::is_whitespace) {
            NodeKind::Whitespace(text)
        } else {
            NodeKind::Token(text)
        };
        let id = self.arena.alloc(kind);
        self.arena.push_child(parent, id);
    }

    /// A pending documentation comment that nothing claimed is kept as plain
    /// text where it stood.
    fn flush_doc(&mut self, parent: NodeId, pending: &mut Option<String>) {
        if let Some(text) = pending.take() {
            let token = self.arena.alloc(NodeKind::Token(text));
            self.arena.push_child(parent, token);
        }
    }

    /// Claim the pending doc for a member: the comment plus the gap up to the
    /// declaration, so the original layout between them survives as one token.
    fn take_member_doc(
        &self,
        pending: &mut Option<String>,
        gap_start: usize,
        gap_end: usize,
    ) -> Option<String> {
        let mut doc = pending.take()?;
        if gap_start < gap_end {
            doc.push_str(std::str::from_utf8(&self.source[gap_start..gap_end]).unwrap_or(""));
        }
        Some(doc)
    }
}

fn dotted_class_suffix(text: &str) -> Option<&str> {
    let plain = text
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.');
    if !plain {
        return None;
    }
    let last = text.rsplit('.').next()?;
    match last.chars().next() {
        Some(first) if first.is_uppercase() => Some(last),
        _ => None,
    }
}
