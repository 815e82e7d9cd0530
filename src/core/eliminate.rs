use tracing::{info, warn};

use crate::core::arena::{FieldInit, NodeId, NodeKind};
use crate::core::diagnostics::Diagnostic;
use crate::core::resolver::SymbolResolver;
use crate::core::unit::MergedUnit;

pub struct EliminationOutcome {
    pub passes: usize,
    pub removed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Container types reachable through `import java.util.*`. A field holding one
/// of these is presumed side-effect free to construct and safe to drop.
const JAVA_UTIL_CONTAINERS: &[&str] = &[
    "ArrayDeque",
    "ArrayList",
    "BitSet",
    "Deque",
    "EnumMap",
    "EnumSet",
    "HashMap",
    "HashSet",
    "Hashtable",
    "LinkedHashMap",
    "LinkedHashSet",
    "LinkedList",
    "List",
    "Map",
    "PriorityQueue",
    "Queue",
    "Random",
    "Scanner",
    "Set",
    "Stack",
    "StringJoiner",
    "StringTokenizer",
    "TreeMap",
    "TreeSet",
    "Vector",
];

struct Candidate {
    node: NodeId,
    name: String,
}

/// Fixed-point dead-code removal. Each pass collects every unreferenced
/// declaration over a frozen view, then applies the batch; deleting a
/// declaration can orphan another, so passes repeat until one removes nothing.
pub fn eliminate_unused(unit: &mut MergedUnit) -> EliminationOutcome {
    info!("eliminating unused code...");
    let mut passes = 0;
    let mut removed = 0;
    let mut diagnostics = Vec::new();

    loop {
        passes += 1;
        let candidates = collect_candidates(unit);
        let mut removed_this_pass = 0;
        for candidate in candidates {
            // Guard only: candidates never nest, so a dead node at apply time
            // means the collect pass handed out overlapping subtrees.
            if !unit.arena.is_alive(candidate.node) {
                warn!("could not delete {}", candidate.name);
                diagnostics.push(Diagnostic::DeletionFailed {
                    name: candidate.name,
                });
                continue;
            }
            info!("unused element: {}", candidate.name);
            unit.arena.remove_child_coalescing(candidate.node);
            removed_this_pass += 1;
        }
        removed += removed_this_pass;
        if removed_this_pass == 0 {
            break;
        }
    }

    EliminationOutcome {
        passes,
        removed,
        diagnostics,
    }
}

fn collect_candidates(unit: &MergedUnit) -> Vec<Candidate> {
    let mut out = Vec::new();
    for class in unit.top_level_classes() {
        visit_class(unit, class, &mut out);
    }
    out
}

fn visit_class(unit: &MergedUnit, class: NodeId, out: &mut Vec<Candidate>) {
    let NodeKind::Class(decl) = unit.arena.kind(class) else {
        return;
    };
    // A dead non-public class goes as a whole; its members are not inspected
    // so the candidate list never nests.
    if !decl.is_public() && !SymbolResolver::is_used(unit, class, &[decl.name.clone()]) {
        out.push(Candidate {
            node: class,
            name: decl.name.clone(),
        });
        return;
    }

    for &member in unit.arena.children(class) {
        match unit.arena.kind(member) {
            NodeKind::Class(_) => visit_class(unit, member, out),
            NodeKind::Method(_) => visit_method(unit, member, out),
            NodeKind::Field(_) => visit_field(unit, member, out),
            _ => {}
        }
    }
}

fn visit_method(unit: &MergedUnit, member: NodeId, out: &mut Vec<Candidate>) {
    let NodeKind::Method(decl) = unit.arena.kind(member) else {
        return;
    };
    // Overrides are reached through their supertype; name search cannot see
    // that, so they are exempt.
    if decl.is_override {
        return;
    }
    if decl.name == "main"
        && decl.is_public()
        && decl.is_static()
        && enclosing_class_public(unit, member)
    {
        return;
    }
    // A constructor lives as long as its class name is referenced.
    let names = if decl.is_ctor {
        match unit.arena.enclosing_class(member) {
            Some(class) => match unit.arena.kind(class) {
                NodeKind::Class(class_decl) => vec![class_decl.name.clone()],
                _ => return,
            },
            None => return,
        }
    } else {
        vec![decl.name.clone()]
    };
    if !SymbolResolver::is_used(unit, member, &names) {
        out.push(Candidate {
            node: member,
            name: decl.name.clone(),
        });
    }
}

fn visit_field(unit: &MergedUnit, member: NodeId, out: &mut Vec<Candidate>) {
    let NodeKind::Field(decl) = unit.arena.kind(member) else {
        return;
    };
    match &decl.init {
        // A call initializer may have side effects; plain getters are assumed
        // not to.
        FieldInit::Call { callee } => {
            if !callee.starts_with("get") {
                return;
            }
        }
        // A constructor call is kept unless the type is an array or a known
        // side-effect-free container.
        FieldInit::New { .. } => {
            if !decl.is_array_type && !is_java_util_type(unit, &decl.type_text) {
                return;
            }
        }
        FieldInit::None | FieldInit::Other => {}
    }
    // `int a, b;` is one declaration; it goes only when every name is dead.
    if !SymbolResolver::is_used(unit, member, &decl.names) {
        out.push(Candidate {
            node: member,
            name: decl.names.join(", "),
        });
    }
}

fn enclosing_class_public(unit: &MergedUnit, member: NodeId) -> bool {
    match unit.arena.enclosing_class(member) {
        Some(class) => match unit.arena.kind(class) {
            NodeKind::Class(decl) => decl.is_public(),
            _ => false,
        },
        None => false,
    }
}

/// Does the field's declared type come from `java.util`? Checks the qualified
/// spelling, single-type imports, and the wildcard import against a container
/// whitelist.
fn is_java_util_type(unit: &MergedUnit, type_text: &str) -> bool {
    let base = type_text.split('<').next().unwrap_or(type_text).trim();
    if base.starts_with("java.util.") {
        return true;
    }
    if base.contains('.') {
        return false;
    }
    for import_node in unit.imports() {
        let NodeKind::Import(entry) = unit.arena.kind(import_node) else {
            continue;
        };
        if entry.is_static {
            continue;
        }
        if !entry.wildcard && entry.qualified == format!("java.util.{base}") {
            return true;
        }
        if entry.wildcard && entry.qualified == "java.util" && JAVA_UTIL_CONTAINERS.contains(&base)
        {
            return true;
        }
    }
    false
}
