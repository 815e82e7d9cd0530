pub mod arena;
pub mod closure;
pub mod consolidator;
pub mod diagnostics;
pub mod eliminate;
pub mod project;
pub mod rename;
pub mod resolver;
pub mod scanner;
pub mod unit;

pub use arena::{Arena, NodeId, NodeKind};
pub use closure::{ClassGraph, ClosureBuilder};
pub use consolidator::{Consolidation, Consolidator};
pub use diagnostics::Diagnostic;
pub use eliminate::eliminate_unused;
pub use project::{ClassEntry, Project, SourceFile};
pub use resolver::{Resolution, SearchScope, SymbolResolver};
pub use scanner::FileScanner;
pub use unit::MergedUnit;
