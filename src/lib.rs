//! # jflat
//!
//! Consolidates a Java source tree into a single self-contained file.
//!
//! Starting from one target file, jflat inlines every project-local class the
//! file transitively depends on, rewrites references to point at the inlined
//! copies, renames the entry class, and then strips declarations nothing uses
//! until the result stops shrinking.
//!
//! ## Pipeline
//!
//! - **Load**: scan the source root, parse every Java file with tree-sitter
//! - **Closure**: pull dependencies into the working unit until a full pass
//!   discovers nothing new
//! - **Eliminate**: batch-remove unreferenced declarations to a fixed point
//! - **Render**: concatenate the surviving tree back into Java source

pub mod core;
pub mod formatters;
pub mod parsers;
