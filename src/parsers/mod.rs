pub mod common;
pub mod java;

pub use java::JavaParser;
