pub mod java_source;
pub mod report;

pub use java_source::render_unit;
pub use report::ReportFormatter;
