pub mod filename;
pub mod metric;

pub use filename::FilenameMatcher;
