mod analyze;
mod categories;
mod columns;

// Re-export command functions for convenience
pub use analyze::{analyze, AnalyzeArgs};
pub use categories::categories;
pub use columns::columns;
