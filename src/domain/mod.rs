//! Domain layer for arch-sentinel: violations, run results, and errors.

pub mod violations;

// Re-export main domain types for convenience
pub use violations::*;
