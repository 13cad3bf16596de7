//! Object graph walks: cycle detection and removal

mod detector;
mod sanitizer;

pub use detector::{has_cycle, is_traversable};
pub use sanitizer::sanitize;
