//! Fairness evaluation of parsed rules against a table
//!
//! 1. Project the table to strings and count rule occurrences
//! 2. Score support, confidence and confidence differentials per rule
//! 3. Drop duplicate rules
//! 4. Write the scored table

pub mod table;
pub mod scoring;
pub mod dedup;
pub mod outputs;

pub use table::*;
pub use scoring::*;
pub use dedup::*;
pub use outputs::*;
