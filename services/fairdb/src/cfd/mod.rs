//! CFD discovery → rule text → structured rules
//!
//! This module implements a pipeline for:
//! 1. Running the external miner and capturing its rule text
//! 2. Filtering raw lines (target literal, operators, parentheses, arrow)
//! 3. Parsing the `attr=value, ... => attr=value` grammar
//! 4. Converting surviving rules into attribute maps

pub mod rule;
pub mod filter;
pub mod grammar;
pub mod pipeline;
pub mod discovery;

pub use rule::*;
pub use filter::*;
pub use grammar::*;
pub use pipeline::*;
pub use discovery::*;
