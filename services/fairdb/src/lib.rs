//! Conditional functional dependency discovery and fairness auditing

pub mod cfd;
pub mod config;
pub mod data;
pub mod error;
pub mod fairness;

pub use error::{FairDbError, Result};
