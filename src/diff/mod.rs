//! Structured differencing of two snapshot lists, and the report the
//! presentation layer renders from it.

mod engine;
mod report;

pub use engine::{DiffError, FileDiff, diff};
pub use report::Report;
