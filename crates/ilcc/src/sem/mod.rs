//! Scoped semantic analysis: name resolution, type checking, and print-table
//! construction.

pub mod analyzer;
pub mod scope;
pub mod types_eq;

pub use analyzer::{analyze, AnalysisResult, PrintTable};
