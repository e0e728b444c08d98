//! Valflow
//!
//! A single-pass value and type flow analyzer for PHP sources. It records
//! what each top-level variable holds line by line, and what each function
//! receives at each of its call sites.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod semantic;
pub mod source;

pub use error::{FlowError, FlowResult};
pub use semantic::{analyze, Analysis, Analyzer};
