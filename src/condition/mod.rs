//! Condition parsing and evaluation module
//!
//! This module handles parsing condition strings like "CHR>5 & INT<10"
//! and evaluating them against an attribute snapshot.

mod ast;
pub mod cache;
mod evaluator;
pub mod parser;

#[cfg(test)]
mod property_tests;

pub use ast::*;
pub use cache::{check_condition, get_or_parse};
pub use evaluator::*;
pub use parser::parse;
