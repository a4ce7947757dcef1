//! Condition parsing cache
//!
//! Parsing is pure with respect to the source string, so parsed trees are
//! shared process-wide.

use crate::condition::ast::ConditionExpr;
use crate::condition::evaluator::evaluate;
use crate::condition::parser;
use crate::error::Result;
use crate::property::AttributeSource;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

/// Global condition cache with fast hashing (ahash)
static CONDITION_CACHE: Lazy<RwLock<AHashMap<String, Arc<ConditionExpr>>>> =
    Lazy::new(|| RwLock::new(AHashMap::with_capacity(2048)));

/// Get or parse a condition string
#[inline]
pub fn get_or_parse(condition: &str) -> Arc<ConditionExpr> {
    if let Some(expr) = CONDITION_CACHE.read().get(condition) {
        return Arc::clone(expr);
    }

    let expr = Arc::new(parser::parse(condition));
    CONDITION_CACHE
        .write()
        .entry(condition.to_string())
        .or_insert_with(|| Arc::clone(&expr));
    expr
}

/// Parse (through the cache) and evaluate a condition string
#[inline]
pub fn check_condition<S: AttributeSource + ?Sized>(condition: &str, source: &S) -> Result<bool> {
    evaluate(&get_or_parse(condition), source)
}

/// Clear the condition cache
pub fn clear_cache() {
    CONDITION_CACHE.write().clear();
}

/// Number of cached conditions
pub fn cache_size() -> usize {
    CONDITION_CACHE.read().len()
}
