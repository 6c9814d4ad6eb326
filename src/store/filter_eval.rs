//! Evaluates a [`FilterNode`] against a stored record's metadata.
//!
//! Kept as plain in-memory predicate evaluation rather than a dynamically
//! built SQL `WHERE` clause: the brute-force retriever already loads every
//! row in a collection to score it against the query vector, so filtering
//! in Rust costs nothing extra and sidesteps SQL injection entirely
//! (callers still validate field names via
//! [`FilterNode::has_safe_field_names`] before reaching here, as
//! defense in depth).

use crate::core::{FilterNode, FilterOperator};

/// Returns `true` if `meta` satisfies `filter`.
pub(super) fn matches(filter: &FilterNode, meta: &serde_json::Value) -> bool {
    match filter {
        FilterNode::Leaf { field, operator, value } => match operator {
            FilterOperator::In => meta
                .get(field)
                .and_then(serde_json::Value::as_str)
                .is_some_and(|actual| value.iter().any(|v| v == actual)),
            FilterOperator::And => false,
        },
        FilterNode::Composite { operator, conditions } => match operator {
            FilterOperator::And => conditions.iter().all(|c| matches(c, meta)),
            FilterOperator::In => false,
        },
    }
}
