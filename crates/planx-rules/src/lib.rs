//! # Built-in Converter Rules
//!
//! This crate provides the default set of logical-to-physical converter rules for
//! the `planx-core` lowering engine. Every logical operator kind has at least one
//! rule, so a well-formed logical plan always lowers.
//!
//! - **`ImplValuesRule`** / **`ImplSeqScanRule`**: leaves.
//! - **`ImplFilterRule`** / **`ImplProjectRule`**: row-at-a-time operators.
//! - **`ImplHashJoinRule`**: joins with at least one equi conjunct.
//! - **`ImplNestedLoopJoinRule`**: any join (fallback).
//! - **`ImplHashAggregateRule`**: aggregation.
//! - **`ImplSortRule`** / **`ImplLimitRule`**: single-phase ordering operators.
//! - **`ImplInsertRule`** / **`ImplDeleteRule`**: data modification.
//!
//! Each rule copies the operator parameters verbatim; distribution requirements
//! are a property of the physical operator and are resolved afterwards by
//! `planx_core::distribution`.

pub mod impl_agg;
pub mod impl_dml;
pub mod impl_join;
pub mod impl_project;
pub mod impl_scan;
pub mod impl_sort;

use planx_core::error::Result;
use planx_core::rule::RuleRegistry;

/// Create a rule registry with all built-in rules.
///
/// Registration order matters to the `FirstMatch` selector: the hash join is
/// registered ahead of the nested loop join.
pub fn default_rule_registry() -> Result<RuleRegistry> {
    let mut registry = RuleRegistry::new();

    registry.add_rule(Box::new(impl_scan::ImplValuesRule))?;
    registry.add_rule(Box::new(impl_scan::ImplSeqScanRule))?;
    registry.add_rule(Box::new(impl_project::ImplFilterRule))?;
    registry.add_rule(Box::new(impl_project::ImplProjectRule))?;
    registry.add_rule(Box::new(impl_join::ImplHashJoinRule))?;
    registry.add_rule(Box::new(impl_join::ImplNestedLoopJoinRule))?;
    registry.add_rule(Box::new(impl_agg::ImplHashAggregateRule))?;
    registry.add_rule(Box::new(impl_sort::ImplSortRule))?;
    registry.add_rule(Box::new(impl_sort::ImplLimitRule))?;
    registry.add_rule(Box::new(impl_dml::ImplInsertRule))?;
    registry.add_rule(Box::new(impl_dml::ImplDeleteRule))?;

    Ok(registry)
}
