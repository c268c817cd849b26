//! # Aggregate Converter Rule
//!
//! ## Hash Aggregate (`ImplHashAggregateRule`)
//!
//! Uses a hash table keyed by the group-by expressions. Works with any input
//! ordering. When every group key is a plain column the input is hash-partitioned
//! on those columns, so each group is complete on one site and the aggregate runs
//! in a single phase. Otherwise (no keys, or computed keys) the input is gathered.

use planx_core::error::Result;
use planx_core::logical::{LogicalOp, LogicalOpKind, LogicalPlan};
use planx_core::pattern::Pattern;
use planx_core::physical::{PhysicalOp, PhysicalPlan, PlanRef};
use planx_core::rule::{unexpected_operand, ConverterRule};

/// Implement a logical aggregate as a hash aggregate. Always applicable.
pub struct ImplHashAggregateRule;

impl ConverterRule for ImplHashAggregateRule {
    fn name(&self) -> &str {
        "ImplHashAggregate"
    }

    fn pattern(&self) -> Pattern {
        Pattern::unary(LogicalOpKind::Aggregate)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Aggregate {
            group_by,
            aggregates,
        } = &node.op
        else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::HashAggregate {
                group_by: group_by.clone(),
                aggregates: aggregates.clone(),
            },
            self.output_traits(node),
            inputs,
        )
    }
}
