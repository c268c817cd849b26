//! # Sort and Limit Converter Rules
//!
//! Both operators are single-phase: a total order (or the first `count` rows of
//! one) is only defined over all rows at once, so their input is gathered on a
//! single site once the plan is distributed. A partial top-N below the gather is
//! left to a later optimization pass.

use planx_core::error::Result;
use planx_core::logical::{LogicalOp, LogicalOpKind, LogicalPlan};
use planx_core::pattern::Pattern;
use planx_core::physical::{PhysicalOp, PhysicalPlan, PlanRef};
use planx_core::rule::{unexpected_operand, ConverterRule};

/// Implement a logical sort as a physical sort.
pub struct ImplSortRule;

impl ConverterRule for ImplSortRule {
    fn name(&self) -> &str {
        "ImplSort"
    }

    fn pattern(&self) -> Pattern {
        Pattern::unary(LogicalOpKind::Sort)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Sort { order } = &node.op else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::Sort {
                order: order.clone(),
            },
            self.output_traits(node),
            inputs,
        )
    }
}

pub struct ImplLimitRule;

impl ConverterRule for ImplLimitRule {
    fn name(&self) -> &str {
        "ImplLimit"
    }

    fn pattern(&self) -> Pattern {
        Pattern::unary(LogicalOpKind::Limit)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Limit { offset, count } = &node.op else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::Limit {
                offset: *offset,
                count: *count,
            },
            self.output_traits(node),
            inputs,
        )
    }
}
