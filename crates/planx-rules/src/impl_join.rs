//! # Join Converter Rules
//!
//! Two physical joins implement a logical Join. Registration order puts the hash
//! join first, so with the default `FirstMatch` selector it wins whenever it is
//! applicable and the nested loop join acts as the fallback.
//!
//! ## Hash Join (`ImplHashJoinRule`)
//!
//! Builds a hash table on the right input and probes it with the left. Each
//! input is partitioned on its side of the equi conjuncts, so matching rows meet
//! on the same site (see `PhysicalOp::required_input_distribution`).
//!
//! **Requires**: at least one `col = col` conjunct in the condition.
//!
//! ## Nested Loop Join (`ImplNestedLoopJoinRule`)
//!
//! The universal fallback: every left row is compared with every right row, so
//! any condition works, including cross joins and pure range predicates. Both
//! inputs are gathered on one site.

use planx_core::error::Result;
use planx_core::logical::{LogicalOp, LogicalOpKind, LogicalPlan};
use planx_core::pattern::Pattern;
use planx_core::physical::{PhysicalOp, PhysicalPlan, PlanRef};
use planx_core::rule::{unexpected_operand, ConverterRule};

/// Implement a logical join as a hash join on its equi conjuncts.
pub struct ImplHashJoinRule;

impl ConverterRule for ImplHashJoinRule {
    fn name(&self) -> &str {
        "ImplHashJoin"
    }

    fn pattern(&self) -> Pattern {
        Pattern::binary(LogicalOpKind::Join)
    }

    fn accepts(&self, node: &LogicalPlan) -> bool {
        match &node.op {
            LogicalOp::Join { condition, .. } => !condition.equi_keys().is_empty(),
            _ => false,
        }
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Join {
            join_type,
            condition,
        } = &node.op
        else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::HashJoin {
                join_type: *join_type,
                condition: condition.clone(),
            },
            self.output_traits(node),
            inputs,
        )
    }
}

/// Implement a logical join as a nested loop join. Always applicable.
pub struct ImplNestedLoopJoinRule;

impl ConverterRule for ImplNestedLoopJoinRule {
    fn name(&self) -> &str {
        "ImplNestedLoopJoin"
    }

    fn pattern(&self) -> Pattern {
        Pattern::binary(LogicalOpKind::Join)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Join {
            join_type,
            condition,
        } = &node.op
        else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::NestedLoopJoin {
                join_type: *join_type,
                condition: condition.clone(),
            },
            self.output_traits(node),
            inputs,
        )
    }
}
