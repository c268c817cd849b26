//! # Filter and Project Converter Rules
//!
//! Row-at-a-time operators: each row is handled independently, so they run
//! wherever their input lives and impose no distribution requirement.

use planx_core::error::Result;
use planx_core::logical::{LogicalOp, LogicalOpKind, LogicalPlan};
use planx_core::pattern::Pattern;
use planx_core::physical::{PhysicalOp, PhysicalPlan, PlanRef};
use planx_core::rule::{unexpected_operand, ConverterRule};

pub struct ImplFilterRule;

impl ConverterRule for ImplFilterRule {
    fn name(&self) -> &str {
        "ImplFilter"
    }

    fn pattern(&self) -> Pattern {
        Pattern::unary(LogicalOpKind::Filter)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Filter { predicate } = &node.op else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::Filter {
                predicate: predicate.clone(),
            },
            self.output_traits(node),
            inputs,
        )
    }
}

pub struct ImplProjectRule;

impl ConverterRule for ImplProjectRule {
    fn name(&self) -> &str {
        "ImplProject"
    }

    fn pattern(&self) -> Pattern {
        Pattern::unary(LogicalOpKind::Project)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Project { exprs, aliases } = &node.op else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::Project {
                exprs: exprs.clone(),
                aliases: aliases.clone(),
            },
            self.output_traits(node),
            inputs,
        )
    }
}
