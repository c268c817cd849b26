//! # Data Modification Converter Rules
//!
//! ## Insert (`ImplInsertRule`)
//!
//! Matches a logical Insert with any input and produces a physical Insert with the
//! same target table and the same explicit column list (or none). Catalog ids are
//! not resolved here; that happens once, when the plan is serialized.
//!
//! Once distributed, both Insert and Delete gather all rows on a single site
//! before touching the target table.
//!
//! ## Delete (`ImplDeleteRule`)
//!
//! Same shape as Insert: target table carried over, input is the rows to remove.

use planx_core::error::Result;
use planx_core::logical::{LogicalOp, LogicalOpKind, LogicalPlan};
use planx_core::pattern::Pattern;
use planx_core::physical::{PhysicalOp, PhysicalPlan, PlanRef};
use planx_core::rule::{unexpected_operand, ConverterRule};

pub struct ImplInsertRule;

impl ConverterRule for ImplInsertRule {
    fn name(&self) -> &str {
        "ImplInsert"
    }

    fn pattern(&self) -> Pattern {
        Pattern::operand(LogicalOpKind::Insert)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Insert { table, column_list } = &node.op else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::Insert {
                table: table.clone(),
                column_list: column_list.clone(),
            },
            self.output_traits(node),
            inputs,
        )
    }
}

pub struct ImplDeleteRule;

impl ConverterRule for ImplDeleteRule {
    fn name(&self) -> &str {
        "ImplDelete"
    }

    fn pattern(&self) -> Pattern {
        Pattern::operand(LogicalOpKind::Delete)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Delete { table } = &node.op else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::Delete {
                table: table.clone(),
            },
            self.output_traits(node),
            inputs,
        )
    }
}
