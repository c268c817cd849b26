//! # Leaf Converter Rules
//!
//! Leaves have no inputs, so these rules never trigger input enforcement.
//!
//! ## Sequential Scan (`ImplSeqScanRule`)
//!
//! A logical Scan becomes a SeqScan reading the table in full and evaluating any
//! pushed-down predicate. The scan makes no promise about which site produces
//! which rows, so its output distribution is `Any` once distributed.
//!
//! ## Values (`ImplValuesRule`)
//!
//! Inline rows. They are materialized by the planner itself and therefore always
//! live on a single site.

use planx_core::error::Result;
use planx_core::logical::{LogicalOp, LogicalOpKind, LogicalPlan};
use planx_core::pattern::Pattern;
use planx_core::physical::{PhysicalOp, PhysicalPlan, PlanRef};
use planx_core::rule::{unexpected_operand, ConverterRule};

/// Implement a logical scan as a sequential (full) table scan.
///
/// Table, columns and predicate are carried over unchanged.
pub struct ImplSeqScanRule;

impl ConverterRule for ImplSeqScanRule {
    fn name(&self) -> &str {
        "ImplSeqScan"
    }

    fn pattern(&self) -> Pattern {
        Pattern::leaf(LogicalOpKind::Scan)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Scan {
            table,
            columns,
            predicate,
        } = &node.op
        else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::SeqScan {
                table: table.clone(),
                columns: columns.clone(),
                predicate: predicate.clone(),
            },
            self.output_traits(node),
            inputs,
        )
    }
}

pub struct ImplValuesRule;

impl ConverterRule for ImplValuesRule {
    fn name(&self) -> &str {
        "ImplValues"
    }

    fn pattern(&self) -> Pattern {
        Pattern::leaf(LogicalOpKind::Values)
    }

    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        let LogicalOp::Values { rows } = &node.op else {
            return Err(unexpected_operand(node));
        };

        PhysicalPlan::new(
            PhysicalOp::Values { rows: rows.clone() },
            self.output_traits(node),
            inputs,
        )
    }
}
