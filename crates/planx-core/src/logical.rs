//! # Logical Plans
//!
//! Logical operators describe *what* to compute. They are produced upstream
//! (parser, binder, rewrite passes) and are read-only here: lowering reads their
//! parameters and copies them verbatim into physical nodes.
//!
//! A `LogicalPlan` is a plain owned tree. Every logical node carries the
//! `Logical` convention and the `Any` distribution.

use crate::expr::{AggExpr, Expr, JoinType, SortKey, TableRef};
use crate::physical::Arity;
use crate::properties::TraitSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// Inline rows (`VALUES (...), (...)`). Leaf.
    Values { rows: Vec<Vec<Expr>> },
    /// Table scan. An empty `columns` list reads every column. Leaf.
    Scan {
        table: TableRef,
        columns: Vec<String>,
        predicate: Option<Expr>,
    },
    Filter { predicate: Expr },
    Project { exprs: Vec<Expr>, aliases: Vec<String> },
    Join { join_type: JoinType, condition: Expr },
    Aggregate {
        group_by: Vec<Expr>,
        aggregates: Vec<AggExpr>,
    },
    Sort { order: Vec<SortKey> },
    Limit { offset: u64, count: u64 },
    /// Insert the input rows into `table`. `column_list` is the explicit target
    /// column list of the statement, if one was written.
    Insert {
        table: TableRef,
        column_list: Option<Vec<String>>,
    },
    Delete { table: TableRef },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOpKind {
    Values,
    Scan,
    Filter,
    Project,
    Join,
    Aggregate,
    Sort,
    Limit,
    Insert,
    Delete,
}

impl fmt::Display for LogicalOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl LogicalOp {
    pub fn kind(&self) -> LogicalOpKind {
        match self {
            LogicalOp::Values { .. } => LogicalOpKind::Values,
            LogicalOp::Scan { .. } => LogicalOpKind::Scan,
            LogicalOp::Filter { .. } => LogicalOpKind::Filter,
            LogicalOp::Project { .. } => LogicalOpKind::Project,
            LogicalOp::Join { .. } => LogicalOpKind::Join,
            LogicalOp::Aggregate { .. } => LogicalOpKind::Aggregate,
            LogicalOp::Sort { .. } => LogicalOpKind::Sort,
            LogicalOp::Limit { .. } => LogicalOpKind::Limit,
            LogicalOp::Insert { .. } => LogicalOpKind::Insert,
            LogicalOp::Delete { .. } => LogicalOpKind::Delete,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            LogicalOp::Values { .. } | LogicalOp::Scan { .. } => Arity::Exactly(0),
            LogicalOp::Join { .. } => Arity::Exactly(2),
            _ => Arity::Exactly(1),
        }
    }
}

/// A logical operator with its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalPlan {
    pub op: LogicalOp,
    #[serde(default)]
    pub inputs: Vec<LogicalPlan>,
}

impl LogicalPlan {
    pub fn new(op: LogicalOp, inputs: Vec<LogicalPlan>) -> Self {
        Self { op, inputs }
    }

    pub fn leaf(op: LogicalOp) -> Self {
        Self::new(op, vec![])
    }

    pub fn unary(op: LogicalOp, input: LogicalPlan) -> Self {
        Self::new(op, vec![input])
    }

    pub fn kind(&self) -> LogicalOpKind {
        self.op.kind()
    }

    pub fn traits(&self) -> TraitSet {
        TraitSet::logical()
    }

    pub fn inputs(&self) -> &[LogicalPlan] {
        &self.inputs
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self.inputs.iter().map(|i| i.node_count()).sum::<usize>()
    }
}
