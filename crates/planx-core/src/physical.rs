//! # Physical Operator Model
//!
//! Physical operators describe *how* a computation executes. Each variant of
//! `PhysicalOp` has the same operator semantics as some logical operator (the
//! parameters are carried over verbatim by the converter rule), except `Exchange`,
//! the distribution enforcer, which only exists physically.
//!
//! ## The Node Contract
//!
//! A `PhysicalPlan` node is immutable and owns its inputs through `PlanRef`
//! (`Arc<PhysicalPlan>`) handles. Every operator kind honors the same contract:
//!
//! - `inputs()`: read-only, ordered view of the children.
//! - `copy(traits, inputs)`: a new node of the same kind and parameters with traits
//!   and inputs replaced. Checks the input count against the operator arity and
//!   never touches `self`. Unchanged subtrees are shared by cloning their `PlanRef`.
//! - `required_input_distribution(i)` / `output_distribution(..)`: what the operator
//!   demands of each input and what it produces, consumed by
//!   [`crate::distribution`].
//! - serialization, implemented per variant by the `planx-wire` crate.
//!
//! Dispatch is a `match` on the variant; there is no operator trait object.
//!
//! ## Distribution Requirements
//!
//! | operator       | required of inputs                          | output                  |
//! |----------------|---------------------------------------------|-------------------------|
//! | Values         | -                                           | Singleton               |
//! | SeqScan        | -                                           | Any                     |
//! | Filter         | Any                                         | input's                 |
//! | Project        | Any                                         | input's, keys remapped  |
//! | HashJoin       | hash on the equi keys of each side          | left input's            |
//! | NestedLoopJoin | Singleton, Singleton                        | Singleton               |
//! | HashAggregate  | hash on group keys (Singleton if none)      | hash on leading outputs |
//! | Sort, Limit    | Singleton                                   | Singleton               |
//! | Insert, Delete | Singleton                                   | Singleton               |
//! | Exchange       | Any                                         | its target distribution |

use crate::error::{PlanError, PlanPath, Result};
use crate::expr::{AggExpr, Expr, JoinType, SortKey, TableRef};
use crate::logical::LogicalOpKind;
use crate::properties::{Convention, Distribution, Trait, TraitSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;
use std::sync::Arc;

/// Shared handle to an immutable physical node.
pub type PlanRef = Arc<PhysicalPlan>;

/// Number of inputs an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Exactly(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Exactly(k) => *k == n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(k) => write!(f, "{k}"),
        }
    }
}

/// Operator kind of either plan layer, used to name nodes in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Logical(LogicalOpKind),
    Physical(PhysicalOpKind),
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpKind::Logical(k) => write!(f, "logical {k}"),
            OpKind::Physical(k) => write!(f, "physical {k}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalOp {
    Values {
        rows: Vec<Vec<Expr>>,
    },
    /// Sequential (full) table scan with an optional pushed-down predicate.
    SeqScan {
        table: TableRef,
        columns: Vec<String>,
        predicate: Option<Expr>,
    },
    Filter {
        predicate: Expr,
    },
    Project {
        exprs: Vec<Expr>,
        aliases: Vec<String>,
    },
    /// Hash join on the equi conjuncts of `condition`; the remaining conjuncts are
    /// evaluated on matching pairs.
    HashJoin {
        join_type: JoinType,
        condition: Expr,
    },
    /// Universal fallback join: works for any condition.
    NestedLoopJoin {
        join_type: JoinType,
        condition: Expr,
    },
    HashAggregate {
        group_by: Vec<Expr>,
        aggregates: Vec<AggExpr>,
    },
    Sort {
        order: Vec<SortKey>,
    },
    Limit {
        offset: u64,
        count: u64,
    },
    Insert {
        table: TableRef,
        column_list: Option<Vec<String>>,
    },
    Delete {
        table: TableRef,
    },
    /// Redistributes its input so the output has `distribution`.
    Exchange {
        distribution: Distribution,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicalOpKind {
    Values,
    SeqScan,
    Filter,
    Project,
    HashJoin,
    NestedLoopJoin,
    HashAggregate,
    Sort,
    Limit,
    Insert,
    Delete,
    Exchange,
}

impl fmt::Display for PhysicalOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl PhysicalOp {
    pub fn kind(&self) -> PhysicalOpKind {
        match self {
            PhysicalOp::Values { .. } => PhysicalOpKind::Values,
            PhysicalOp::SeqScan { .. } => PhysicalOpKind::SeqScan,
            PhysicalOp::Filter { .. } => PhysicalOpKind::Filter,
            PhysicalOp::Project { .. } => PhysicalOpKind::Project,
            PhysicalOp::HashJoin { .. } => PhysicalOpKind::HashJoin,
            PhysicalOp::NestedLoopJoin { .. } => PhysicalOpKind::NestedLoopJoin,
            PhysicalOp::HashAggregate { .. } => PhysicalOpKind::HashAggregate,
            PhysicalOp::Sort { .. } => PhysicalOpKind::Sort,
            PhysicalOp::Limit { .. } => PhysicalOpKind::Limit,
            PhysicalOp::Insert { .. } => PhysicalOpKind::Insert,
            PhysicalOp::Delete { .. } => PhysicalOpKind::Delete,
            PhysicalOp::Exchange { .. } => PhysicalOpKind::Exchange,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            PhysicalOp::Values { .. } | PhysicalOp::SeqScan { .. } => Arity::Exactly(0),
            PhysicalOp::HashJoin { .. } | PhysicalOp::NestedLoopJoin { .. } => Arity::Exactly(2),
            _ => Arity::Exactly(1),
        }
    }

    /// Distribution the operator requires of its `input`-th input.
    pub fn required_input_distribution(&self, input: usize) -> Distribution {
        match self {
            PhysicalOp::Values { .. } | PhysicalOp::SeqScan { .. } => Distribution::Any,
            PhysicalOp::Filter { .. } | PhysicalOp::Project { .. } | PhysicalOp::Exchange { .. } => {
                Distribution::Any
            }
            PhysicalOp::HashJoin { condition, .. } => {
                let keys = condition.equi_keys();
                if keys.is_empty() {
                    return Distribution::Singleton;
                }
                let side = keys
                    .iter()
                    .map(|(l, r)| if input == 0 { *l } else { *r })
                    .collect();
                Distribution::HashPartitioned(side)
            }
            PhysicalOp::NestedLoopJoin { .. } => Distribution::Singleton,
            PhysicalOp::HashAggregate { group_by, .. } => match group_key_columns(group_by) {
                Some(keys) => Distribution::HashPartitioned(keys),
                None => Distribution::Singleton,
            },
            PhysicalOp::Sort { .. } | PhysicalOp::Limit { .. } => Distribution::Singleton,
            // All rows are funneled to one site before the target is mutated.
            PhysicalOp::Insert { .. } | PhysicalOp::Delete { .. } => Distribution::Singleton,
        }
    }

    /// Distribution of the operator's output given the distributions of its inputs.
    pub fn output_distribution(&self, inputs: &[Distribution]) -> Distribution {
        let first = || inputs.first().cloned().unwrap_or(Distribution::Any);
        match self {
            PhysicalOp::Values { .. } => Distribution::Singleton,
            PhysicalOp::SeqScan { .. } => Distribution::Any,
            PhysicalOp::Filter { .. } => first(),
            PhysicalOp::Project { exprs, .. } => match first() {
                Distribution::HashPartitioned(keys) => remap_hash_keys(&keys, exprs),
                other => other,
            },
            // Null-padded left sides sit where their right key hashed to, not where
            // the left key would.
            PhysicalOp::HashJoin { join_type, .. } => match join_type {
                JoinType::Inner | JoinType::Left | JoinType::Semi | JoinType::Anti => first(),
                JoinType::Right | JoinType::Full | JoinType::Cross => Distribution::Any,
            },
            PhysicalOp::NestedLoopJoin { .. } => Distribution::Singleton,
            PhysicalOp::HashAggregate { group_by, .. } => match group_key_columns(group_by) {
                Some(keys) => Distribution::HashPartitioned((0..keys.len() as u32).collect()),
                None => Distribution::Singleton,
            },
            PhysicalOp::Sort { .. } | PhysicalOp::Limit { .. } => Distribution::Singleton,
            PhysicalOp::Insert { .. } | PhysicalOp::Delete { .. } => Distribution::Singleton,
            PhysicalOp::Exchange { distribution } => distribution.clone(),
        }
    }

    fn describe(&self) -> String {
        match self {
            PhysicalOp::Values { rows } => format!("Values {{ rows: {} }}", rows.len()),
            PhysicalOp::SeqScan {
                table,
                columns,
                predicate,
            } => {
                let mut s = format!("SeqScan {{ table: {table}");
                if !columns.is_empty() {
                    let _ = write!(s, ", columns: [{}]", columns.join(", "));
                }
                if let Some(p) = predicate {
                    let _ = write!(s, ", predicate: {p}");
                }
                s.push_str(" }");
                s
            }
            PhysicalOp::Filter { predicate } => format!("Filter {{ predicate: {predicate} }}"),
            PhysicalOp::Project { exprs, .. } => format!("Project {{ exprs: [{}] }}", join(exprs)),
            PhysicalOp::HashJoin {
                join_type,
                condition,
            } => format!("HashJoin {{ type: {join_type:?}, condition: {condition} }}"),
            PhysicalOp::NestedLoopJoin {
                join_type,
                condition,
            } => format!("NestedLoopJoin {{ type: {join_type:?}, condition: {condition} }}"),
            PhysicalOp::HashAggregate {
                group_by,
                aggregates,
            } => format!(
                "HashAggregate {{ group_by: [{}], aggs: [{}] }}",
                join(group_by),
                join(aggregates)
            ),
            PhysicalOp::Sort { order } => format!("Sort {{ order: [{}] }}", join(order)),
            PhysicalOp::Limit { offset, count } => {
                format!("Limit {{ offset: {offset}, count: {count} }}")
            }
            PhysicalOp::Insert { table, column_list } => match column_list {
                Some(cols) => format!("Insert {{ table: {table}, columns: [{}] }}", cols.join(", ")),
                None => format!("Insert {{ table: {table} }}"),
            },
            PhysicalOp::Delete { table } => format!("Delete {{ table: {table} }}"),
            PhysicalOp::Exchange { distribution } => format!("Exchange {{ dist: {distribution} }}"),
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Input positions of the group keys, if every key is a plain column reference.
fn group_key_columns(group_by: &[Expr]) -> Option<Vec<u32>> {
    if group_by.is_empty() {
        return None;
    }
    group_by
        .iter()
        .map(|e| match e {
            Expr::Column(c) => Some(c.index),
            _ => None,
        })
        .collect()
}

/// Follow hash keys through a projection. A key survives if some output expression
/// passes the input column through unchanged; otherwise the placement is unknown.
fn remap_hash_keys(keys: &[u32], exprs: &[Expr]) -> Distribution {
    let mapped: Option<Vec<u32>> = keys
        .iter()
        .map(|k| {
            exprs
                .iter()
                .position(|e| matches!(e, Expr::Column(c) if c.index == *k))
                .map(|p| p as u32)
        })
        .collect();
    match mapped {
        Some(keys) => Distribution::HashPartitioned(keys),
        None => Distribution::Any,
    }
}

/// A physical operator with its traits and inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhysicalPlan {
    op: PhysicalOp,
    traits: TraitSet,
    inputs: Vec<PlanRef>,
}

impl PhysicalPlan {
    /// Build a node, checking the input count and that the traits are physical.
    pub fn new(op: PhysicalOp, traits: TraitSet, inputs: Vec<PlanRef>) -> Result<Self> {
        let kind = OpKind::Physical(op.kind());
        let arity = op.arity();
        if !arity.accepts(inputs.len()) {
            return Err(PlanError::ArityMismatch {
                kind,
                expected: arity,
                actual: inputs.len(),
                path: PlanPath::root(),
            });
        }
        if !traits.convention.is_physical() {
            return Err(PlanError::InvalidConvention {
                kind,
                convention: traits.convention,
                path: PlanPath::root(),
            });
        }
        Ok(Self { op, traits, inputs })
    }

    pub fn op(&self) -> &PhysicalOp {
        &self.op
    }

    pub fn kind(&self) -> PhysicalOpKind {
        self.op.kind()
    }

    pub fn traits(&self) -> &TraitSet {
        &self.traits
    }

    pub fn convention(&self) -> Convention {
        self.traits.convention
    }

    pub fn distribution(&self) -> &Distribution {
        &self.traits.distribution
    }

    pub fn inputs(&self) -> &[PlanRef] {
        &self.inputs
    }

    /// Same operator and parameters, new traits and inputs.
    pub fn copy(&self, traits: TraitSet, inputs: Vec<PlanRef>) -> Result<PhysicalPlan> {
        PhysicalPlan::new(self.op.clone(), traits, inputs)
    }

    pub fn into_ref(self) -> PlanRef {
        Arc::new(self)
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        1 + self.inputs.iter().map(|i| i.node_count()).sum::<usize>()
    }

    /// Operator kinds in pre-order.
    pub fn kinds_pre_order(&self) -> Vec<PhysicalOpKind> {
        let mut out = Vec::with_capacity(self.node_count());
        self.collect_kinds(&mut out);
        out
    }

    fn collect_kinds(&self, out: &mut Vec<PhysicalOpKind>) {
        out.push(self.kind());
        for input in &self.inputs {
            input.collect_kinds(out);
        }
    }

    /// Render the tree one node per line, inputs indented below their parent.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.explain_into(&mut out, 0);
        out
    }

    fn explain_into(&self, out: &mut String, indent: usize) {
        let _ = writeln!(
            out,
            "{}{} {}",
            "  ".repeat(indent),
            self.op.describe(),
            self.traits
        );
        for input in &self.inputs {
            input.explain_into(out, indent + 1);
        }
    }
}

impl fmt::Display for PhysicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.explain())
    }
}

/// Return a node equal to `plan` except for the trait of `t`'s family.
pub fn replace_trait(plan: &PlanRef, t: Trait) -> Result<PlanRef> {
    let traits = plan.traits().replace(t);
    if &traits == plan.traits() {
        return Ok(plan.clone());
    }
    Ok(plan.copy(traits, plan.inputs().to_vec())?.into_ref())
}
