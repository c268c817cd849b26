//! # Plan Serializer
//!
//! Turns a physical plan tree into the wire representation a remote worker
//! executes. The tree is only read; the output shares nothing with it.
//!
//! ## Conversion Strategy
//!
//! The serializer walks the plan recursively. For every node it:
//!
//! 1. Resolves the catalog ids the operator needs (target table, column lists).
//! 2. Builds the operator payload from resolved ids and primitive parameters only.
//! 3. Serializes each input, in order.
//! 4. Emits `PlanNode { node_type, body, children }`.
//!
//! `Exchange` nodes are serialized like any other operator: they mark where a
//! worker has to redistribute rows.
//!
//! ## Catalog Resolution
//!
//! Each table is looked up once per pass and the descriptor reused, so every node
//! referencing the same table sees the same ids. Names that do not resolve fail the
//! whole pass with `UnknownTable` / `UnknownColumn` carrying the node's path;
//! no column is ever dropped silently.
//!
//! An Insert ships two column lists that are never conflated: `column_ids` holds
//! every column of the table in table order (the layout the writer produces) and
//! `bound_column_ids` the explicit target list of the statement, if any.
//!
//! ## Expression Conversion
//!
//! - Column references -> input positions
//! - Literals -> `Datum`
//! - Operators and named functions -> `FunctionCall` with a `FuncType` tag
//! - AND / OR conjunctions -> n-ary `FunctionCall`

use crate::body::{plan_node, NodeBody};
use crate::proto;
use planx_core::catalog::{Catalog, ColumnId, TableDescriptor, TableId};
use planx_core::error::{PlanPath, Result};
use planx_core::expr::*;
use planx_core::physical::{PhysicalOp, PhysicalPlan};
use planx_core::properties::Distribution;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, trace};

/// Version of the wire schema written into every `PlanFragment`.
pub const WIRE_PLAN_VERSION: u32 = 1;

/// Catalog ids resolved during one serialization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIds {
    pub tables: BTreeMap<TableRef, TableId>,
    /// Every column id written into a payload, per table.
    pub columns: BTreeMap<TableId, BTreeSet<ColumnId>>,
}

/// Result of serializing a plan tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedPlan {
    pub root: proto::PlanNode,
    pub resolved: ResolvedIds,
}

/// Serialize a physical plan tree.
pub fn serialize(plan: &PhysicalPlan, catalog: &dyn Catalog) -> Result<SerializedPlan> {
    let mut serializer = PlanSerializer::new(catalog);
    let root = serializer.serialize_node(plan, &PlanPath::root())?;
    debug!(
        "Serialized plan: nodes={}, tables={}",
        plan.node_count(),
        serializer.resolved.tables.len()
    );
    Ok(SerializedPlan {
        root,
        resolved: serializer.resolved,
    })
}

/// Serialize a physical plan tree into a versioned fragment.
pub fn produce_plan(
    plan: &PhysicalPlan,
    catalog: &dyn Catalog,
) -> Result<(proto::PlanFragment, ResolvedIds)> {
    let SerializedPlan { root, resolved } = serialize(plan, catalog)?;
    let fragment = proto::PlanFragment {
        version: WIRE_PLAN_VERSION,
        root: Some(root),
    };
    Ok((fragment, resolved))
}

/// Per-pass serialization state: the table cache and the ids resolved so far.
struct PlanSerializer<'a> {
    catalog: &'a dyn Catalog,
    tables: HashMap<TableRef, TableDescriptor>,
    resolved: ResolvedIds,
}

impl<'a> PlanSerializer<'a> {
    fn new(catalog: &'a dyn Catalog) -> Self {
        Self {
            catalog,
            tables: HashMap::new(),
            resolved: ResolvedIds::default(),
        }
    }

    fn serialize_node(&mut self, node: &PhysicalPlan, path: &PlanPath) -> Result<proto::PlanNode> {
        trace!("Serializing {} at {}", node.kind(), path);

        // Resolve first: a failing lookup must not leave serialized children behind.
        let body = self.build_body(node.op(), path)?;
        let children = node
            .inputs()
            .iter()
            .enumerate()
            .map(|(i, input)| self.serialize_node(input, &path.child(i)))
            .collect::<Result<Vec<_>>>()?;
        Ok(body.into_node(children))
    }

    fn build_body(&mut self, op: &PhysicalOp, path: &PlanPath) -> Result<Body> {
        let body = match op {
            PhysicalOp::Insert { table, column_list } => {
                let desc = self.resolve_table(table, path)?;
                let bound_column_ids = match column_list {
                    Some(names) => self.resolve_columns(&desc, names, path)?,
                    None => vec![],
                };
                Body::Insert(proto::InsertNode {
                    table_id: desc.id.0,
                    column_ids: self.all_columns(&desc),
                    bound_column_ids,
                })
            }
            PhysicalOp::Delete { table } => {
                let desc = self.resolve_table(table, path)?;
                Body::Delete(proto::DeleteNode {
                    table_id: desc.id.0,
                })
            }
            PhysicalOp::SeqScan {
                table,
                columns,
                predicate,
            } => {
                let desc = self.resolve_table(table, path)?;
                let column_ids = if columns.is_empty() {
                    self.all_columns(&desc)
                } else {
                    self.resolve_columns(&desc, columns, path)?
                };
                Body::SeqScan(proto::SeqScanNode {
                    table_id: desc.id.0,
                    column_ids,
                    filter: predicate.as_ref().map(produce_expression),
                })
            }
            PhysicalOp::Values { rows } => Body::Values(proto::ValuesNode {
                rows: rows
                    .iter()
                    .map(|row| proto::ValuesRow {
                        cells: row.iter().map(produce_expression).collect(),
                    })
                    .collect(),
            }),
            PhysicalOp::Filter { predicate } => Body::Filter(proto::FilterNode {
                condition: Some(produce_expression(predicate)),
            }),
            PhysicalOp::Project { exprs, aliases } => Body::Project(proto::ProjectNode {
                select_list: exprs.iter().map(produce_expression).collect(),
                names: aliases.clone(),
            }),
            PhysicalOp::HashJoin {
                join_type,
                condition,
            } => {
                let (left_keys, right_keys): (Vec<u32>, Vec<u32>) = condition.equi_keys().into_iter().unzip();
                Body::HashJoin(proto::HashJoinNode {
                    join_type: convert_join_type(join_type) as i32,
                    left_keys,
                    right_keys,
                    condition: Some(produce_expression(condition)),
                })
            }
            PhysicalOp::NestedLoopJoin {
                join_type,
                condition,
            } => Body::NestedLoopJoin(proto::NestedLoopJoinNode {
                join_type: convert_join_type(join_type) as i32,
                condition: Some(produce_expression(condition)),
            }),
            PhysicalOp::HashAggregate {
                group_by,
                aggregates,
            } => Body::HashAgg(proto::HashAggNode {
                group_keys: group_by.iter().map(produce_expression).collect(),
                agg_calls: aggregates
                    .iter()
                    .map(|agg| proto::AggCall {
                        kind: convert_agg_func(&agg.func) as i32,
                        arg: Some(produce_expression(&agg.arg)),
                        distinct: agg.distinct,
                    })
                    .collect(),
            }),
            PhysicalOp::Sort { order } => Body::Sort(proto::SortNode {
                column_orders: order.iter().map(produce_column_order).collect(),
            }),
            PhysicalOp::Limit { offset, count } => Body::Limit(proto::LimitNode {
                limit: *count,
                offset: *offset,
            }),
            PhysicalOp::Exchange { distribution } => Body::Exchange(proto::ExchangeNode {
                distribution: Some(produce_distribution(distribution)),
            }),
        };
        Ok(body)
    }

    /// Look a table up once per pass and record its id.
    fn resolve_table(&mut self, table: &TableRef, path: &PlanPath) -> Result<TableDescriptor> {
        if let Some(desc) = self.tables.get(table) {
            return Ok(desc.clone());
        }
        let desc = self
            .catalog
            .get_table_checked(table)
            .map_err(|e| e.at(path))?;
        self.resolved.tables.insert(table.clone(), desc.id);
        self.tables.insert(table.clone(), desc.clone());
        Ok(desc)
    }

    /// Resolve column names in the given order.
    fn resolve_columns(
        &mut self,
        desc: &TableDescriptor,
        names: &[String],
        path: &PlanPath,
    ) -> Result<Vec<u32>> {
        let ids = names
            .iter()
            .map(|name| {
                desc.get_column_checked(name)
                    .map(|c| c.id)
                    .map_err(|e| e.at(path))
            })
            .collect::<Result<Vec<ColumnId>>>()?;
        Ok(self.record_columns(desc, ids))
    }

    /// Every column of the table, in table order.
    fn all_columns(&mut self, desc: &TableDescriptor) -> Vec<u32> {
        self.record_columns(desc, desc.column_ids())
    }

    fn record_columns(&mut self, desc: &TableDescriptor, ids: Vec<ColumnId>) -> Vec<u32> {
        self.resolved
            .columns
            .entry(desc.id)
            .or_default()
            .extend(ids.iter().copied());
        ids.into_iter().map(|c| c.0).collect()
    }
}

/// A built payload, not yet attached to its children.
enum Body {
    Insert(proto::InsertNode),
    Delete(proto::DeleteNode),
    SeqScan(proto::SeqScanNode),
    Values(proto::ValuesNode),
    Filter(proto::FilterNode),
    Project(proto::ProjectNode),
    HashJoin(proto::HashJoinNode),
    NestedLoopJoin(proto::NestedLoopJoinNode),
    HashAgg(proto::HashAggNode),
    Sort(proto::SortNode),
    Limit(proto::LimitNode),
    Exchange(proto::ExchangeNode),
}

impl Body {
    fn into_node(self, children: Vec<proto::PlanNode>) -> proto::PlanNode {
        fn node<M: NodeBody>(m: M, children: Vec<proto::PlanNode>) -> proto::PlanNode {
            plan_node(&m, children)
        }
        match self {
            Body::Insert(m) => node(m, children),
            Body::Delete(m) => node(m, children),
            Body::SeqScan(m) => node(m, children),
            Body::Values(m) => node(m, children),
            Body::Filter(m) => node(m, children),
            Body::Project(m) => node(m, children),
            Body::HashJoin(m) => node(m, children),
            Body::NestedLoopJoin(m) => node(m, children),
            Body::HashAgg(m) => node(m, children),
            Body::Sort(m) => node(m, children),
            Body::Limit(m) => node(m, children),
            Body::Exchange(m) => node(m, children),
        }
    }
}

/// Convert an internal expression to its wire form.
pub fn produce_expression(expr: &Expr) -> proto::ExprNode {
    use proto::expr_node::Kind;

    let kind = match expr {
        Expr::Column(col) => Kind::InputRef(col.index),
        Expr::Literal(scalar) => Kind::Literal(produce_datum(scalar)),
        Expr::BinaryOp { op, left, right } => {
            let func_type = match op {
                BinaryOp::Eq => proto::FuncType::Equal,
                BinaryOp::NotEq => proto::FuncType::NotEqual,
                BinaryOp::Lt => proto::FuncType::LessThan,
                BinaryOp::LtEq => proto::FuncType::LessThanOrEqual,
                BinaryOp::Gt => proto::FuncType::GreaterThan,
                BinaryOp::GtEq => proto::FuncType::GreaterThanOrEqual,
                BinaryOp::Add => proto::FuncType::Add,
                BinaryOp::Sub => proto::FuncType::Subtract,
                BinaryOp::Mul => proto::FuncType::Multiply,
                BinaryOp::Div => proto::FuncType::Divide,
            };
            call(func_type, String::new(), [left.as_ref(), right.as_ref()])
        }
        Expr::UnaryOp { op, operand } => {
            let func_type = match op {
                UnaryOp::Not => proto::FuncType::Not,
                UnaryOp::Neg => proto::FuncType::Neg,
                UnaryOp::IsNull => proto::FuncType::IsNull,
                UnaryOp::IsNotNull => proto::FuncType::IsNotNull,
            };
            call(func_type, String::new(), [operand.as_ref()])
        }
        Expr::Function { name, args } => call(proto::FuncType::Named, name.clone(), args),
        Expr::And(conjuncts) => call(proto::FuncType::And, String::new(), conjuncts),
        Expr::Or(disjuncts) => call(proto::FuncType::Or, String::new(), disjuncts),
    };
    proto::ExprNode { kind: Some(kind) }
}

fn call<'e>(
    func_type: proto::FuncType,
    name: String,
    args: impl IntoIterator<Item = &'e Expr>,
) -> proto::expr_node::Kind {
    proto::expr_node::Kind::Call(proto::FunctionCall {
        func_type: func_type as i32,
        name,
        args: args.into_iter().map(produce_expression).collect(),
    })
}

fn produce_datum(scalar: &ScalarValue) -> proto::Datum {
    use proto::datum::Value;

    let value = match scalar {
        ScalarValue::Null => None,
        ScalarValue::Bool(v) => Some(Value::Bool(*v)),
        ScalarValue::Int64(v) => Some(Value::Int64(*v)),
        ScalarValue::Float64(v) => Some(Value::Float64(v.into_inner())),
        ScalarValue::Utf8(v) => Some(Value::Utf8(v.clone())),
        ScalarValue::Date(v) => Some(Value::Date(*v)),
    };
    proto::Datum { value }
}

fn produce_column_order(key: &SortKey) -> proto::ColumnOrder {
    proto::ColumnOrder {
        expr: Some(produce_expression(&key.expr)),
        ascending: key.ascending,
        nulls_first: key.nulls_first,
    }
}

fn produce_distribution(dist: &Distribution) -> proto::DistributionProto {
    let (kind, keys) = match dist {
        Distribution::Any => (proto::DistributionKind::Any, vec![]),
        Distribution::Singleton => (proto::DistributionKind::Singleton, vec![]),
        Distribution::HashPartitioned(keys) => {
            (proto::DistributionKind::HashPartitioned, keys.clone())
        }
        Distribution::Broadcast => (proto::DistributionKind::Broadcast, vec![]),
    };
    proto::DistributionProto {
        kind: kind as i32,
        keys,
    }
}

fn convert_join_type(jt: &JoinType) -> proto::JoinType {
    match jt {
        JoinType::Inner => proto::JoinType::Inner,
        JoinType::Left => proto::JoinType::Left,
        JoinType::Right => proto::JoinType::Right,
        JoinType::Full => proto::JoinType::Full,
        JoinType::Semi => proto::JoinType::Semi,
        JoinType::Anti => proto::JoinType::Anti,
        JoinType::Cross => proto::JoinType::Cross,
    }
}

fn convert_agg_func(func: &AggFunc) -> proto::AggKind {
    match func {
        AggFunc::Count => proto::AggKind::Count,
        AggFunc::Sum => proto::AggKind::Sum,
        AggFunc::Avg => proto::AggKind::Avg,
        AggFunc::Min => proto::AggKind::Min,
        AggFunc::Max => proto::AggKind::Max,
    }
}
