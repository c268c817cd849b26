//! End-to-end serialization tests: lower a logical plan with the built-in rules,
//! distribute it, serialize it, push the bytes through protobuf and decode them
//! the way a worker would.

use planx_core::catalog::{ColumnDescriptor, ColumnId, InMemoryCatalog, TableDescriptor, TableId};
use planx_core::distribution::to_distributed;
use planx_core::error::{PlanError, PlanPath};
use planx_core::expr::*;
use planx_core::logical::{LogicalOp, LogicalPlan};
use planx_core::lower::Lowerer;
use planx_core::physical::{PhysicalPlan, PlanRef};
use planx_rules::default_rule_registry;
use planx_wire::consumer::{consume_expression, decode_fragment, node_types_pre_order, unpack_body};
use planx_wire::proto::{self, PlanNodeType};
use planx_wire::{produce_plan, serialize, WIRE_PLAN_VERSION};
use prost::Message;
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::from_iter([
        TableDescriptor::new(
            7,
            TableRef::new("public", "t"),
            vec![
                ColumnDescriptor::new(1, "a"),
                ColumnDescriptor::new(2, "b"),
                ColumnDescriptor::new(3, "c"),
            ],
        ),
        TableDescriptor::new(
            8,
            TableRef::new("public", "s"),
            vec![ColumnDescriptor::new(10, "x"), ColumnDescriptor::new(11, "y")],
        ),
    ])
}

fn insert_values(column_list: Option<Vec<&str>>) -> LogicalPlan {
    LogicalPlan::unary(
        LogicalOp::Insert {
            table: TableRef::new("public", "t"),
            column_list: column_list.map(|cols| cols.into_iter().map(String::from).collect()),
        },
        LogicalPlan::leaf(LogicalOp::Values {
            rows: vec![vec![
                Expr::literal(ScalarValue::Int64(1)),
                Expr::literal(ScalarValue::Int64(2)),
                Expr::literal(ScalarValue::Int64(3)),
            ]],
        }),
    )
}

fn scan(name: &str, columns: Vec<&str>) -> LogicalPlan {
    LogicalPlan::leaf(LogicalOp::Scan {
        table: TableRef::new("public", name),
        columns: columns.into_iter().map(String::from).collect(),
        predicate: None,
    })
}

fn physical(plan: &LogicalPlan) -> PlanRef {
    let registry = default_rule_registry().unwrap();
    let lowered = Lowerer::new(&registry).lower(plan).unwrap();
    to_distributed(&lowered).unwrap()
}

fn insert_body(plan: &PhysicalPlan) -> proto::InsertNode {
    let serialized = serialize(plan, &catalog()).unwrap();
    assert_eq!(serialized.root.node_type(), PlanNodeType::Insert);
    unpack_body(&serialized.root).unwrap()
}

/// Node types and child counts must mirror the physical tree.
fn assert_same_shape(plan: &PhysicalPlan, node: &proto::PlanNode) {
    assert_eq!(
        plan.inputs().len(),
        node.children.len(),
        "child count differs for {}",
        plan.kind()
    );
    for (input, child) in plan.inputs().iter().zip(&node.children) {
        assert_same_shape(input, child);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_insert_scenario() {
    let plan = physical(&insert_values(None));
    let (fragment, resolved) = produce_plan(&plan, &catalog()).unwrap();

    let bytes = fragment.encode_to_vec();
    let decoded = decode_fragment(&bytes).unwrap();
    assert_eq!(decoded.version, WIRE_PLAN_VERSION);
    let root = decoded.root.unwrap();

    assert_eq!(
        node_types_pre_order(&root),
        vec![PlanNodeType::Insert, PlanNodeType::Values]
    );
    let insert: proto::InsertNode = unpack_body(&root).unwrap();
    assert_eq!(insert.table_id, 7);
    assert_eq!(insert.column_ids, vec![1, 2, 3]);
    assert!(insert.bound_column_ids.is_empty());

    let values: proto::ValuesNode = unpack_body(&root.children[0]).unwrap();
    assert_eq!(values.rows.len(), 1);
    assert_eq!(values.rows[0].cells.len(), 3);

    assert_eq!(resolved.tables.get(&TableRef::new("public", "t")), Some(&TableId(7)));
    assert_eq!(
        resolved.columns,
        BTreeMap::from([(TableId(7), BTreeSet::from([ColumnId(1), ColumnId(2), ColumnId(3)]))]),
        "every column id written into the insert payload is reported"
    );
}

#[test]
fn test_insert_column_lists_are_not_conflated() {
    let plan = physical(&insert_values(Some(vec!["c", "a"])));
    let insert = insert_body(&plan);
    assert_eq!(insert.column_ids, vec![1, 2, 3], "all columns, table order");
    assert_eq!(insert.bound_column_ids, vec![3, 1], "explicit list, statement order");
}

#[test]
fn test_unknown_column_reports_node() {
    let plan = physical(&insert_values(Some(vec!["c", "z"])));
    let err = serialize(&plan, &catalog()).unwrap_err();
    assert_eq!(
        err,
        PlanError::UnknownColumn {
            table: "public.t".into(),
            column: "z".into(),
            path: PlanPath::root(),
        }
    );

    // Same failure on a scan nested under an insert and an exchange.
    let nested = LogicalPlan::unary(
        LogicalOp::Insert {
            table: TableRef::new("public", "t"),
            column_list: None,
        },
        scan("s", vec!["x", "z"]),
    );
    let err = serialize(&physical(&nested), &catalog()).unwrap_err();
    assert!(
        matches!(err, PlanError::UnknownColumn { ref column, ref path, .. }
            if column == "z" && path == &PlanPath::root().child(0).child(0)),
        "unexpected error: {err}"
    );
}

#[test]
fn test_join_plan_shape_and_payloads() {
    let join = LogicalPlan::new(
        LogicalOp::Join {
            join_type: JoinType::Inner,
            condition: Expr::binary(BinaryOp::Eq, Expr::column("a", 0), Expr::column("y", 0)),
        },
        vec![scan("t", vec![]), scan("s", vec!["y", "x"])],
    );
    let logical = LogicalPlan::unary(
        LogicalOp::Limit {
            offset: 2,
            count: 5,
        },
        join,
    );
    let plan = physical(&logical);
    let serialized = serialize(&plan, &catalog()).unwrap();
    let root = &serialized.root;

    assert_same_shape(&plan, root);
    assert_eq!(
        node_types_pre_order(root),
        vec![
            PlanNodeType::Limit,
            PlanNodeType::Exchange,
            PlanNodeType::HashJoin,
            PlanNodeType::Exchange,
            PlanNodeType::SeqScan,
            PlanNodeType::Exchange,
            PlanNodeType::SeqScan,
        ]
    );

    let limit: proto::LimitNode = unpack_body(root).unwrap();
    assert_eq!((limit.limit, limit.offset), (5, 2));

    let gather: proto::ExchangeNode = unpack_body(&root.children[0]).unwrap();
    let dist = gather.distribution.unwrap();
    assert_eq!(dist.kind(), proto::DistributionKind::Singleton);

    let hash_join = &root.children[0].children[0];
    let body: proto::HashJoinNode = unpack_body(hash_join).unwrap();
    assert_eq!(body.join_type(), proto::JoinType::Inner);
    assert_eq!((body.left_keys, body.right_keys), (vec![0], vec![0]));
    let condition = consume_expression(body.condition.as_ref().unwrap()).unwrap();
    assert_eq!(
        condition,
        Expr::binary(BinaryOp::Eq, Expr::column("col_0", 0), Expr::column("col_0", 0))
    );

    let right_exchange: proto::ExchangeNode = unpack_body(&hash_join.children[1]).unwrap();
    let dist = right_exchange.distribution.unwrap();
    assert_eq!(dist.kind(), proto::DistributionKind::HashPartitioned);
    assert_eq!(dist.keys, vec![0]);

    let left_scan: proto::SeqScanNode = unpack_body(&hash_join.children[0].children[0]).unwrap();
    assert_eq!((left_scan.table_id, left_scan.column_ids), (7, vec![1, 2, 3]));
    let right_scan: proto::SeqScanNode =
        unpack_body(&hash_join.children[1].children[0]).unwrap();
    assert_eq!((right_scan.table_id, right_scan.column_ids), (8, vec![11, 10]));

    assert_eq!(serialized.resolved.tables.len(), 2);
    assert_eq!(
        serialized.resolved.columns.get(&TableId(7)),
        Some(&BTreeSet::from([ColumnId(1), ColumnId(2), ColumnId(3)])),
        "a scan without a column list reads, and reports, every column"
    );
    assert_eq!(
        serialized.resolved.columns.get(&TableId(8)),
        Some(&BTreeSet::from([ColumnId(10), ColumnId(11)]))
    );
}

#[test]
fn test_serializer_does_not_touch_plan() {
    let plan = physical(&insert_values(Some(vec!["b"])));
    let before = plan.explain();
    let first = serialize(&plan, &catalog()).unwrap();
    let second = serialize(&plan, &catalog()).unwrap();
    assert_eq!(plan.explain(), before);
    assert_eq!(first, second, "serialization must be deterministic");
}
