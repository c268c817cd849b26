//! End-to-end lowering tests against the built-in rule set.
//!
//! Logical plans are built by hand in the shape a binder would produce, lowered
//! with `Lowerer` and `planx_rules::default_rule_registry()`, and the resulting
//! physical trees are checked for shape, parameters and traits.

use planx_core::error::{PlanError, PlanPath};
use planx_core::expr::*;
use planx_core::logical::{LogicalOp, LogicalOpKind, LogicalPlan};
use planx_core::lower::Lowerer;
use planx_core::physical::{OpKind, PhysicalOp, PhysicalOpKind};
use planx_core::properties::{Convention, Distribution, TraitSet};
use planx_core::rule::{PreferByName, RuleRegistry};
use planx_rules::default_rule_registry;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn registry() -> RuleRegistry {
    default_rule_registry().expect("built-in rule names are unique")
}

fn scan(name: &str) -> LogicalPlan {
    LogicalPlan::leaf(LogicalOp::Scan {
        table: TableRef::new("tpch", name),
        columns: vec![],
        predicate: None,
    })
}

fn equi(l: &str, li: u32, r: &str, ri: u32) -> Expr {
    Expr::binary(BinaryOp::Eq, Expr::column(l, li), Expr::column(r, ri))
}

fn join(condition: Expr, left: LogicalPlan, right: LogicalPlan) -> LogicalPlan {
    LogicalPlan::new(
        LogicalOp::Join {
            join_type: JoinType::Inner,
            condition,
        },
        vec![left, right],
    )
}

fn insert_values(column_list: Option<Vec<String>>) -> LogicalPlan {
    LogicalPlan::unary(
        LogicalOp::Insert {
            table: TableRef::new("public", "t"),
            column_list,
        },
        LogicalPlan::leaf(LogicalOp::Values {
            rows: vec![vec![
                Expr::literal(ScalarValue::Int64(1)),
                Expr::literal(ScalarValue::Utf8("x".into())),
            ]],
        }),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_insert_over_values() {
    let registry = registry();
    let plan = Lowerer::new(&registry)
        .lower(&insert_values(Some(vec!["c".into(), "a".into()])))
        .unwrap();

    assert_eq!(
        plan.kinds_pre_order(),
        vec![PhysicalOpKind::Insert, PhysicalOpKind::Values]
    );
    assert_eq!(
        plan.op(),
        &PhysicalOp::Insert {
            table: TableRef::new("public", "t"),
            column_list: Some(vec!["c".into(), "a".into()]),
        },
        "target table and column list must be carried over verbatim"
    );
    assert_eq!(plan.traits(), &TraitSet::physical_local());
    assert_eq!(plan.inputs()[0].traits(), &TraitSet::physical_local());
    assert!(matches!(
        plan.inputs()[0].op(),
        PhysicalOp::Values { rows } if rows.len() == 1
    ));
}

#[test]
fn test_tpch_q10_shape() {
    // SELECT c_name, sum(o_totalprice) FROM orders, customer, nation
    // WHERE o_custkey = c_custkey AND c_nationkey = n_nationkey AND o_totalprice > 100
    // GROUP BY c_name ORDER BY 2 DESC LIMIT 20
    let orders = LogicalPlan::unary(
        LogicalOp::Filter {
            predicate: Expr::binary(
                BinaryOp::Gt,
                Expr::column("o_totalprice", 2),
                Expr::literal(ScalarValue::Int64(100)),
            ),
        },
        scan("orders"),
    );
    let oc = join(equi("o_custkey", 1, "c_custkey", 0), orders, scan("customer"));
    let ocn = join(equi("c_nationkey", 5, "n_nationkey", 0), oc, scan("nation"));
    let agg = LogicalPlan::unary(
        LogicalOp::Aggregate {
            group_by: vec![Expr::column("c_name", 4)],
            aggregates: vec![AggExpr {
                func: AggFunc::Sum,
                arg: Expr::column("o_totalprice", 2),
                distinct: false,
            }],
        },
        ocn,
    );
    let sort = LogicalPlan::unary(
        LogicalOp::Sort {
            order: vec![SortKey {
                expr: Expr::column("revenue", 1),
                ascending: false,
                nulls_first: false,
            }],
        },
        agg,
    );
    let limit = LogicalPlan::unary(
        LogicalOp::Limit {
            offset: 0,
            count: 20,
        },
        sort,
    );

    let registry = registry();
    let plan = Lowerer::new(&registry).lower(&limit).unwrap();
    assert_eq!(
        plan.kinds_pre_order(),
        vec![
            PhysicalOpKind::Limit,
            PhysicalOpKind::Sort,
            PhysicalOpKind::HashAggregate,
            PhysicalOpKind::HashJoin,
            PhysicalOpKind::HashJoin,
            PhysicalOpKind::Filter,
            PhysicalOpKind::SeqScan,
            PhysicalOpKind::SeqScan,
            PhysicalOpKind::SeqScan,
        ]
    );
    assert_eq!(plan.node_count(), limit.node_count());
    assert_eq!(
        plan.op(),
        &PhysicalOp::Limit {
            offset: 0,
            count: 20
        }
    );
}

#[test]
fn test_non_equi_join_falls_back_to_nested_loop() {
    let registry = registry();
    let plan = join(
        Expr::binary(BinaryOp::Lt, Expr::column("a", 0), Expr::column("b", 0)),
        scan("l"),
        scan("r"),
    );
    let lowered = Lowerer::new(&registry).lower(&plan).unwrap();
    assert_eq!(lowered.kind(), PhysicalOpKind::NestedLoopJoin);

    let equi_plan = join(equi("a", 0, "b", 0), scan("l"), scan("r"));
    let lowered = Lowerer::new(&registry).lower(&equi_plan).unwrap();
    assert_eq!(lowered.kind(), PhysicalOpKind::HashJoin);

    let prefer_nlj = PreferByName::new(["ImplNestedLoopJoin"]);
    let lowered = Lowerer::new(&registry)
        .with_selector(&prefer_nlj)
        .lower(&equi_plan)
        .unwrap();
    assert_eq!(
        lowered.kind(),
        PhysicalOpKind::NestedLoopJoin,
        "selector preference must override registration order"
    );
}

#[test]
fn test_missing_rule_fails_without_plan() {
    let registry = RuleRegistry::new();
    let err = Lowerer::new(&registry)
        .lower(&insert_values(None))
        .unwrap_err();
    // Children are converted first, so the Values leaf fails before the Insert.
    assert_eq!(
        err,
        PlanError::NoApplicableRule {
            kind: OpKind::Logical(LogicalOpKind::Values),
            path: PlanPath::root().child(0),
        }
    );
    assert!(err.is_user_error());
}

#[test]
fn test_convert_node_accepts_distributed_inputs() {
    let registry = registry();
    let lowerer = Lowerer::new(&registry);
    let values = lowerer
        .lower(&LogicalPlan::leaf(LogicalOp::Values { rows: vec![] }))
        .unwrap();
    let values = planx_core::distribution::to_distributed(&values).unwrap();
    assert_eq!(values.convention(), Convention::PhysicalDistributed);

    let insert = lowerer
        .convert_node(&insert_values(None), vec![values.clone()], &PlanPath::root())
        .unwrap();
    assert_eq!(insert.kind(), PhysicalOpKind::Insert);
    assert!(std::sync::Arc::ptr_eq(&insert.inputs()[0], &values));
    assert_eq!(insert.inputs()[0].distribution(), &Distribution::Singleton);
}

#[test]
fn test_every_logical_kind_has_a_rule() {
    let registry = registry();
    let kinds: Vec<LogicalOpKind> = registry
        .rules()
        .filter_map(|r| r.pattern().root_kind())
        .collect();
    for kind in [
        LogicalOpKind::Values,
        LogicalOpKind::Scan,
        LogicalOpKind::Filter,
        LogicalOpKind::Project,
        LogicalOpKind::Join,
        LogicalOpKind::Aggregate,
        LogicalOpKind::Sort,
        LogicalOpKind::Limit,
        LogicalOpKind::Insert,
        LogicalOpKind::Delete,
    ] {
        assert!(kinds.contains(&kind), "no built-in rule for {kind}");
    }
}
