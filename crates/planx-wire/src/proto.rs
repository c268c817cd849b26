//! # Wire Plan Schema
//!
//! The messages a remote worker receives. They are declared with `prost` derive
//! macros directly on Rust structs instead of a `.proto` file and a build step,
//! which keeps the build free of `protoc`.
//!
//! ## Envelope
//!
//! A plan is a tree of `PlanNode { node_type, body, children }`. `node_type` is a
//! stable tag naming the operator; `body` is the operator payload packed into a
//! `google.protobuf.Any` whose type URL names the payload message
//! (`type.googleapis.com/planx.InsertNode`, ...). `PlanFragment` wraps the root
//! with a schema version.
//!
//! ## Stability
//!
//! Tags (field numbers and enum values) define the wire format. A payload never
//! changes meaning once shipped; new operators get a new `PlanNodeType` value and a
//! new payload message. Catalog objects only ever appear as numeric ids.

use prost::{Enumeration, Message};
use prost_types::Any;

/// Root of a serialized plan.
#[derive(Clone, PartialEq, Message)]
pub struct PlanFragment {
    #[prost(uint32, tag = "1")]
    pub version: u32,
    #[prost(message, optional, tag = "2")]
    pub root: Option<PlanNode>,
}

/// One serialized physical operator and its serialized children.
#[derive(Clone, PartialEq, Message)]
pub struct PlanNode {
    #[prost(enumeration = "PlanNodeType", tag = "1")]
    pub node_type: i32,
    #[prost(message, optional, tag = "2")]
    pub body: Option<Any>,
    #[prost(message, repeated, tag = "3")]
    pub children: Vec<PlanNode>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum PlanNodeType {
    Unspecified = 0,
    Insert = 1,
    Delete = 2,
    SeqScan = 3,
    Values = 4,
    Filter = 5,
    Project = 6,
    HashJoin = 7,
    NestedLoopJoin = 8,
    HashAgg = 9,
    Sort = 10,
    Limit = 11,
    Exchange = 12,
}

// ---------------------------------------------------------------------------
// Operator payloads
// ---------------------------------------------------------------------------

/// `column_ids` lists every column of the target table in table (write) order.
/// `bound_column_ids` lists the columns of an explicit `INSERT INTO t (c, a)`
/// target list in statement order, and is empty when the statement had none.
#[derive(Clone, PartialEq, Message)]
pub struct InsertNode {
    #[prost(uint32, tag = "1")]
    pub table_id: u32,
    #[prost(uint32, repeated, tag = "2")]
    pub column_ids: Vec<u32>,
    #[prost(uint32, repeated, tag = "3")]
    pub bound_column_ids: Vec<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DeleteNode {
    #[prost(uint32, tag = "1")]
    pub table_id: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct SeqScanNode {
    #[prost(uint32, tag = "1")]
    pub table_id: u32,
    #[prost(uint32, repeated, tag = "2")]
    pub column_ids: Vec<u32>,
    #[prost(message, optional, tag = "3")]
    pub filter: Option<ExprNode>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ValuesNode {
    #[prost(message, repeated, tag = "1")]
    pub rows: Vec<ValuesRow>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ValuesRow {
    #[prost(message, repeated, tag = "1")]
    pub cells: Vec<ExprNode>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FilterNode {
    #[prost(message, optional, tag = "1")]
    pub condition: Option<ExprNode>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProjectNode {
    #[prost(message, repeated, tag = "1")]
    pub select_list: Vec<ExprNode>,
    #[prost(string, repeated, tag = "2")]
    pub names: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct HashJoinNode {
    #[prost(enumeration = "JoinType", tag = "1")]
    pub join_type: i32,
    #[prost(uint32, repeated, tag = "2")]
    pub left_keys: Vec<u32>,
    #[prost(uint32, repeated, tag = "3")]
    pub right_keys: Vec<u32>,
    #[prost(message, optional, tag = "4")]
    pub condition: Option<ExprNode>,
}

#[derive(Clone, PartialEq, Message)]
pub struct NestedLoopJoinNode {
    #[prost(enumeration = "JoinType", tag = "1")]
    pub join_type: i32,
    #[prost(message, optional, tag = "2")]
    pub condition: Option<ExprNode>,
}

#[derive(Clone, PartialEq, Message)]
pub struct HashAggNode {
    #[prost(message, repeated, tag = "1")]
    pub group_keys: Vec<ExprNode>,
    #[prost(message, repeated, tag = "2")]
    pub agg_calls: Vec<AggCall>,
}

#[derive(Clone, PartialEq, Message)]
pub struct AggCall {
    #[prost(enumeration = "AggKind", tag = "1")]
    pub kind: i32,
    #[prost(message, optional, tag = "2")]
    pub arg: Option<ExprNode>,
    #[prost(bool, tag = "3")]
    pub distinct: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct SortNode {
    #[prost(message, repeated, tag = "1")]
    pub column_orders: Vec<ColumnOrder>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ColumnOrder {
    #[prost(message, optional, tag = "1")]
    pub expr: Option<ExprNode>,
    #[prost(bool, tag = "2")]
    pub ascending: bool,
    #[prost(bool, tag = "3")]
    pub nulls_first: bool,
}

#[derive(Clone, PartialEq, Message)]
pub struct LimitNode {
    #[prost(uint64, tag = "1")]
    pub limit: u64,
    #[prost(uint64, tag = "2")]
    pub offset: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct ExchangeNode {
    #[prost(message, optional, tag = "1")]
    pub distribution: Option<DistributionProto>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DistributionProto {
    #[prost(enumeration = "DistributionKind", tag = "1")]
    pub kind: i32,
    /// Output column positions, only for `HashPartitioned`.
    #[prost(uint32, repeated, tag = "2")]
    pub keys: Vec<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum JoinType {
    Unspecified = 0,
    Inner = 1,
    Left = 2,
    Right = 3,
    Full = 4,
    Semi = 5,
    Anti = 6,
    Cross = 7,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum AggKind {
    Unspecified = 0,
    Count = 1,
    Sum = 2,
    Avg = 3,
    Min = 4,
    Max = 5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum DistributionKind {
    Unspecified = 0,
    Any = 1,
    Singleton = 2,
    HashPartitioned = 3,
    Broadcast = 4,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A scalar expression. Column references travel as input positions only.
#[derive(Clone, PartialEq, Message)]
pub struct ExprNode {
    #[prost(oneof = "expr_node::Kind", tags = "1, 2, 3")]
    pub kind: Option<expr_node::Kind>,
}

pub mod expr_node {
    use prost::Oneof;

    #[derive(Clone, PartialEq, Oneof)]
    pub enum Kind {
        #[prost(uint32, tag = "1")]
        InputRef(u32),
        #[prost(message, tag = "2")]
        Literal(super::Datum),
        #[prost(message, tag = "3")]
        Call(super::FunctionCall),
    }
}

/// A constant. An unset `value` is SQL NULL.
#[derive(Clone, PartialEq, Message)]
pub struct Datum {
    #[prost(oneof = "datum::Value", tags = "1, 2, 3, 4, 5")]
    pub value: Option<datum::Value>,
}

pub mod datum {
    use prost::Oneof;

    #[derive(Clone, PartialEq, Oneof)]
    pub enum Value {
        #[prost(bool, tag = "1")]
        Bool(bool),
        #[prost(int64, tag = "2")]
        Int64(i64),
        #[prost(double, tag = "3")]
        Float64(f64),
        #[prost(string, tag = "4")]
        Utf8(String),
        /// Days since 1970-01-01.
        #[prost(int32, tag = "5")]
        Date(i32),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct FunctionCall {
    #[prost(enumeration = "FuncType", tag = "1")]
    pub func_type: i32,
    /// Function name, only for `FuncType::Named`.
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, repeated, tag = "3")]
    pub args: Vec<ExprNode>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum FuncType {
    Unspecified = 0,
    Equal = 1,
    NotEqual = 2,
    LessThan = 3,
    LessThanOrEqual = 4,
    GreaterThan = 5,
    GreaterThanOrEqual = 6,
    Add = 7,
    Subtract = 8,
    Multiply = 9,
    Divide = 10,
    Not = 11,
    Neg = 12,
    IsNull = 13,
    IsNotNull = 14,
    And = 15,
    Or = 16,
    /// A function identified by name (`FunctionCall::name`).
    Named = 17,
}
