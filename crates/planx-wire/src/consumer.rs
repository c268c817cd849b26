//! # Wire Plan Consumer (Deserialization)
//!
//! The execution side of the wire format. A worker receives `PlanFragment` bytes
//! and needs three things: decode the fragment, walk the node tree, and decode the
//! payload of each node as the message its node type promises.
//!
//! ```text
//! planner: PhysicalPlan -> producer::produce_plan() -> PlanFragment bytes
//! worker:  bytes -> consumer::decode_fragment() -> unpack_body::<InsertNode>(node) -> ...
//! ```
//!
//! ## Error Handling
//!
//! Malformed input is rejected with `WireError` rather than skipped: a payload
//! whose type URL does not match the requested message is a `TypeMismatch`, never
//! a best-effort decode.

use crate::body::{unpack, NodeBody};
use crate::producer::WIRE_PLAN_VERSION;
use crate::proto;
use planx_core::expr::*;
use prost::Message;

/// Decode and validate a fragment received from the planner.
pub fn decode_fragment(bytes: &[u8]) -> Result<proto::PlanFragment, WireError> {
    let fragment = proto::PlanFragment::decode(bytes)?;
    if fragment.version != WIRE_PLAN_VERSION {
        return Err(WireError::UnsupportedVersion(fragment.version));
    }
    if fragment.root.is_none() {
        return Err(WireError::MissingRoot);
    }
    Ok(fragment)
}

/// Decode the payload of `node` as an `M`.
pub fn unpack_body<M: NodeBody>(node: &proto::PlanNode) -> Result<M, WireError> {
    let any = node.body.as_ref().ok_or(WireError::MissingBody)?;
    match unpack::<M>(any) {
        Some(decoded) => Ok(decoded?),
        None => Err(WireError::TypeMismatch {
            expected: M::type_url(),
            actual: any.type_url.clone(),
        }),
    }
}

/// Node types of the tree rooted at `node`, in pre-order.
pub fn node_types_pre_order(node: &proto::PlanNode) -> Vec<proto::PlanNodeType> {
    let mut out = Vec::new();
    collect_node_types(node, &mut out);
    out
}

fn collect_node_types(node: &proto::PlanNode, out: &mut Vec<proto::PlanNodeType>) {
    out.push(node.node_type());
    for child in &node.children {
        collect_node_types(child, out);
    }
}

/// Convert a wire expression back to an internal `Expr`.
///
/// Column names do not travel; references come back as `col_N` for input
/// position N.
pub fn consume_expression(expr: &proto::ExprNode) -> Result<Expr, WireError> {
    use proto::expr_node::Kind;

    match expr.kind.as_ref().ok_or(WireError::MissingExpr)? {
        Kind::InputRef(index) => Ok(Expr::column(format!("col_{index}"), *index)),
        Kind::Literal(datum) => Ok(Expr::Literal(consume_datum(datum))),
        Kind::Call(call) => consume_call(call),
    }
}

fn consume_call(call: &proto::FunctionCall) -> Result<Expr, WireError> {
    use proto::FuncType;

    let func_type = FuncType::try_from(call.func_type)
        .map_err(|_| WireError::UnknownFunction(call.func_type))?;
    let args = call
        .args
        .iter()
        .map(consume_expression)
        .collect::<Result<Vec<_>, _>>()?;

    let binary = |op: BinaryOp, mut args: Vec<Expr>| -> Result<Expr, WireError> {
        if args.len() != 2 {
            return Err(WireError::BadArity {
                func_type: call.func_type,
                actual: args.len(),
            });
        }
        let right = args.pop().ok_or(WireError::MissingExpr)?;
        let left = args.pop().ok_or(WireError::MissingExpr)?;
        Ok(Expr::binary(op, left, right))
    };
    let unary = |op: UnaryOp, mut args: Vec<Expr>| -> Result<Expr, WireError> {
        if args.len() != 1 {
            return Err(WireError::BadArity {
                func_type: call.func_type,
                actual: args.len(),
            });
        }
        let operand = args.pop().ok_or(WireError::MissingExpr)?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        })
    };

    match func_type {
        FuncType::Unspecified => Err(WireError::UnknownFunction(call.func_type)),
        FuncType::Equal => binary(BinaryOp::Eq, args),
        FuncType::NotEqual => binary(BinaryOp::NotEq, args),
        FuncType::LessThan => binary(BinaryOp::Lt, args),
        FuncType::LessThanOrEqual => binary(BinaryOp::LtEq, args),
        FuncType::GreaterThan => binary(BinaryOp::Gt, args),
        FuncType::GreaterThanOrEqual => binary(BinaryOp::GtEq, args),
        FuncType::Add => binary(BinaryOp::Add, args),
        FuncType::Subtract => binary(BinaryOp::Sub, args),
        FuncType::Multiply => binary(BinaryOp::Mul, args),
        FuncType::Divide => binary(BinaryOp::Div, args),
        FuncType::Not => unary(UnaryOp::Not, args),
        FuncType::Neg => unary(UnaryOp::Neg, args),
        FuncType::IsNull => unary(UnaryOp::IsNull, args),
        FuncType::IsNotNull => unary(UnaryOp::IsNotNull, args),
        FuncType::And => Ok(Expr::And(args)),
        FuncType::Or => Ok(Expr::Or(args)),
        FuncType::Named => Ok(Expr::Function {
            name: call.name.clone(),
            args,
        }),
    }
}

fn consume_datum(datum: &proto::Datum) -> ScalarValue {
    use proto::datum::Value;

    match &datum.value {
        None => ScalarValue::Null,
        Some(Value::Bool(v)) => ScalarValue::Bool(*v),
        Some(Value::Int64(v)) => ScalarValue::Int64(*v),
        Some(Value::Float64(v)) => ScalarValue::Float64((*v).into()),
        Some(Value::Utf8(v)) => ScalarValue::Utf8(v.clone()),
        Some(Value::Date(v)) => ScalarValue::Date(*v),
    }
}

/// Errors that can occur while consuming a wire plan.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed protobuf: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The fragment was written by an incompatible planner.
    #[error("unsupported wire plan version {0} (expected {})", WIRE_PLAN_VERSION)]
    UnsupportedVersion(u32),
    #[error("fragment has no root node")]
    MissingRoot,
    #[error("plan node has no body")]
    MissingBody,
    /// The payload is a different message than the one requested.
    #[error("expected body of type {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("expression node is empty")]
    MissingExpr,
    #[error("unknown function type {0}")]
    UnknownFunction(i32),
    #[error("function type {func_type} called with {actual} argument(s)")]
    BadArity { func_type: i32, actual: usize },
}
