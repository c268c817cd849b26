//! # Scalar Expressions
//!
//! Scalar expressions are the operator parameters that travel with a plan node:
//! predicates, projections, join conditions, aggregate arguments and sort keys.
//! They are shared verbatim between a logical node and its physical counterpart,
//! which is what lets a converter rule "carry parameters over" without rewriting
//! them.
//!
//! ## Column References
//!
//! A `ColumnRef` names a column and records its position (`index`) in the input
//! row of the operator that owns the expression. For a join condition the index is
//! relative to the side the column comes from: in `l = r`, `l` indexes the left
//! input and `r` the right input. The serializer only ever ships the index; names
//! are kept for explain output and for matching against the catalog.
//!
//! ## Floating Point Literals
//!
//! `ScalarValue::Float64` uses `OrderedFloat` so that expressions (and therefore
//! whole operators) can be compared and hashed. Trait equality on physical nodes
//! relies on this.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reference to a table in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Reference to a column of an operator's input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
    pub index: u32,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>, index: u32) -> Self {
        Self {
            table: None,
            name: name.into(),
            index,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref t) = self.table {
            write!(f, "{}.{}", t, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Constant value appearing in an expression (e.g. `WHERE x = 42`, `VALUES (1, 'a')`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int64(i64),
    /// Wrapped in `OrderedFloat` for Eq/Hash support.
    Float64(OrderedFloat<f64>),
    Utf8(String),
    /// Days since 1970-01-01.
    Date(i32),
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a == b,
            (Self::Utf8(a), Self::Utf8(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Int64(v) => v.hash(state),
            Self::Float64(v) => v.hash(state),
            Self::Utf8(v) => v.hash(state),
            Self::Date(v) => v.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{}", v.into_inner()),
            Self::Utf8(v) => write!(f, "'{v}'"),
            Self::Date(v) => write!(f, "date({v})"),
        }
    }
}

/// Scalar expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to an input column by name and ordinal index.
    Column(ColumnRef),
    Literal(ScalarValue),
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Named function call (e.g. `UPPER(name)`).
    Function { name: String, args: Vec<Expr> },
    /// Conjunction kept flat to simplify key extraction.
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn column(name: impl Into<String>, index: u32) -> Self {
        Expr::Column(ColumnRef::new(name, index))
    }

    pub fn literal(value: ScalarValue) -> Self {
        Expr::Literal(value)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Flatten AND-chains: (A AND (B AND C)) → [A, B, C].
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::And(exprs) => exprs.iter().flat_map(|e| e.conjuncts()).collect(),
            other => vec![other],
        }
    }

    /// Column pairs of the `col = col` conjuncts, as (left index, right index).
    ///
    /// These are the keys a hash join partitions its inputs on. Non-equi conjuncts
    /// are ignored; an expression without any equi conjunct yields no keys.
    pub fn equi_keys(&self) -> Vec<(u32, u32)> {
        self.conjuncts()
            .into_iter()
            .filter_map(|c| match c {
                Expr::BinaryOp {
                    op: BinaryOp::Eq,
                    left,
                    right,
                } => match (left.as_ref(), right.as_ref()) {
                    (Expr::Column(l), Expr::Column(r)) => Some((l.index, r.index)),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => write!(f, "{c}"),
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::BinaryOp { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Not => write!(f, "NOT {operand}"),
                UnaryOp::Neg => write!(f, "-{operand}"),
                UnaryOp::IsNull => write!(f, "{operand} IS NULL"),
                UnaryOp::IsNotNull => write!(f, "{operand} IS NOT NULL"),
            },
            Expr::Function { name, args } => {
                write!(f, "{name}(")?;
                write_list(f, args, ", ")?;
                write!(f, ")")
            }
            Expr::And(exprs) => write_list(f, exprs, " AND "),
            Expr::Or(exprs) => write_list(f, exprs, " OR "),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// SQL join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Semi,
    Anti,
    Cross,
}

/// Aggregate expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggExpr {
    pub func: AggFunc,
    pub arg: Expr,
    pub distinct: bool,
}

impl fmt::Display for AggExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.distinct {
            write!(f, "{:?}(DISTINCT {})", self.func, self.arg)
        } else {
            write!(f, "{:?}({})", self.func, self.arg)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// Sort key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub expr: Expr,
    pub ascending: bool,
    pub nulls_first: bool,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.ascending { "ASC" } else { "DESC" };
        write!(f, "{} {}", self.expr, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equi_keys() {
        let cond = Expr::And(vec![
            Expr::binary(BinaryOp::Eq, Expr::column("a", 0), Expr::column("x", 2)),
            Expr::binary(
                BinaryOp::Lt,
                Expr::column("b", 1),
                Expr::literal(ScalarValue::Int64(10)),
            ),
            Expr::binary(BinaryOp::Eq, Expr::column("c", 3), Expr::column("y", 1)),
        ]);
        assert_eq!(cond.equi_keys(), vec![(0, 2), (3, 1)]);

        let non_equi = Expr::binary(
            BinaryOp::Lt,
            Expr::column("a", 0),
            Expr::literal(ScalarValue::Int64(10)),
        );
        assert!(non_equi.equi_keys().is_empty());
    }

    #[test]
    fn test_display() {
        let e = Expr::binary(
            BinaryOp::GtEq,
            Expr::column("price", 1),
            Expr::literal(ScalarValue::Float64(OrderedFloat(9.5))),
        );
        assert_eq!(e.to_string(), "(price >= 9.5)");
    }
}
