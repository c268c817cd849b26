//! # Declarative Operand Patterns for Converter Rules
//!
//! Each converter rule declares a `Pattern` describing the logical nodes it can
//! convert. The rule engine checks the pattern before calling the rule, so a rule's
//! `convert` only ever sees nodes of the shape it asked for.
//!
//! ## Pattern Language
//!
//! - `Pattern::Operator(matcher, children)`: the node's operator satisfies
//!   `matcher` and it has exactly `children.len()` inputs, each matching the
//!   corresponding child pattern.
//! - `Pattern::OperatorAnyInputs(matcher)`: the operator satisfies `matcher`;
//!   inputs are not inspected. This is the common shape of a converter rule's
//!   operand: "an Insert, whatever its input".
//! - `Pattern::Any`: wildcard.
//! - `Pattern::Leaf`: a node without inputs.

use crate::logical::{LogicalOpKind, LogicalPlan};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Operator(OpMatcher, Vec<Pattern>),
    OperatorAnyInputs(OpMatcher),
    Any,
    Leaf,
}

/// Matcher for operator kinds (without data).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMatcher {
    Kind(LogicalOpKind),
    AnyLogical,
}

impl OpMatcher {
    pub fn matches(&self, kind: LogicalOpKind) -> bool {
        match self {
            OpMatcher::Kind(k) => *k == kind,
            OpMatcher::AnyLogical => true,
        }
    }
}

impl Pattern {
    /// `kind` with any inputs.
    pub fn operand(kind: LogicalOpKind) -> Self {
        Pattern::OperatorAnyInputs(OpMatcher::Kind(kind))
    }

    /// `kind` without inputs.
    pub fn leaf(kind: LogicalOpKind) -> Self {
        Pattern::Operator(OpMatcher::Kind(kind), vec![])
    }

    /// `kind` with a single input of any shape.
    pub fn unary(kind: LogicalOpKind) -> Self {
        Pattern::Operator(OpMatcher::Kind(kind), vec![Pattern::Any])
    }

    /// `kind` with two inputs of any shape.
    pub fn binary(kind: LogicalOpKind) -> Self {
        Pattern::Operator(OpMatcher::Kind(kind), vec![Pattern::Any, Pattern::Any])
    }

    /// The operator kind at the top of the pattern, if it names one.
    pub fn root_kind(&self) -> Option<LogicalOpKind> {
        match self {
            Pattern::Operator(OpMatcher::Kind(k), _)
            | Pattern::OperatorAnyInputs(OpMatcher::Kind(k)) => Some(*k),
            _ => None,
        }
    }
}

/// Check if a logical node matches a pattern.
pub fn matches(node: &LogicalPlan, pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Any => true,
        Pattern::Leaf => node.inputs().is_empty(),
        Pattern::OperatorAnyInputs(matcher) => matcher.matches(node.kind()),
        Pattern::Operator(matcher, child_patterns) => {
            if !matcher.matches(node.kind()) {
                return false;
            }
            if node.inputs().len() != child_patterns.len() {
                return false;
            }
            node.inputs()
                .iter()
                .zip(child_patterns.iter())
                .all(|(child, p)| matches(child, p))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, ScalarValue, TableRef};
    use crate::logical::LogicalOp;

    fn values() -> LogicalPlan {
        LogicalPlan::leaf(LogicalOp::Values { rows: vec![] })
    }

    fn filter(input: LogicalPlan) -> LogicalPlan {
        LogicalPlan::unary(
            LogicalOp::Filter {
                predicate: Expr::literal(ScalarValue::Bool(true)),
            },
            input,
        )
    }

    #[test]
    fn test_operand_matches_any_inputs() {
        let insert = LogicalPlan::unary(
            LogicalOp::Insert {
                table: TableRef::new("public", "t"),
                column_list: None,
            },
            filter(values()),
        );
        assert!(matches(&insert, &Pattern::operand(LogicalOpKind::Insert)));
        assert!(!matches(&insert, &Pattern::operand(LogicalOpKind::Delete)));
        assert!(matches(&insert, &Pattern::unary(LogicalOpKind::Insert)));
        assert!(!matches(&insert, &Pattern::binary(LogicalOpKind::Insert)));
    }

    #[test]
    fn test_nested_patterns() {
        let plan = filter(values());
        let filter_over_leaf = Pattern::Operator(
            OpMatcher::Kind(LogicalOpKind::Filter),
            vec![Pattern::Leaf],
        );
        assert!(matches(&plan, &filter_over_leaf));
        assert!(!matches(&filter(plan.clone()), &filter_over_leaf));
        assert!(matches(&values(), &Pattern::leaf(LogicalOpKind::Values)));
        assert!(matches(
            &plan,
            &Pattern::OperatorAnyInputs(OpMatcher::AnyLogical)
        ));
        assert_eq!(
            filter_over_leaf.root_kind(),
            Some(LogicalOpKind::Filter)
        );
    }
}
