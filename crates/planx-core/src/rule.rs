//! # Converter Rules
//!
//! A converter rule rewrites one logical node into its physical counterpart. It is
//! declared by three parts:
//!
//! - **trait filters**: the convention it consumes (`in_convention`, Logical) and
//!   the convention it produces (`out_convention`, PhysicalLocal);
//! - **operand pattern**: operator kind plus input shape (see [`crate::pattern`]),
//!   optionally narrowed by `accepts` (e.g. "only joins with an equi predicate");
//! - **conversion function**: `convert`, which receives the logical node and its
//!   already-converted inputs and builds the physical node, carrying the operator
//!   parameters over verbatim.
//!
//! ## Rule Registry
//!
//! Rules are registered once at process start into a `RuleRegistry`, which is
//! then shared read-only (by reference or `Arc`) with every lowering pass.
//! Names are unique within a registry.
//!
//! ## Choosing Among Several Matches
//!
//! Matching is defined here; which of several applicable rules fires is not. That
//! decision belongs to whoever drives the conversion and is plugged in through
//! `RuleSelector`. `FirstMatch` (registration order) and `PreferByName` are
//! provided.

use crate::error::{PlanError, PlanPath, Result};
use crate::logical::LogicalPlan;
use crate::pattern::{matches, Pattern};
use crate::physical::{OpKind, PhysicalPlan, PlanRef};
use crate::properties::{Convention, Distribution, TraitSet};

/// A logical-to-physical rewrite.
pub trait ConverterRule: Send + Sync {
    /// Unique name of this rule.
    fn name(&self) -> &str;

    /// Convention of the nodes this rule converts.
    fn in_convention(&self) -> Convention {
        Convention::Logical
    }

    /// Convention of the nodes this rule produces.
    fn out_convention(&self) -> Convention {
        Convention::PhysicalLocal
    }

    /// Operand pattern the node must match.
    fn pattern(&self) -> Pattern;

    /// Extra applicability check on a node that already matches `pattern`.
    fn accepts(&self, _node: &LogicalPlan) -> bool {
        true
    }

    /// Traits the converted `input`-th child must carry before `convert` runs.
    fn required_input_traits(&self, _node: &LogicalPlan, _input: usize) -> TraitSet {
        TraitSet::new(self.out_convention(), Distribution::Any)
    }

    /// Traits of the node produced by `convert`.
    fn output_traits(&self, _node: &LogicalPlan) -> TraitSet {
        TraitSet::new(self.out_convention(), Distribution::Any)
    }

    /// Build the physical node. `inputs` are the converted children, in order.
    fn convert(&self, node: &LogicalPlan, inputs: Vec<PlanRef>) -> Result<PhysicalPlan>;
}

/// Error for a rule handed a node its pattern does not describe.
pub fn unexpected_operand(node: &LogicalPlan) -> PlanError {
    PlanError::NoApplicableRule {
        kind: OpKind::Logical(node.kind()),
        path: PlanPath::root(),
    }
}

/// Registry of converter rules.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn ConverterRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Box<dyn ConverterRule>) -> Result<()> {
        if self.rule(rule.name()).is_some() {
            return Err(PlanError::DuplicateRule {
                name: rule.name().to_string(),
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn ConverterRule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn rule(&self, name: &str) -> Option<&dyn ConverterRule> {
        self.rules().find(|r| r.name() == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules whose trait filter and operand pattern accept `node`, in registration order.
    pub fn matching_rules(&self, node: &LogicalPlan) -> Vec<&dyn ConverterRule> {
        let convention = node.traits().convention;
        self.rules()
            .filter(|r| r.in_convention() == convention)
            .filter(|r| matches(node, &r.pattern()))
            .filter(|r| r.accepts(node))
            .collect()
    }
}

/// Tie-break policy among several rules that match the same node.
pub trait RuleSelector: Send + Sync {
    fn select<'a>(
        &self,
        node: &LogicalPlan,
        candidates: &[&'a dyn ConverterRule],
    ) -> Option<&'a dyn ConverterRule>;
}

/// Picks the first matching rule in registration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

impl RuleSelector for FirstMatch {
    fn select<'a>(
        &self,
        _node: &LogicalPlan,
        candidates: &[&'a dyn ConverterRule],
    ) -> Option<&'a dyn ConverterRule> {
        candidates.first().copied()
    }
}

/// Picks the matching rule that appears earliest in a preference list, falling
/// back to registration order for rules not listed.
#[derive(Debug, Clone, Default)]
pub struct PreferByName {
    pub preferred: Vec<String>,
}

impl PreferByName {
    pub fn new(preferred: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            preferred: preferred.into_iter().map(Into::into).collect(),
        }
    }
}

impl RuleSelector for PreferByName {
    fn select<'a>(
        &self,
        _node: &LogicalPlan,
        candidates: &[&'a dyn ConverterRule],
    ) -> Option<&'a dyn ConverterRule> {
        candidates
            .iter()
            .copied()
            .min_by_key(|r| {
                self.preferred
                    .iter()
                    .position(|p| p == r.name())
                    .unwrap_or(usize::MAX)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logical::{LogicalOp, LogicalOpKind};
    use crate::physical::PhysicalOp;

    struct ValuesRule(&'static str);

    impl ConverterRule for ValuesRule {
        fn name(&self) -> &str {
            self.0
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

    fn registry() -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        registry.add_rule(Box::new(ValuesRule("A"))).unwrap();
        registry.add_rule(Box::new(ValuesRule("B"))).unwrap();
        registry
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = registry();
        let err = registry.add_rule(Box::new(ValuesRule("A"))).unwrap_err();
        assert_eq!(err, PlanError::DuplicateRule { name: "A".into() });
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_selectors() {
        let registry = registry();
        let node = LogicalPlan::leaf(LogicalOp::Values { rows: vec![] });
        let candidates = registry.matching_rules(&node);
        assert_eq!(candidates.len(), 2);

        let first = FirstMatch.select(&node, &candidates).unwrap();
        assert_eq!(first.name(), "A");

        let preferred = PreferByName::new(["B"]).select(&node, &candidates).unwrap();
        assert_eq!(preferred.name(), "B");

        let delete = LogicalPlan::unary(
            LogicalOp::Delete {
                table: crate::expr::TableRef::new("public", "t"),
            },
            node,
        );
        assert!(registry.matching_rules(&delete).is_empty());
    }
}
