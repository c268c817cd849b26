//! # Lowering Driver
//!
//! `Lowerer` fires converter rules against logical nodes. One firing
//! (`convert_node`) runs four steps:
//!
//! 1. **Match**: collect the registered rules whose convention filter and operand
//!    pattern accept the node. None is a `NoApplicableRule` error.
//! 2. **Select**: hand the candidates to the configured `RuleSelector`.
//! 3. **Require**: every converted input must carry the traits the rule asks for
//!    (`required_input_traits`). Missing distributions are enforced with an
//!    exchange; a convention mismatch cannot be repaired and fails.
//! 4. **Build**: the rule's `convert` produces the physical node, parameters copied
//!    over verbatim.
//!
//! Errors carry the operator kind and the `PlanPath` of the failing node. Nothing
//! partially built is returned.
//!
//! `lower` walks a whole logical tree bottom-up: inputs are converted before their
//! parent, so every rule sees fully physical inputs.

use crate::config::LoweringConfig;
use crate::distribution::{enforce, finalize};
use crate::error::{PlanError, PlanPath, Result};
use crate::logical::LogicalPlan;
use crate::physical::{OpKind, PlanRef};
use crate::properties::TraitSet;
use crate::rule::{FirstMatch, RuleRegistry, RuleSelector};
use tracing::{debug, trace};

/// Drives converter rules over logical plans.
pub struct Lowerer<'a> {
    registry: &'a RuleRegistry,
    selector: &'a dyn RuleSelector,
    config: LoweringConfig,
}

impl<'a> Lowerer<'a> {
    /// A lowerer using `FirstMatch` and the default configuration.
    pub fn new(registry: &'a RuleRegistry) -> Self {
        Self {
            registry,
            selector: &FirstMatch,
            config: LoweringConfig::default(),
        }
    }

    pub fn with_selector(mut self, selector: &'a dyn RuleSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_config(mut self, config: LoweringConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LoweringConfig {
        &self.config
    }

    /// Convert one logical node whose inputs have already been converted.
    pub fn convert_node(
        &self,
        node: &LogicalPlan,
        inputs: Vec<PlanRef>,
        path: &PlanPath,
    ) -> Result<PlanRef> {
        let kind = OpKind::Logical(node.kind());
        let arity = node.op.arity();
        if !arity.accepts(inputs.len()) {
            return Err(PlanError::ArityMismatch {
                kind,
                expected: arity,
                actual: inputs.len(),
                path: path.clone(),
            });
        }

        let candidates = self.registry.matching_rules(node);
        let rule = self
            .selector
            .select(node, &candidates)
            .ok_or_else(|| PlanError::NoApplicableRule {
                kind,
                path: path.clone(),
            })?;
        trace!(
            "Applying rule '{}' to {} at {} ({} candidate(s))",
            rule.name(),
            node.kind(),
            path,
            candidates.len()
        );

        let mut converted = Vec::with_capacity(inputs.len());
        for (i, input) in inputs.into_iter().enumerate() {
            let required = rule.required_input_traits(node, i);
            converted.push(require(input, &required, kind, &path.child(i))?);
        }

        let plan = rule.convert(node, converted).map_err(|e| e.at(path))?;
        Ok(plan.into_ref())
    }

    /// Lower a whole logical tree, children before parents.
    pub fn lower(&self, plan: &LogicalPlan) -> Result<PlanRef> {
        let out = self.lower_at(plan, &PlanPath::root())?;
        debug!(
            "Lowered plan: logical nodes={}, physical nodes={}",
            plan.node_count(),
            out.node_count()
        );
        Ok(out)
    }

    fn lower_at(&self, plan: &LogicalPlan, path: &PlanPath) -> Result<PlanRef> {
        if path.depth() >= self.config.max_plan_depth {
            return Err(PlanError::PlanTooDeep {
                max_depth: self.config.max_plan_depth,
                path: path.clone(),
            });
        }
        let inputs = plan
            .inputs()
            .iter()
            .enumerate()
            .map(|(i, input)| self.lower_at(input, &path.child(i)))
            .collect::<Result<Vec<_>>>()?;
        self.convert_node(plan, inputs, path)
    }

    /// Lower and resolve distribution for the configured execution mode.
    pub fn compile(&self, plan: &LogicalPlan) -> Result<PlanRef> {
        let physical = self.lower(plan)?;
        finalize(&physical, self.config.mode)
    }
}

/// Make a converted input carry `required`, enforcing the distribution if needed.
fn require(input: PlanRef, required: &TraitSet, parent: OpKind, path: &PlanPath) -> Result<PlanRef> {
    if !input.convention().satisfies(&required.convention) {
        return Err(PlanError::TraitUnsatisfiable {
            kind: parent,
            required: required.convention.to_string(),
            path: path.clone(),
        });
    }
    if input.distribution().satisfies(&required.distribution) {
        return Ok(input);
    }
    enforce(&input, &required.distribution).map_err(|e| e.at(path))
}
