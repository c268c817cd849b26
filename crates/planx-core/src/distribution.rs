//! # Distribution Propagation
//!
//! After lowering, every physical node carries `PhysicalLocal` and the `Any`
//! distribution. Before the plan can run on several workers, each operator's
//! distribution requirements have to be made explicit:
//!
//! 1. Distribute the inputs (recursively).
//! 2. Wrap every input whose distribution does not satisfy what the operator
//!    requires of it ([`PhysicalOp::required_input_distribution`]) with an
//!    `Exchange` producing exactly the required distribution.
//! 3. Copy the node with `PhysicalDistributed` and the distribution the operator
//!    produces from its (now satisfying) inputs
//!    ([`PhysicalOp::output_distribution`]).
//!
//! Nodes whose inputs and traits come out unchanged are reused as-is, so running
//! `to_distributed` on an already distributed tree returns the same tree.
//!
//! ## Enforcers
//!
//! `Exchange` is the only enforcer. It can produce `Singleton`, `Broadcast` and
//! `HashPartitioned` with at least one key. An exchange that does not satisfy a
//! requirement is replaced instead of being stacked under a second one, and an
//! exchange whose input already provides its target is removed.
//!
//! ## Local Mode
//!
//! `to_local` plans for a single site: every node becomes `PhysicalLocal` +
//! `Singleton` and exchanges are dropped.

use crate::config::ExecutionMode;
use crate::error::{PlanError, PlanPath, Result};
use crate::physical::{OpKind, PhysicalOp, PhysicalPlan, PlanRef};
use crate::properties::{Convention, Distribution, TraitSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolve distribution requirements for multi-site execution.
pub fn to_distributed(plan: &PlanRef) -> Result<PlanRef> {
    let out = distribute(plan, &PlanPath::root())?;
    debug!(
        "Distributed plan: nodes={}, output={}",
        out.node_count(),
        out.distribution()
    );
    Ok(out)
}

/// Distribution propagation for the subtree rooted at `plan`, which sits at `path`.
pub fn convert_to_distributed(plan: &PlanRef, path: &PlanPath) -> Result<PlanRef> {
    distribute(plan, path)
}

fn distribute(plan: &PlanRef, path: &PlanPath) -> Result<PlanRef> {
    let op = plan.op();
    let mut inputs = Vec::with_capacity(plan.inputs().len());
    let mut changed = false;

    for (i, input) in plan.inputs().iter().enumerate() {
        let distributed = distribute(input, &path.child(i))?;
        let required = op.required_input_distribution(i);
        let enforced = enforce(&distributed, &required).map_err(|e| match e {
            PlanError::TraitUnsatisfiable { .. } => {
                PlanError::unsatisfiable_distribution(OpKind::Physical(op.kind()), &required)
                    .at(path)
            }
            other => other,
        })?;
        changed |= !Arc::ptr_eq(&enforced, input);
        inputs.push(enforced);
    }

    // An exchange placed during lowering may have become redundant once its
    // input's own distribution is known.
    if let PhysicalOp::Exchange { distribution } = op {
        if inputs[0].distribution().satisfies(distribution) {
            trace!("Dropping redundant {} exchange at {}", distribution, path);
            return Ok(inputs.swap_remove(0));
        }
    }

    let input_dists: Vec<Distribution> = inputs.iter().map(|i| i.distribution().clone()).collect();
    let traits = TraitSet::physical_distributed(op.output_distribution(&input_dists));
    if !changed && &traits == plan.traits() {
        return Ok(plan.clone());
    }
    Ok(plan.copy(traits, inputs).map_err(|e| e.at(path))?.into_ref())
}

/// Make `plan` satisfy `required`, adding an exchange if it does not already.
pub fn enforce(plan: &PlanRef, required: &Distribution) -> Result<PlanRef> {
    if plan.distribution().satisfies(required) {
        return Ok(plan.clone());
    }
    if let Distribution::HashPartitioned(keys) = required {
        if keys.is_empty() {
            return Err(PlanError::unsatisfiable_distribution(
                OpKind::Physical(plan.kind()),
                required,
            ));
        }
    }

    // Re-target an existing exchange rather than stacking a second one.
    let source = match plan.op() {
        PhysicalOp::Exchange { .. } => plan.inputs()[0].clone(),
        _ => plan.clone(),
    };
    if source.distribution().satisfies(required) {
        return Ok(source);
    }

    trace!(
        "Enforcing {} on {} (provides {})",
        required,
        source.kind(),
        source.distribution()
    );
    Ok(PhysicalPlan::new(
        PhysicalOp::Exchange {
            distribution: required.clone(),
        },
        TraitSet::physical_distributed(required.clone()),
        vec![source],
    )?
    .into_ref())
}

/// Plan for single-site execution.
pub fn to_local(plan: &PlanRef) -> Result<PlanRef> {
    let out = localize(plan, &PlanPath::root())?;
    debug!("Local plan: nodes={}", out.node_count());
    Ok(out)
}

fn localize(plan: &PlanRef, path: &PlanPath) -> Result<PlanRef> {
    if let PhysicalOp::Exchange { .. } = plan.op() {
        return localize(&plan.inputs()[0], path);
    }

    let mut inputs = Vec::with_capacity(plan.inputs().len());
    let mut changed = false;
    for (i, input) in plan.inputs().iter().enumerate() {
        let local = localize(input, &path.child(i))?;
        changed |= !Arc::ptr_eq(&local, input);
        inputs.push(local);
    }

    let traits = TraitSet::new(Convention::PhysicalLocal, Distribution::Singleton);
    if !changed && &traits == plan.traits() {
        return Ok(plan.clone());
    }
    Ok(plan.copy(traits, inputs).map_err(|e| e.at(path))?.into_ref())
}

/// Apply the propagation matching `mode`.
pub fn finalize(plan: &PlanRef, mode: ExecutionMode) -> Result<PlanRef> {
    match mode {
        ExecutionMode::Local => to_local(plan),
        ExecutionMode::Distributed => to_distributed(plan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, Expr, JoinType, TableRef};
    use crate::physical::PhysicalOpKind;

    fn node(op: PhysicalOp, inputs: Vec<PlanRef>) -> PlanRef {
        PhysicalPlan::new(op, TraitSet::physical_local(), inputs)
            .unwrap()
            .into_ref()
    }

    fn scan(name: &str) -> PlanRef {
        node(
            PhysicalOp::SeqScan {
                table: TableRef::new("public", name),
                columns: vec![],
                predicate: None,
            },
            vec![],
        )
    }

    fn insert(input: PlanRef) -> PlanRef {
        node(
            PhysicalOp::Insert {
                table: TableRef::new("public", "t"),
                column_list: None,
            },
            vec![input],
        )
    }

    #[test]
    fn test_insert_over_values_needs_no_exchange() {
        let plan = insert(node(PhysicalOp::Values { rows: vec![] }, vec![]));
        let dist = to_distributed(&plan).unwrap();
        assert_eq!(
            dist.kinds_pre_order(),
            vec![PhysicalOpKind::Insert, PhysicalOpKind::Values]
        );
        assert_eq!(dist.traits(), &TraitSet::physical_distributed(Distribution::Singleton));
        assert_eq!(dist.inputs()[0].distribution(), &Distribution::Singleton);
    }

    #[test]
    fn test_insert_over_scan_gathers_to_singleton() {
        let plan = insert(scan("src"));
        let dist = to_distributed(&plan).unwrap();
        assert_eq!(
            dist.kinds_pre_order(),
            vec![
                PhysicalOpKind::Insert,
                PhysicalOpKind::Exchange,
                PhysicalOpKind::SeqScan
            ]
        );
        assert_eq!(dist.inputs()[0].distribution(), &Distribution::Singleton);
        assert_eq!(
            dist.inputs()[0].inputs()[0].traits(),
            &TraitSet::physical_distributed(Distribution::Any)
        );
        // The input plan is untouched.
        assert_eq!(plan.traits(), &TraitSet::physical_local());
    }

    #[test]
    fn test_idempotent() {
        let join = node(
            PhysicalOp::HashJoin {
                join_type: JoinType::Inner,
                condition: Expr::binary(BinaryOp::Eq, Expr::column("a", 0), Expr::column("b", 1)),
            },
            vec![scan("l"), scan("r")],
        );
        let plan = insert(join);
        let once = to_distributed(&plan).unwrap();
        let twice = to_distributed(&once).unwrap();
        assert_eq!(once, twice);
        assert!(Arc::ptr_eq(&once, &twice));
        assert_eq!(
            once.kinds_pre_order(),
            vec![
                PhysicalOpKind::Insert,
                PhysicalOpKind::Exchange,
                PhysicalOpKind::HashJoin,
                PhysicalOpKind::Exchange,
                PhysicalOpKind::SeqScan,
                PhysicalOpKind::Exchange,
                PhysicalOpKind::SeqScan,
            ]
        );
        let join = &once.inputs()[0].inputs()[0];
        assert_eq!(
            join.inputs()[1].distribution(),
            &Distribution::HashPartitioned(vec![1])
        );
    }

    #[test]
    fn test_exchange_is_retargeted_not_stacked() {
        let gathered = enforce(&scan("s"), &Distribution::Singleton).unwrap();
        let rehashed = enforce(&gathered, &Distribution::HashPartitioned(vec![0])).unwrap();
        assert_eq!(
            rehashed.kinds_pre_order(),
            vec![PhysicalOpKind::Exchange, PhysicalOpKind::SeqScan]
        );
        assert_eq!(rehashed.distribution(), &Distribution::HashPartitioned(vec![0]));
    }

    #[test]
    fn test_redundant_exchange_dropped() {
        // Gathered during lowering, before the values were known to be on one site.
        let values = node(PhysicalOp::Values { rows: vec![] }, vec![]);
        let gathered = node(
            PhysicalOp::Exchange {
                distribution: Distribution::Singleton,
            },
            vec![values],
        );
        let dist = to_distributed(&insert(gathered)).unwrap();
        assert_eq!(
            dist.kinds_pre_order(),
            vec![PhysicalOpKind::Insert, PhysicalOpKind::Values]
        );
        assert_eq!(dist.inputs()[0].distribution(), &Distribution::Singleton);

        // Still needed: the scan is spread over all sites.
        let gathered = node(
            PhysicalOp::Exchange {
                distribution: Distribution::Singleton,
            },
            vec![scan("src")],
        );
        let dist = to_distributed(&insert(gathered)).unwrap();
        assert_eq!(
            dist.kinds_pre_order(),
            vec![
                PhysicalOpKind::Insert,
                PhysicalOpKind::Exchange,
                PhysicalOpKind::SeqScan
            ]
        );
        let again = to_distributed(&dist).unwrap();
        assert!(Arc::ptr_eq(&dist, &again));
    }

    #[test]
    fn test_empty_hash_keys_unsatisfiable() {
        let err = enforce(&scan("s"), &Distribution::HashPartitioned(vec![])).unwrap_err();
        assert!(matches!(err, PlanError::TraitUnsatisfiable { .. }));
    }

    #[test]
    fn test_to_local_drops_exchanges() {
        let plan = to_distributed(&insert(scan("src"))).unwrap();
        let local = to_local(&plan).unwrap();
        assert_eq!(
            local.kinds_pre_order(),
            vec![PhysicalOpKind::Insert, PhysicalOpKind::SeqScan]
        );
        let expected = TraitSet::new(Convention::PhysicalLocal, Distribution::Singleton);
        assert_eq!(local.traits(), &expected);
        assert_eq!(local.inputs()[0].traits(), &expected);
    }
}
