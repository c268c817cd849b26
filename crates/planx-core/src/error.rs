//! # Planning Errors
//!
//! Every failure of lowering, distribution propagation or serialization is a
//! `PlanError`. None of them is retried inside this crate: a failed pass returns
//! the error to whoever requested compilation and leaves no partially-built node
//! behind.
//!
//! Errors name the offending node by operator kind and by `PlanPath`, the sequence
//! of child indices leading from the root to the node (`/` is the root, `/0/1` the
//! second input of the root's first input).

use crate::physical::{Arity, OpKind};
use crate::properties::{Convention, Distribution};
use std::fmt;

pub type Result<T> = std::result::Result<T, PlanError>;

/// Position of a node inside a plan tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PlanPath(Vec<usize>);

impl PlanPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the `index`-th input of the node at `self`.
    pub fn child(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(index);
        Self(steps)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn steps(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for PlanPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for step in &self.0 {
            write!(f, "/{step}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// A logical node has no registered conversion path.
    #[error("no applicable rule to convert {kind} at {path}")]
    NoApplicableRule { kind: OpKind, path: PlanPath },

    /// `copy` or construction with an input count that does not fit the operator.
    #[error("{kind} expects {expected} input(s) but got {actual} at {path}")]
    ArityMismatch {
        kind: OpKind,
        expected: Arity,
        actual: usize,
        path: PlanPath,
    },

    #[error("table \"{table}\" does not exist (referenced by node at {path})")]
    UnknownTable { table: String, path: PlanPath },

    #[error("column \"{column}\" of table \"{table}\" does not exist (referenced by node at {path})")]
    UnknownColumn {
        table: String,
        column: String,
        path: PlanPath,
    },

    /// A requirement no enforcer can produce. Signals a missing rule, not a user error.
    #[error("cannot satisfy required {required} for {kind} at {path}")]
    TraitUnsatisfiable {
        kind: OpKind,
        required: String,
        path: PlanPath,
    },

    #[error("{kind} cannot carry convention {convention} at {path}")]
    InvalidConvention {
        kind: OpKind,
        convention: Convention,
        path: PlanPath,
    },

    #[error("plan is deeper than the configured maximum of {max_depth} at {path}")]
    PlanTooDeep { max_depth: usize, path: PlanPath },

    #[error("a rule named \"{name}\" is already registered")]
    DuplicateRule { name: String },
}

impl PlanError {
    pub fn unsatisfiable_distribution(kind: OpKind, required: &Distribution) -> Self {
        PlanError::TraitUnsatisfiable {
            kind,
            required: required.to_string(),
            path: PlanPath::root(),
        }
    }

    /// Attach the position of the node the error was raised for.
    pub fn at(self, at: &PlanPath) -> Self {
        let at = at.clone();
        match self {
            PlanError::NoApplicableRule { kind, .. } => PlanError::NoApplicableRule { kind, path: at },
            PlanError::ArityMismatch {
                kind,
                expected,
                actual,
                ..
            } => PlanError::ArityMismatch {
                kind,
                expected,
                actual,
                path: at,
            },
            PlanError::UnknownTable { table, .. } => PlanError::UnknownTable { table, path: at },
            PlanError::UnknownColumn { table, column, .. } => PlanError::UnknownColumn {
                table,
                column,
                path: at,
            },
            PlanError::TraitUnsatisfiable { kind, required, .. } => {
                PlanError::TraitUnsatisfiable {
                    kind,
                    required,
                    path: at,
                }
            }
            PlanError::InvalidConvention {
                kind, convention, ..
            } => PlanError::InvalidConvention {
                kind,
                convention,
                path: at,
            },
            PlanError::PlanTooDeep { max_depth, .. } => PlanError::PlanTooDeep {
                max_depth,
                path: at,
            },
            other => other,
        }
    }

    /// Whether the error should be reported as a compilation error of the user's
    /// query rather than as a planner fault.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PlanError::UnknownTable { .. }
                | PlanError::UnknownColumn { .. }
                | PlanError::NoApplicableRule { .. }
                | PlanError::PlanTooDeep { .. }
        )
    }
}
