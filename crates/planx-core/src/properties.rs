//! # Trait System
//!
//! Every plan node carries a `TraitSet`: exactly one trait from each of two
//! families.
//!
//! ## Convention
//!
//! The convention says what kind of node this is and therefore which converter
//! rules may match it and which serializer path applies:
//! - `Logical`: abstract relational algebra, the input of lowering.
//! - `PhysicalLocal`: executable, planned for a single site. Converter rules
//!   produce this convention.
//! - `PhysicalDistributed`: executable, with distribution requirements resolved
//!   for a multi-site execution.
//!
//! ## Distribution
//!
//! Describes where a node's output rows physically reside after execution:
//! - `Any`: no known placement. As a *requirement* it means "no requirement".
//! - `Singleton`: all rows on one site.
//! - `HashPartitioned(keys)`: rows partitioned by a hash of the given output
//!   column positions.
//! - `Broadcast`: every site holds every row.
//!
//! ## Satisfaction
//!
//! `satisfies(required, actual)` decides whether a node that *provides* `actual`
//! can be used where `required` is needed. `Any` is satisfied by every placement;
//! every other requirement is met only by an identical placement, so `Singleton`
//! satisfies `Any` but not vice versa.
//!
//! Trait sets are plain values. Changing a trait produces a new `TraitSet`, and a
//! physical node with different traits is a new node (see
//! [`crate::physical::replace_trait`]).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Convention {
    Logical,
    PhysicalLocal,
    PhysicalDistributed,
}

impl Convention {
    pub fn is_physical(&self) -> bool {
        !matches!(self, Convention::Logical)
    }

    /// Whether a node with convention `self` can be used where `required` is needed.
    ///
    /// `PhysicalLocal` doubles as the "any executable node" requirement converter
    /// rules put on their children, so distributed nodes meet it as well.
    pub fn satisfies(&self, required: &Convention) -> bool {
        match (required, self) {
            (Convention::PhysicalLocal, Convention::PhysicalDistributed) => true,
            (r, a) => r == a,
        }
    }
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distribution {
    Any,
    Singleton,
    HashPartitioned(Vec<u32>),
    Broadcast,
}

impl Distribution {
    /// Whether a node providing `self` meets the requirement `required`.
    pub fn satisfies(&self, required: &Distribution) -> bool {
        match required {
            Distribution::Any => true,
            other => self == other,
        }
    }
}

/// Free-function form of [`Distribution::satisfies`], argument order
/// `(required, actual)`.
pub fn satisfies(required: &Distribution, actual: &Distribution) -> bool {
    actual.satisfies(required)
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Any => write!(f, "Any"),
            Distribution::Singleton => write!(f, "Singleton"),
            Distribution::HashPartitioned(keys) => write!(f, "HashPartitioned{keys:?}"),
            Distribution::Broadcast => write!(f, "Broadcast"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraitFamily {
    Convention,
    Distribution,
}

/// A single trait tagged with its family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trait {
    Convention(Convention),
    Distribution(Distribution),
}

impl Trait {
    pub fn family(&self) -> TraitFamily {
        match self {
            Trait::Convention(_) => TraitFamily::Convention,
            Trait::Distribution(_) => TraitFamily::Distribution,
        }
    }
}

/// The traits attached to one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraitSet {
    pub convention: Convention,
    pub distribution: Distribution,
}

impl TraitSet {
    pub fn new(convention: Convention, distribution: Distribution) -> Self {
        Self {
            convention,
            distribution,
        }
    }

    pub fn logical() -> Self {
        Self::new(Convention::Logical, Distribution::Any)
    }

    pub fn physical_local() -> Self {
        Self::new(Convention::PhysicalLocal, Distribution::Any)
    }

    pub fn physical_distributed(distribution: Distribution) -> Self {
        Self::new(Convention::PhysicalDistributed, distribution)
    }

    pub fn get(&self, family: TraitFamily) -> Trait {
        match family {
            TraitFamily::Convention => Trait::Convention(self.convention),
            TraitFamily::Distribution => Trait::Distribution(self.distribution.clone()),
        }
    }

    /// Return a new trait set with the trait of `t`'s family replaced by `t`.
    pub fn replace(&self, t: Trait) -> TraitSet {
        let mut out = self.clone();
        match t {
            Trait::Convention(c) => out.convention = c,
            Trait::Distribution(d) => out.distribution = d,
        }
        out
    }

    /// Check both families against a required trait set.
    pub fn satisfies(&self, required: &TraitSet) -> bool {
        self.convention.satisfies(&required.convention)
            && self.distribution.satisfies(&required.distribution)
    }
}

impl fmt::Display for TraitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.convention, self.distribution)
    }
}
