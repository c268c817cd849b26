//! Lowering configuration.

use serde::{Deserialize, Serialize};

/// How the physical plan will be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// The whole plan runs on one site; no exchanges.
    Local,
    /// The plan is spread across workers; distribution requirements are enforced
    /// with exchanges.
    #[default]
    Distributed,
}

/// Knobs for one lowering pass.
///
/// Limits guard against pathologically deep plans: lowering, distribution and
/// serialization all recurse once per tree level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoweringConfig {
    pub mode: ExecutionMode,
    /// Upper bound on the depth of the logical tree.
    pub max_plan_depth: usize,
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Distributed,
            max_plan_depth: 1024,
        }
    }
}
