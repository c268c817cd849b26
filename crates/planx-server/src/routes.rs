//! # HTTP Route Handlers
//!
//! Axum route handlers for the lowering service.
//!
//! ## Lowering Pipeline
//!
//! The protobuf and JSON endpoints share `run_lowering`:
//!
//! 1. **Catalog**: Build a catalog snapshot from the descriptors in the request.
//! 2. **Lower**: Convert the logical plan bottom-up with the shared rule registry.
//! 3. **Distribute**: Enforce distribution requirements (or localize the plan,
//!    depending on the execution mode).
//! 4. **Serialize**: Produce the versioned wire fragment.
//!
//! ## Error Handling
//!
//! - 400 Bad Request: the plan cannot be compiled as written (unknown table or
//!   column, no rule for an operator, plan too deep)
//! - 500 Internal Server Error: a rule or the propagator broke an invariant

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use prost::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use planx_core::catalog::{InMemoryCatalog, TableDescriptor};
use planx_core::config::ExecutionMode;
use planx_core::error::PlanError;
use planx_core::logical::LogicalPlan;
use planx_core::lower::Lowerer;
use planx_core::physical::PlanRef;
use planx_wire::consumer::node_types_pre_order;
use planx_wire::{produce_plan, proto, ResolvedIds};

use crate::state::AppState;

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /rules: list registered converter rules in registration order.
pub async fn list_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rules: Vec<RuleInfo> = state
        .rule_registry
        .rules()
        .map(|r| RuleInfo {
            name: r.name().to_string(),
            in_convention: r.in_convention().to_string(),
            out_convention: r.out_convention().to_string(),
            pattern: r
                .pattern()
                .root_kind()
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "*".to_string()),
        })
        .collect();

    Json(RulesResponse { rules })
}

#[derive(Serialize)]
pub struct RulesResponse {
    pub rules: Vec<RuleInfo>,
}

#[derive(Serialize)]
pub struct RuleInfo {
    pub name: String,
    pub in_convention: String,
    pub out_convention: String,
    /// Operator kind at the root of the rule's operand pattern.
    pub pattern: String,
}

/// Request body shared by both lowering endpoints.
#[derive(Deserialize)]
pub struct LowerRequest {
    pub plan: LogicalPlan,
    /// Descriptors of every table the plan references.
    #[serde(default)]
    pub catalog: Vec<TableDescriptor>,
    /// Overrides the server's execution mode for this request.
    pub mode: Option<ExecutionMode>,
}

/// POST /lower: lower a logical plan and return the `PlanFragment` as protobuf.
pub async fn lower_proto(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LowerRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let lowered = run_lowering(&state, &req)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/x-protobuf")],
        lowered.fragment.encode_to_vec(),
    ))
}

/// POST /lower/json: lower a logical plan and describe the result as JSON.
pub async fn lower_json(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LowerRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let lowered = run_lowering(&state, &req)?;
    Ok(Json(LowerResponse::new(&lowered)))
}

#[derive(Debug, Serialize)]
pub struct LowerResponse {
    pub explain: String,
    /// Wire node types in pre-order.
    pub node_types: Vec<String>,
    /// Qualified table name to catalog id.
    pub resolved_tables: BTreeMap<String, u32>,
}

impl LowerResponse {
    fn new(lowered: &Lowered) -> Self {
        let node_types = lowered
            .fragment
            .root
            .as_ref()
            .map(node_types_pre_order)
            .unwrap_or_default()
            .into_iter()
            .map(|t| format!("{t:?}"))
            .collect();
        Self {
            explain: lowered.plan.explain(),
            node_types,
            resolved_tables: lowered
                .resolved
                .tables
                .iter()
                .map(|(table, id)| (table.to_string(), id.0))
                .collect(),
        }
    }
}

/// Output of one pass through the lowering pipeline.
#[derive(Debug)]
struct Lowered {
    plan: PlanRef,
    fragment: proto::PlanFragment,
    resolved: ResolvedIds,
}

/// Core pipeline shared between the protobuf and JSON endpoints.
///
/// Every request gets its own catalog snapshot; only the rule registry is shared.
fn run_lowering(state: &AppState, req: &LowerRequest) -> Result<Lowered, (StatusCode, String)> {
    let catalog: InMemoryCatalog = req.catalog.iter().cloned().collect();

    let mut config = state.config.lowering.clone();
    if let Some(mode) = req.mode {
        config.mode = mode;
    }
    debug!(
        "Lowering request: root={}, tables={}, mode={:?}",
        req.plan.kind(),
        req.catalog.len(),
        config.mode
    );

    let plan = Lowerer::new(&state.rule_registry)
        .with_config(config)
        .compile(&req.plan)
        .map_err(plan_error_response)?;
    let (fragment, resolved) = produce_plan(&plan, &catalog).map_err(plan_error_response)?;

    Ok(Lowered {
        plan,
        fragment,
        resolved,
    })
}

/// Map a compilation failure to an HTTP status and message.
fn plan_error_response(err: PlanError) -> (StatusCode, String) {
    if err.is_user_error() {
        debug!("Rejected plan: {}", err);
        (StatusCode::BAD_REQUEST, err.to_string())
    } else {
        warn!("Lowering failed: {}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}
