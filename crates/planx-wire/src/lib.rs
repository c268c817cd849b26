//! # Wire Plan Serialization
//!
//! This crate turns a physical plan into a self-describing, catalog-independent
//! message a remote execution worker can reconstruct without access to the
//! planner's catalog or type system, and provides the worker-side decoding
//! helpers.
//!
//! ## Module Overview
//!
//! - **`proto`**: The wire schema (`PlanFragment`, `PlanNode`, one payload message
//!   per operator kind), declared with `prost` derives.
//! - **`body`**: Packing operator payloads into `google.protobuf.Any`.
//! - **`producer`**: Physical plan -> wire plan, resolving catalog ids once per pass.
//! - **`consumer`**: Wire bytes -> fragment, payload and expression decoding.

pub mod body;
pub mod consumer;
pub mod producer;
pub mod proto;

pub use consumer::WireError;
pub use producer::{produce_plan, serialize, ResolvedIds, SerializedPlan, WIRE_PLAN_VERSION};
