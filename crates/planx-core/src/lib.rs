//! # planx-core: Logical-to-Physical Plan Lowering
//!
//! This crate holds the planner-side model of a query plan and the machinery that
//! turns a logical plan into an executable physical plan. It never executes a query.
//!
//! ## Module Overview
//!
//! - **`properties`**: The trait system: convention and distribution, trait sets,
//!   and satisfaction checks.
//! - **`expr`**: Scalar expressions and the small value types shared by both plan layers.
//! - **`logical`**: Logical operators and plan trees (input of lowering).
//! - **`physical`**: Physical operators, the node contract (`copy`, `inputs`,
//!   distribution requirements) and explain output.
//! - **`pattern`**: Declarative operand patterns for converter rules.
//! - **`rule`**: The `ConverterRule` trait, the `RuleRegistry` and tie-break selectors.
//! - **`lower`**: The `Lowerer` driving converter rules bottom-up.
//! - **`distribution`**: Top-down distribution propagation and exchange enforcement.
//! - **`catalog`**: Catalog trait resolving tables and columns to stable ids.
//! - **`config`**: Lowering configuration.
//! - **`error`**: `PlanError` and node paths.

pub mod catalog;
pub mod config;
pub mod distribution;
pub mod error;
pub mod expr;
pub mod logical;
pub mod lower;
pub mod pattern;
pub mod physical;
pub mod properties;
pub mod rule;

pub use error::{PlanError, PlanPath, Result};
pub use physical::PlanRef;
