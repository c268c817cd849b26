//! # Application State
//!
//! Shared state available to all HTTP request handlers. It is created once at
//! server startup and shared via `Arc` across all concurrent requests.
//!
//! ## Components
//!
//! - **Rule Registry**: the built-in converter rules. Built once and only read
//!   afterwards, so requests share it without locking.
//! - **Server Config**: listen address and the default lowering configuration.
//!
//! There is no shared catalog: each request carries the table descriptors its plan
//! references and gets its own snapshot.

use planx_core::config::LoweringConfig;
use planx_core::error::Result;
use planx_core::rule::RuleRegistry;
use std::sync::Arc;

/// Environment variable overriding the listen address.
pub const LISTEN_ADDR_ENV: &str = "PLANX_LISTEN_ADDR";

/// Server-level configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Applied to every request; a request may only override the execution mode.
    pub lowering: LoweringConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            lowering: LoweringConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults, with the listen address taken from `PLANX_LISTEN_ADDR` if set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(addr) = std::env::var(LISTEN_ADDR_ENV) {
            if !addr.trim().is_empty() {
                config.listen_addr = addr.trim().to_string();
            }
        }
        config
    }
}

/// Shared application state, accessible by all request handlers via Axum's State extractor.
pub struct AppState {
    pub rule_registry: Arc<RuleRegistry>,
    pub config: ServerConfig,
}

impl AppState {
    /// State with the built-in rules.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let registry = planx_rules::default_rule_registry()?;
        Ok(Self {
            rule_registry: Arc::new(registry),
            config,
        })
    }
}
