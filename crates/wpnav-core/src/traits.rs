//! Core trait definitions for the tool gate.
//!
//! Two traits define the boundary between the registry and its collaborators:
//!
//! - `ToolHandler`: untrusted executor behind a tool name (REST calls etc.)
//! - `ToolFilter`: trusted, immutable enablement decision table
//!
//! The registry only calls a handler after the currently bound filter has
//! reported its tool as enabled.

use std::fmt;

use serde_json::Value;

use wpnav_contracts::{error::WpnavResult, execution::ExecutionContext};

/// The opaque executor behind one registered tool.
///
/// The registry never inspects arguments or results; it only decides whether
/// `call()` may run at all.
pub trait ToolHandler: Send + Sync {
    /// Perform the tool's action.
    ///
    /// Called without any registry lock held, so long-running handlers do not
    /// block a concurrent filter swap.
    fn call(&self, args: &Value, ctx: &ExecutionContext) -> WpnavResult<Value>;
}

impl<F> ToolHandler for F
where
    F: Fn(&Value, &ExecutionContext) -> WpnavResult<Value> + Send + Sync,
{
    fn call(&self, args: &Value, ctx: &ExecutionContext) -> WpnavResult<Value> {
        self(args, ctx)
    }
}

/// A compiled, read-only enablement table bound into the registry.
///
/// Implementations must be immutable once constructed: the registry swaps
/// whole filters and never expects one to change underneath a reader.
pub trait ToolFilter: Send + Sync + fmt::Debug {
    /// Return true if the tool with this canonical name is enabled.
    ///
    /// Must be cheap (a set lookup); it runs on every dispatch.
    fn is_enabled(&self, canonical_name: &str) -> bool;

    /// Explain the current decision for a tool, if the filter knows.
    ///
    /// Used for `WpnavError::ToolDisabled` messages and for diagnostics.
    /// Returning `None` lets the registry fall back to its own feature-flag
    /// explanation.
    fn explain(&self, _canonical_name: &str) -> Option<String> {
        None
    }

    /// Short identifier used in log events.
    fn label(&self) -> String;
}
