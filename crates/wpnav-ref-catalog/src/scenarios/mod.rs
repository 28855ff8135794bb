//! Tool-gate demo scenarios.
//!
//! Each scenario builds the reference registry, binds a policy compiled from
//! one of the embedded TOML files and shows a distinct gating behavior.

pub mod category_scoping;
pub mod flag_gating;
pub mod role_switch;

/// Embedded editorial policy: category scoping, overrides and three roles.
pub const EDITORIAL_POLICY: &str = include_str!("../../policies/editorial.toml");

/// Embedded automation policy: workflows flag on, destructive tools off.
pub const WORKFLOWS_POLICY: &str = include_str!("../../policies/workflows.toml");
