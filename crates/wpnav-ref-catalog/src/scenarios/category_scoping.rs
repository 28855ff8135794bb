//! Scenario 1: Category scoping
//!
//! An editorial site exposes only its content-facing categories, then uses
//! pattern overrides to carve single tools in and out:
//!   1. `enabled = [core, content, taxonomy, users]` narrows the baseline
//!   2. `disabled = [users]` wins over `enabled` for the same category
//!   3. `wpnav_list_users = true` brings one user tool back by exact name
//!   4. `wpnav_delete_* = false` removes destructive content tools
//!   5. Every disabled tool is explained; a disabled call is rejected

use serde_json::json;

use wpnav_contracts::{
    error::{WpnavError, WpnavResult},
    execution::ExecutionContext,
    policy::FeatureFlags,
};
use wpnav_policy::{bind_config, ToolPolicyConfig};

use crate::catalog::reference_registry;
use crate::scenarios::EDITORIAL_POLICY;

/// Run Scenario 1: Category scoping.
pub fn run_scenario() -> WpnavResult<()> {
    println!("=== Scenario 1: Category Scoping ===");
    println!();

    let registry = reference_registry(FeatureFlags::new())?;
    let config = ToolPolicyConfig::from_toml_str(EDITORIAL_POLICY)?;
    let filter = bind_config(&registry, &config);

    println!(
        "  Catalog: {} tools; policy enables {}",
        registry.len(),
        filter.enabled_count()
    );
    println!();
    println!("  Enabled:");
    for spec in filter.enabled_definitions() {
        println!("    {:<24} [{}]", spec.name, spec.category);
    }
    println!();

    println!("  Disabled:");
    for spec in registry.catalog() {
        if !filter.is_enabled(&spec.name) {
            let reason = registry.explain(&spec.name).unwrap_or_default();
            println!("    {:<24} {}", spec.name, reason);
        }
    }
    println!();

    // A disabled tool is rejected before its handler runs.
    let ctx = ExecutionContext::new();
    match registry.execute("wpnav_delete_post", &json!({ "id": 101 }), &ctx) {
        Err(WpnavError::ToolDisabled { name, reason }) => {
            println!("  Call {}: REJECTED ({})", name, reason);
        }
        Ok(_) => println!("  Call wpnav_delete_post: unexpectedly allowed"),
        Err(e) => return Err(e),
    }

    let out = registry.execute("wpnav_list_users", &json!({}), &ctx)?;
    println!(
        "  Call wpnav_list_users: OK ({} user(s))",
        out["data"]["users"].as_array().map_or(0, Vec::len)
    );

    for warning in filter.warnings() {
        println!("  Warning: {}", warning);
    }

    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}
