//! Scenario 3: Feature-flag gating
//!
//! `wpnav_run_workflow` sits behind `WPNAV_ENABLE_WORKFLOWS`. With the flag
//! off, nothing later in the pipeline can enable it: not an exact override,
//! not a role allow-list, not `tools_allow`. Switching the flag on in the
//! automation policy unlocks it and the call goes through.

use serde_json::json;

use wpnav_contracts::{
    error::{WpnavError, WpnavResult},
    execution::ExecutionContext,
    policy::FeatureFlags,
};
use wpnav_policy::{bind_config, ToolPolicyConfig};

use crate::catalog::reference_registry;
use crate::scenarios::WORKFLOWS_POLICY;

/// Every later layer tries to force the workflow tool on.
const FORCE_ON_POLICY: &str = r#"
[tools.overrides]
"wpnav_run_workflow" = true

[roles]
active = "automator"
tools_allow = ["workflows:*"]

[roles.definitions.automator]
allowed = ["wpnav_run_workflow", "core:*"]
"#;

/// Run Scenario 3: Feature-flag gating.
pub fn run_scenario() -> WpnavResult<()> {
    println!("=== Scenario 3: Feature-Flag Gating ===");
    println!();

    let registry = reference_registry(FeatureFlags::new())?;
    let ctx = ExecutionContext::new().with_role("automator");
    let args = json!({ "workflow": "publish-weekly-digest" });

    // ── Flag off: every layer asks for the tool, none can grant it ───────────

    let forced = ToolPolicyConfig::from_toml_str(FORCE_ON_POLICY)?;
    let filter = bind_config(&registry, &forced);
    println!("  Policy: override + role allow + tools_allow all name the workflow tool");
    println!("  Enabled: {}", filter.enabled_names().collect::<Vec<_>>().join(", "));
    match registry.execute("wpnav_run_workflow", &args, &ctx) {
        Err(WpnavError::ToolDisabled { reason, .. }) => {
            println!("  Call wpnav_run_workflow: REJECTED ({})", reason);
        }
        Ok(_) => println!("  Call wpnav_run_workflow: unexpectedly allowed"),
        Err(e) => return Err(e),
    }
    println!();

    // ── Flag on via the automation policy ────────────────────────────────────

    let automation = ToolPolicyConfig::from_toml_str(WORKFLOWS_POLICY)?;
    let filter = bind_config(&registry, &automation);
    println!(
        "  Policy: automation ({} of {} tools enabled)",
        filter.enabled_count(),
        registry.len()
    );
    let out = registry.execute("wpnav_run_workflow", &args, &ctx)?;
    println!(
        "  Call wpnav_run_workflow: OK (workflow '{}', dry run)",
        out["data"]["workflow"].as_str().unwrap_or("?")
    );

    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A disabled flag is final regardless of later layers.
    #[test]
    fn test_flag_off_cannot_be_overridden() {
        let registry = reference_registry(FeatureFlags::new()).unwrap();
        let config = ToolPolicyConfig::from_toml_str(FORCE_ON_POLICY).unwrap();
        let filter = bind_config(&registry, &config);

        assert!(!filter.is_enabled("wpnav_run_workflow"));
        assert_eq!(
            registry.explain("wpnav_run_workflow").as_deref(),
            Some("requires feature flag 'WPNAV_ENABLE_WORKFLOWS'")
        );

        let mut names: Vec<&str> = filter.enabled_names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["wpnav_help", "wpnav_introspect"]);
    }

    /// The automation policy enables the flag and trims destructive tools.
    #[test]
    fn test_automation_policy() {
        let registry = reference_registry(FeatureFlags::new()).unwrap();
        let config = ToolPolicyConfig::from_toml_str(WORKFLOWS_POLICY).unwrap();
        let filter = bind_config(&registry, &config);

        assert_eq!(filter.enabled_count(), 12);
        assert!(filter.is_enabled("wpnav_run_workflow"));
        assert_eq!(
            registry.explain("wpnav_activate_plugin").as_deref(),
            Some("disabled by tools_deny pattern 'wpnav_activate_plugin'")
        );

        let ctx = ExecutionContext::new();
        let out = registry
            .execute("wpnav_run_workflow", &json!({ "workflow": "nightly" }), &ctx)
            .unwrap();
        assert_eq!(out["data"]["workflow"], "nightly");
    }

    #[test]
    fn test_scenario_runs() {
        run_scenario().unwrap();
    }
}
