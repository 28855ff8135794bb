//! Compile a policy against a registry's catalog and publish the result.
//!
//! Compilation happens entirely off to the side; the registry sees the new
//! filter only at the final `bind_filter` swap. Callers that recompile on a
//! role change keep serving requests against the previous filter until then.

use std::sync::Arc;

use tracing::{info, warn};

use wpnav_core::registry::ToolRegistry;

use crate::compiler::{FilterCompiler, PolicyInputs};
use crate::config::ToolPolicyConfig;
use crate::filter::CompiledFilter;

/// Compile `config` against every tool in `registry` and bind the result.
///
/// The registry's own feature-flag map is replaced with the configuration's
/// flags first, so the unbound fallback agrees with the compiled filter if
/// the filter is later cleared.
pub fn bind_config(registry: &ToolRegistry, config: &ToolPolicyConfig) -> Arc<CompiledFilter> {
    registry.set_feature_flags(config.features.clone());
    let filter = config.compile(&registry.catalog());
    publish(registry, filter)
}

/// Compile explicit `inputs` against every tool in `registry` and bind the result.
pub fn compile_and_bind(registry: &ToolRegistry, inputs: &PolicyInputs<'_>) -> Arc<CompiledFilter> {
    let filter = FilterCompiler::compile(&registry.catalog(), inputs);
    publish(registry, filter)
}

fn publish(registry: &ToolRegistry, filter: CompiledFilter) -> Arc<CompiledFilter> {
    for message in filter.warnings() {
        warn!(filter = %filter.id().0, %message, "tool policy warning");
    }
    info!(
        filter = %filter.id().0,
        role = filter.role().unwrap_or("none"),
        enabled = filter.enabled_count(),
        total = registry.len(),
        warnings = filter.warnings().len(),
        "tool policy compiled"
    );

    let filter = Arc::new(filter);
    registry.bind_filter(filter.clone());
    filter
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use wpnav_contracts::{
        error::{WpnavError, WpnavResult},
        execution::ExecutionContext,
        policy::{FeatureFlags, RoleDefinition},
        tool::{ToolCategory, ToolSpec},
    };
    use wpnav_core::{
        registry::ToolRegistry,
        traits::{ToolFilter, ToolHandler},
    };

    use super::{bind_config, compile_and_bind};
    use crate::compiler::PolicyInputs;
    use crate::config::ToolPolicyConfig;

    fn echo(args: &Value, _ctx: &ExecutionContext) -> WpnavResult<Value> {
        Ok(json!({ "echo": args }))
    }

    fn registry() -> ToolRegistry {
        let handler: Arc<dyn ToolHandler> = Arc::new(echo);
        let mut registry = ToolRegistry::new(FeatureFlags::new());
        registry
            .register_all(vec![
                (
                    ToolSpec::new("wpnav_introspect", ToolCategory::Core).with_alias("wpnav_about"),
                    Arc::clone(&handler),
                ),
                (
                    ToolSpec::new("wpnav_list_posts", ToolCategory::Content),
                    Arc::clone(&handler),
                ),
                (
                    ToolSpec::new("wpnav_delete_post", ToolCategory::Content),
                    Arc::clone(&handler),
                ),
                (
                    ToolSpec::new("wpnav_run_workflow", ToolCategory::Workflows)
                        .with_feature_flag("WPNAV_ENABLE_WORKFLOWS"),
                    Arc::clone(&handler),
                ),
            ])
            .unwrap();
        registry
    }

    #[test]
    fn bound_config_gates_execution() {
        let registry = registry();
        let config = ToolPolicyConfig::from_toml_str(
            r#"
            [tools.overrides]
            "wpnav_delete_*" = false
        "#,
        )
        .unwrap();

        let filter = bind_config(&registry, &config);
        assert_eq!(filter.enabled_count(), 2);

        let ctx = ExecutionContext::new();
        let out = registry
            .execute("wpnav_list_posts", &json!({ "per_page": 5 }), &ctx)
            .unwrap();
        assert_eq!(out, json!({ "echo": { "per_page": 5 } }));

        match registry.execute("wpnav_delete_post", &Value::Null, &ctx) {
            Err(WpnavError::ToolDisabled { name, reason }) => {
                assert_eq!(name, "wpnav_delete_post");
                assert_eq!(reason, "disabled by override 'wpnav_delete_*'");
            }
            other => panic!("expected ToolDisabled, got {:?}", other),
        }
    }

    #[test]
    fn alias_resolves_through_bound_filter() {
        let registry = registry();
        let config = ToolPolicyConfig::from_toml_str(
            r#"
            [tools]
            disabled = ["core"]
        "#,
        )
        .unwrap();
        bind_config(&registry, &config);

        assert!(!registry.is_enabled("wpnav_about"));
        assert_eq!(
            registry.explain("wpnav_about").as_deref(),
            Some("disabled by category 'core'")
        );
    }

    #[test]
    fn config_flags_reach_registry_fallback() {
        let registry = registry();
        let config = ToolPolicyConfig::from_toml_str(
            r#"
            [features]
            WPNAV_ENABLE_WORKFLOWS = true
        "#,
        )
        .unwrap();

        bind_config(&registry, &config);
        assert!(registry.is_enabled("wpnav_run_workflow"));

        registry.clear_filter();
        assert!(
            registry.is_enabled("wpnav_run_workflow"),
            "fallback uses the flags installed by bind_config"
        );
    }

    #[test]
    fn rebinding_replaces_the_visible_filter() {
        let registry = registry();
        let flags = FeatureFlags::new();
        let reader = RoleDefinition::new("reader").allow(["wpnav_list_*"]);

        let first = compile_and_bind(&registry, &PolicyInputs::new(&flags));
        assert_eq!(registry.enabled_names().len(), 3);

        let second = compile_and_bind(&registry, &PolicyInputs::new(&flags).with_role(&reader));
        assert_ne!(first.id(), second.id());
        assert_eq!(registry.enabled_names(), vec!["wpnav_list_posts".to_string()]);

        let bound = registry.current_filter().unwrap();
        assert_eq!(bound.label(), second.id().0.to_string());
    }
}
