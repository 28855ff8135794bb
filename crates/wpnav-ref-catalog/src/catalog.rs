//! The reference tool catalog: seventeen WordPress tools across ten
//! categories, one of them behind a feature flag.

use std::sync::Arc;

use serde_json::{json, Value};

use wpnav_contracts::{
    error::WpnavResult,
    policy::FeatureFlags,
    tool::{ToolCategory, ToolSpec},
};
use wpnav_core::{registry::ToolRegistry, traits::ToolHandler};

use crate::mock_site::MockSiteHandler;

/// Gates `wpnav_run_workflow`. Off unless configured.
pub const WORKFLOWS_FLAG: &str = "WPNAV_ENABLE_WORKFLOWS";

struct Entry {
    name: &'static str,
    alias: Option<&'static str>,
    category: ToolCategory,
    flag: Option<&'static str>,
    description: &'static str,
    /// Required argument names, for the input schema.
    required: &'static [&'static str],
}

const fn entry(
    name: &'static str,
    category: ToolCategory,
    description: &'static str,
    required: &'static [&'static str],
) -> Entry {
    Entry {
        name,
        alias: None,
        category,
        flag: None,
        description,
        required,
    }
}

const ENTRIES: [Entry; 17] = [
    Entry {
        alias: Some("wpnav_about"),
        ..entry("wpnav_introspect", ToolCategory::Core, "Describe the connected site", &[])
    },
    entry("wpnav_help", ToolCategory::Core, "List help topics", &[]),
    entry("wpnav_list_posts", ToolCategory::Content, "List posts", &[]),
    Entry {
        alias: Some("wpnav_read_post"),
        ..entry("wpnav_get_post", ToolCategory::Content, "Fetch one post", &["id"])
    },
    entry("wpnav_create_post", ToolCategory::Content, "Create a draft post", &["title"]),
    entry("wpnav_delete_post", ToolCategory::Content, "Delete a post", &["id"]),
    entry("wpnav_list_pages", ToolCategory::Content, "List pages", &[]),
    entry("wpnav_list_categories", ToolCategory::Taxonomy, "List post categories", &[]),
    entry("wpnav_list_users", ToolCategory::Users, "List users", &[]),
    entry("wpnav_delete_user", ToolCategory::Users, "Delete a user", &["id"]),
    entry("wpnav_list_plugins", ToolCategory::Plugins, "List installed plugins", &[]),
    entry("wpnav_activate_plugin", ToolCategory::Plugins, "Activate a plugin", &["slug"]),
    entry("wpnav_list_themes", ToolCategory::Themes, "List installed themes", &[]),
    Entry {
        flag: Some(WORKFLOWS_FLAG),
        ..entry("wpnav_run_workflow", ToolCategory::Workflows, "Run a saved workflow", &["workflow"])
    },
    entry("wpnav_batch_update", ToolCategory::Batch, "Apply several updates at once", &["operations"]),
    entry("wpnav_get_settings", ToolCategory::Settings, "Read general settings", &[]),
    entry("wpnav_search_tools", ToolCategory::Discovery, "Search the tool catalog", &["query"]),
];

fn input_schema(required: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = required
        .iter()
        .map(|arg| {
            let kind = match *arg {
                "id" => "integer",
                "operations" => "array",
                _ => "string",
            };
            (arg.to_string(), json!({ "type": kind }))
        })
        .collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Specs for every reference tool, in catalog order.
pub fn reference_specs() -> Vec<ToolSpec> {
    ENTRIES
        .iter()
        .map(|e| {
            let mut spec = ToolSpec::new(e.name, e.category)
                .with_description(e.description)
                .with_input_schema(input_schema(e.required));
            if let Some(alias) = e.alias {
                spec = spec.with_alias(alias);
            }
            if let Some(flag) = e.flag {
                spec = spec.with_feature_flag(flag);
            }
            spec
        })
        .collect()
}

/// Every reference tool paired with its mock handler.
pub fn reference_tools() -> Vec<(ToolSpec, Arc<dyn ToolHandler>)> {
    ENTRIES
        .iter()
        .zip(reference_specs())
        .map(|(e, spec)| {
            let handler: Arc<dyn ToolHandler> = Arc::new(MockSiteHandler::new(e.name));
            (spec, handler)
        })
        .collect()
}

/// A registry populated with the whole reference catalog.
pub fn reference_registry(feature_flags: FeatureFlags) -> WpnavResult<ToolRegistry> {
    let mut registry = ToolRegistry::new(feature_flags);
    registry.register_all(reference_tools())?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wpnav_contracts::{
        policy::{CategoryRules, FeatureFlags, PatternOverrides, RoleDefinition, RoleOverrides},
        tool::{ToolCategory, ToolSpec},
    };
    use wpnav_policy::{CompiledFilter, FilterCompiler, PolicyInputs};

    use super::*;

    fn catalog() -> Vec<Arc<ToolSpec>> {
        reference_specs().into_iter().map(Arc::new).collect()
    }

    fn sorted(filter: &CompiledFilter) -> Vec<&str> {
        let mut names: Vec<&str> = filter.enabled_names().collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn test_catalog_shape() {
        let specs = reference_specs();
        assert_eq!(specs.len(), 17);
        assert_eq!(
            specs.iter().filter(|s| s.feature_flag.is_some()).count(),
            1,
            "only the workflow tool is flag-gated"
        );
        assert_eq!(specs[3].input_schema["required"], json!(["id"]));
    }

    #[test]
    fn test_registry_holds_every_tool_once() {
        let registry = reference_registry(FeatureFlags::new()).unwrap();
        assert_eq!(registry.len(), 17);
        assert_eq!(registry.canonical_name("wpnav_read_post"), Some("wpnav_get_post"));
        assert_eq!(registry.by_category(ToolCategory::Content).len(), 5);
    }

    #[test]
    fn test_unconfigured_enables_all_but_flagged() {
        let flags = FeatureFlags::new();
        let filter = FilterCompiler::compile(&catalog(), &PolicyInputs::new(&flags));
        assert_eq!(filter.enabled_count(), 16);
        assert!(!filter.is_enabled("wpnav_run_workflow"));
    }

    #[test]
    fn test_enabled_categories_core_and_content() {
        let flags = FeatureFlags::new();
        let rules =
            CategoryRules::default().with_enabled([ToolCategory::Core, ToolCategory::Content]);
        let filter = FilterCompiler::compile(
            &catalog(),
            &PolicyInputs::new(&flags).with_category_rules(&rules),
        );

        assert_eq!(filter.enabled_count(), 7);
        for spec in filter.enabled_definitions() {
            assert!(matches!(spec.category, ToolCategory::Core | ToolCategory::Content));
        }
    }

    #[test]
    fn test_core_plus_list_override() {
        let flags = FeatureFlags::new();
        let rules = CategoryRules::default().with_enabled([ToolCategory::Core]);
        let overrides: PatternOverrides = [("wpnav_list_*".to_string(), true)].into_iter().collect();
        let filter = FilterCompiler::compile(
            &catalog(),
            &PolicyInputs::new(&flags)
                .with_category_rules(&rules)
                .with_overrides(&overrides),
        );

        assert_eq!(
            sorted(&filter),
            vec![
                "wpnav_help",
                "wpnav_introspect",
                "wpnav_list_categories",
                "wpnav_list_pages",
                "wpnav_list_plugins",
                "wpnav_list_posts",
                "wpnav_list_themes",
                "wpnav_list_users",
            ]
        );
    }

    #[test]
    fn test_role_denied_patterns() {
        let flags = FeatureFlags::new();
        let role = RoleDefinition::new("no-destroy").deny(["wpnav_delete_*", "wpnav_list_users"]);
        let filter =
            FilterCompiler::compile(&catalog(), &PolicyInputs::new(&flags).with_role(&role));

        assert_eq!(filter.enabled_count(), 13);
        for name in ["wpnav_delete_post", "wpnav_delete_user", "wpnav_list_users"] {
            assert!(!filter.is_enabled(name), "{name} should be denied");
        }
        assert!(filter.warnings().is_empty());
    }

    #[test]
    fn test_role_allow_plus_tools_allow() {
        let flags = FeatureFlags::new();
        let role = RoleDefinition::new("observer").allow(["wpnav_introspect"]);
        let role_overrides = RoleOverrides {
            tools_allow: Some(vec!["wpnav_list_users".to_string()]),
            tools_deny: None,
        };
        let filter = FilterCompiler::compile(
            &catalog(),
            &PolicyInputs::new(&flags)
                .with_role(&role)
                .with_role_overrides(&role_overrides),
        );

        assert_eq!(sorted(&filter), vec!["wpnav_introspect", "wpnav_list_users"]);
    }

    #[test]
    fn test_enumeration_is_deduplicated_across_aliases() {
        let registry = reference_registry(FeatureFlags::new()).unwrap();
        let names = registry.enabled_names();

        assert_eq!(names.len(), 16);
        assert!(names.contains(&"wpnav_introspect".to_string()));
        assert!(!names.contains(&"wpnav_about".to_string()));
        assert!(!names.contains(&"wpnav_read_post".to_string()));
        assert!(registry.is_enabled("wpnav_about"));
    }
}
