//! TOML configuration for the tool gate.
//!
//! A `ToolPolicyConfig` bundles every policy source the compiler reads.
//! Every section is optional; an empty document compiles to "everything not
//! flag-gated is enabled".
//!
//! Example:
//! ```toml
//! [features]
//! WPNAV_ENABLE_WORKFLOWS = true
//!
//! [tools]
//! enabled = ["core", "content"]
//! disabled = ["users"]
//!
//! [tools.overrides]
//! "wpnav_list_*" = true
//!
//! [roles]
//! active = "editor"
//! tools_deny = ["wpnav_delete_*"]
//!
//! [roles.definitions.editor]
//! allowed = ["content:*", "wpnav_introspect"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use wpnav_contracts::{
    error::{WpnavError, WpnavResult},
    policy::{CategoryRules, FeatureFlags, PatternOverrides, RoleDefinition, RoleOverrides},
    tool::ToolSpec,
};

use crate::compiler::{FilterCompiler, PolicyInputs};
use crate::filter::CompiledFilter;

/// The `[tools]` section: manifest category rules and pattern overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: PatternOverrides,
}

/// The `[roles]` section: the active role, role overrides and inline role
/// definitions keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolesSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_allow: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_deny: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub definitions: BTreeMap<String, RoleDefinition>,
}

/// The top-level structure deserialized from a TOML policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPolicyConfig {
    #[serde(default)]
    pub features: FeatureFlags,

    #[serde(default)]
    pub tools: ToolsSection,

    #[serde(default)]
    pub roles: RolesSection,
}

impl ToolPolicyConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `WpnavError::ConfigError` if the TOML is malformed or does
    /// not match the expected schema. Role definitions take their name from
    /// their table key.
    pub fn from_toml_str(s: &str) -> WpnavResult<Self> {
        let mut config: ToolPolicyConfig =
            toml::from_str(s).map_err(|e| WpnavError::ConfigError {
                reason: format!("failed to parse tool policy TOML: {}", e),
            })?;
        for (key, role) in config.roles.definitions.iter_mut() {
            role.name = key.clone();
        }
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML.
    pub fn from_file(path: &Path) -> WpnavResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| WpnavError::ConfigError {
            reason: format!("failed to read tool policy file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// A copy of this configuration with `role` as the active role.
    ///
    /// `None` deactivates the role; role overrides still apply.
    pub fn with_role(&self, role: Option<&str>) -> Self {
        let mut next = self.clone();
        next.roles.active = role.map(str::to_string);
        next
    }

    /// Category rules, or `None` when neither list is configured.
    pub fn category_rules(&self) -> Option<CategoryRules> {
        if self.tools.enabled.is_none() && self.tools.disabled.is_none() {
            return None;
        }
        Some(CategoryRules {
            enabled: self.tools.enabled.clone(),
            disabled: self.tools.disabled.clone(),
        })
    }

    /// Role overrides, or `None` when neither list is configured.
    pub fn role_overrides(&self) -> Option<RoleOverrides> {
        let overrides = RoleOverrides {
            tools_allow: self.roles.tools_allow.clone(),
            tools_deny: self.roles.tools_deny.clone(),
        };
        (!overrides.is_empty()).then_some(overrides)
    }

    /// The definition of the active role, if one is selected and defined.
    pub fn active_role(&self) -> Option<&RoleDefinition> {
        let name = self.roles.active.as_deref()?;
        self.roles.definitions.get(name)
    }

    /// Names of every inline role definition, sorted.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.definitions.keys().map(String::as_str)
    }

    /// Compile this configuration against `catalog`.
    ///
    /// An active role name with no definition produces a warning and the
    /// compilation proceeds as if no role were active.
    pub fn compile(&self, catalog: &[Arc<ToolSpec>]) -> CompiledFilter {
        let mut warnings = Vec::new();
        if let Some(name) = self.roles.active.as_deref() {
            if !self.roles.definitions.contains_key(name) {
                warnings.push(format!(
                    "roles.active: role '{}' is not defined; no role applied",
                    name
                ));
            }
        }

        let category_rules = self.category_rules();
        let role_overrides = self.role_overrides();

        let mut inputs = PolicyInputs::new(&self.features);
        if let Some(rules) = &category_rules {
            inputs = inputs.with_category_rules(rules);
        }
        if !self.tools.overrides.is_empty() {
            inputs = inputs.with_overrides(&self.tools.overrides);
        }
        if let Some(role) = self.active_role() {
            inputs = inputs.with_role(role);
        }
        if let Some(role_overrides) = &role_overrides {
            inputs = inputs.with_role_overrides(role_overrides);
        }

        FilterCompiler::compile_with_warnings(catalog, &inputs, warnings)
    }
}
