//! Policy inputs consumed by the filter compiler.
//!
//! These types are what configuration loading produces: the feature flag
//! map, manifest category rules and pattern overrides, a role definition
//! and the project-level role overrides. None of them carries behaviour;
//! the compiler in wpnav-policy gives them meaning.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::tool::ToolCategory;

/// Process configuration flags, keyed by flag name.
///
/// A flag that is absent is treated exactly like a flag set to `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureFlags {
    inner: HashMap<String, bool>,
}

impl FeatureFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `flag` to `value`, replacing any previous value.
    pub fn set(&mut self, flag: impl Into<String>, value: bool) {
        self.inner.insert(flag.into(), value);
    }

    /// Builder form of [`FeatureFlags::set`].
    pub fn with(mut self, flag: impl Into<String>, value: bool) -> Self {
        self.set(flag, value);
        self
    }

    /// Return true only if `flag` is present and set to `true`.
    pub fn is_enabled(&self, flag: &str) -> bool {
        self.inner.get(flag).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for FeatureFlags {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Manifest-level category allow/deny lists.
///
/// Category names stay as strings so that a typo surfaces as a compiler
/// warning instead of a parse failure. When `enabled` is absent every
/// category starts enabled; `disabled` always wins over `enabled`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<String>>,
}

impl CategoryRules {
    pub fn with_enabled(mut self, categories: impl IntoIterator<Item = ToolCategory>) -> Self {
        self.enabled = Some(categories.into_iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_disabled(mut self, categories: impl IntoIterator<Item = ToolCategory>) -> Self {
        self.disabled = Some(categories.into_iter().map(|c| c.to_string()).collect());
        self
    }
}

/// Pattern → enabled overrides from the manifest.
///
/// Keys are exact tool names, `prefix*` wildcards or `category:*` bindings.
/// A `BTreeMap` keeps warning output stable; the compiler never relies on
/// the key order for the enablement result.
pub type PatternOverrides = BTreeMap<String, bool>;

/// A named bundle of allow/deny patterns.
///
/// `allowed`, when present, is an exclusive allow-list. `denied` subtracts
/// from whatever is otherwise enabled, including the allow-list outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Filled from the table key when loaded from a configuration document.
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denied: Option<Vec<String>>,
}

impl RoleDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn allow<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.allowed = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn deny<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.denied = Some(patterns.into_iter().map(Into::into).collect());
        self
    }
}

/// Project-level adjustments applied on top of the active role.
///
/// Highest precedence of all layers. A tool matched by both lists ends up
/// disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_allow: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_deny: Option<Vec<String>>,
}

impl RoleOverrides {
    pub fn is_empty(&self) -> bool {
        self.tools_allow.is_none() && self.tools_deny.is_none()
    }
}
