//! Tool records and the closed category enumeration.
//!
//! A `ToolSpec` is the data half of a capability: its canonical name, the
//! aliases it also answers to, its category and the feature flag (if any)
//! that must be on before any policy may enable it. The handler half lives
//! in wpnav-core. Specs are created once at startup and never mutated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WpnavError;

/// Coarse-grained grouping used by category rules and `category:*` patterns.
///
/// Serialized in snake_case, e.g. `"content"` or `"maintenance"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Core,
    Content,
    Taxonomy,
    Users,
    Plugins,
    Themes,
    Workflows,
    Cookbook,
    Roles,
    Batch,
    Settings,
    Analytics,
    Discovery,
    Maintenance,
    Auth,
}

impl ToolCategory {
    /// Every category, in declaration order.
    pub const ALL: [ToolCategory; 15] = [
        ToolCategory::Core,
        ToolCategory::Content,
        ToolCategory::Taxonomy,
        ToolCategory::Users,
        ToolCategory::Plugins,
        ToolCategory::Themes,
        ToolCategory::Workflows,
        ToolCategory::Cookbook,
        ToolCategory::Roles,
        ToolCategory::Batch,
        ToolCategory::Settings,
        ToolCategory::Analytics,
        ToolCategory::Discovery,
        ToolCategory::Maintenance,
        ToolCategory::Auth,
    ];

    /// The wire name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Core => "core",
            ToolCategory::Content => "content",
            ToolCategory::Taxonomy => "taxonomy",
            ToolCategory::Users => "users",
            ToolCategory::Plugins => "plugins",
            ToolCategory::Themes => "themes",
            ToolCategory::Workflows => "workflows",
            ToolCategory::Cookbook => "cookbook",
            ToolCategory::Roles => "roles",
            ToolCategory::Batch => "batch",
            ToolCategory::Settings => "settings",
            ToolCategory::Analytics => "analytics",
            ToolCategory::Discovery => "discovery",
            ToolCategory::Maintenance => "maintenance",
            ToolCategory::Auth => "auth",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolCategory {
    type Err = WpnavError;

    /// Parse a wire name. Matching is exact and case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| WpnavError::UnknownCategory { name: s.to_string() })
    }
}

/// The declarative description of one tool.
///
/// `input_schema` is opaque to the gate; it is advertised to the client
/// as-is and never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Canonical, unique identifier (e.g. `"wpnav_list_posts"`).
    pub name: String,

    /// Additional names that resolve to this tool.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// The single category this tool belongs to.
    pub category: ToolCategory,

    /// Feature flag that must be `true` for the tool to ever be enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_flag: Option<String>,

    /// Human-readable summary shown to the client.
    #[serde(default)]
    pub description: String,

    /// JSON Schema for the tool's arguments.
    #[serde(default)]
    pub input_schema: serde_json::Value,
}

impl ToolSpec {
    /// Create a spec with no aliases, no flag and an empty schema.
    pub fn new(name: impl Into<String>, category: ToolCategory) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            category,
            feature_flag: None,
            description: String::new(),
            input_schema: serde_json::Value::Null,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_feature_flag(mut self, flag: impl Into<String>) -> Self {
        self.feature_flag = Some(flag.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_input_schema(mut self, schema: serde_json::Value) -> Self {
        self.input_schema = schema;
        self
    }
}
