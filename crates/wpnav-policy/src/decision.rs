//! Per-tool decisions recorded during compilation.
//!
//! Each tool's decision names the last layer that set its state and the
//! rule (pattern, category or flag) responsible, so a diagnostic can say
//! exactly why a tool is unavailable.

use std::fmt;

use serde::Serialize;

/// The compilation layer that produced a decision, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionLayer {
    /// Nothing configured touched the tool.
    Default,
    /// The tool's feature flag is off. Final; no later layer applies.
    FeatureFlag,
    CategoryBaseline,
    PatternOverride,
    RoleAllowList,
    RoleDenied,
    RoleOverrideAllow,
    RoleOverrideDeny,
}

/// The final enablement state of one tool and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub enabled: bool,
    pub layer: DecisionLayer,
    /// The flag, category or pattern responsible, when there is one.
    pub rule: Option<String>,
}

impl Decision {
    pub(crate) fn new(enabled: bool, layer: DecisionLayer, rule: Option<String>) -> Self {
        Self {
            enabled,
            layer,
            rule,
        }
    }

    pub(crate) fn by_default() -> Self {
        Self::new(true, DecisionLayer::Default, None)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.rule.as_deref().unwrap_or("");
        match (self.layer, self.enabled) {
            (DecisionLayer::Default, _) => f.write_str("enabled by default"),
            (DecisionLayer::FeatureFlag, _) => write!(f, "requires feature flag '{}'", rule),
            (DecisionLayer::CategoryBaseline, true) => {
                write!(f, "enabled by category '{}'", rule)
            }
            (DecisionLayer::CategoryBaseline, false) => {
                write!(f, "disabled by category '{}'", rule)
            }
            (DecisionLayer::PatternOverride, true) => write!(f, "enabled by override '{}'", rule),
            (DecisionLayer::PatternOverride, false) => {
                write!(f, "disabled by override '{}'", rule)
            }
            (DecisionLayer::RoleAllowList, true) => {
                write!(f, "enabled by role allow pattern '{}'", rule)
            }
            (DecisionLayer::RoleAllowList, false) => match &self.rule {
                Some(role) => write!(f, "not in the allow-list of role '{}'", role),
                None => f.write_str("not in the role allow-list"),
            },
            (DecisionLayer::RoleDenied, _) => write!(f, "disabled by role deny pattern '{}'", rule),
            (DecisionLayer::RoleOverrideAllow, _) => {
                write!(f, "enabled by tools_allow pattern '{}'", rule)
            }
            (DecisionLayer::RoleOverrideDeny, _) => {
                write!(f, "disabled by tools_deny pattern '{}'", rule)
            }
        }
    }
}
