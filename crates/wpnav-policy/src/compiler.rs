//! The filter compiler.
//!
//! Folds the four policy sources into one `CompiledFilter`. Layers run in a
//! fixed order and each later layer overrides the earlier ones:
//!
//! 1. Feature flags. A flagged tool whose flag is not `true` is locked
//!    disabled; no later layer can re-enable it.
//! 2. Category baseline. `enabled` (when present) is an allow-list of
//!    categories; `disabled` always wins over `enabled`.
//! 3. Pattern overrides. Where several overrides match one tool, the most
//!    specific pattern decides. Equally specific patterns that disagree
//!    disable the tool and produce a warning.
//! 4. Active role. `allowed` recomputes state as an exclusive allow-list,
//!    then `denied` subtracts.
//! 5. Role overrides. `tools_allow` enables, then `tools_deny` disables.
//!
//! Within a layer every decision is computed from the previous layer's
//! state, so the result never depends on map or set iteration order.
//! Compilation cannot fail: unmatched or malformed rules become warnings.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use wpnav_contracts::{
    policy::{CategoryRules, FeatureFlags, PatternOverrides, RoleDefinition, RoleOverrides},
    tool::{ToolCategory, ToolSpec},
};

use crate::{
    decision::{Decision, DecisionLayer},
    filter::CompiledFilter,
    pattern::{PatternKind, ToolPattern},
};

/// Everything one compilation reads besides the catalog.
///
/// Only the feature flags are mandatory; every other source is optional and
/// an absent source leaves the previous layer's result untouched.
#[derive(Debug, Clone, Copy)]
pub struct PolicyInputs<'a> {
    pub feature_flags: &'a FeatureFlags,
    pub category_rules: Option<&'a CategoryRules>,
    pub overrides: Option<&'a PatternOverrides>,
    pub role: Option<&'a RoleDefinition>,
    pub role_overrides: Option<&'a RoleOverrides>,
}

impl<'a> PolicyInputs<'a> {
    pub fn new(feature_flags: &'a FeatureFlags) -> Self {
        Self {
            feature_flags,
            category_rules: None,
            overrides: None,
            role: None,
            role_overrides: None,
        }
    }

    pub fn with_category_rules(mut self, rules: &'a CategoryRules) -> Self {
        self.category_rules = Some(rules);
        self
    }

    pub fn with_overrides(mut self, overrides: &'a PatternOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn with_role(mut self, role: &'a RoleDefinition) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_role_overrides(mut self, role_overrides: &'a RoleOverrides) -> Self {
        self.role_overrides = Some(role_overrides);
        self
    }
}

/// Compiles policy inputs against a tool catalog.
pub struct FilterCompiler;

impl FilterCompiler {
    /// Compile `inputs` against `catalog` into a fresh `CompiledFilter`.
    ///
    /// Duplicate entries in `catalog` (same canonical name) are ignored after
    /// the first, with a warning.
    pub fn compile(catalog: &[Arc<ToolSpec>], inputs: &PolicyInputs<'_>) -> CompiledFilter {
        Self::compile_with_warnings(catalog, inputs, Vec::new())
    }

    /// As [`FilterCompiler::compile`], prepending `warnings` produced by the
    /// caller while assembling the inputs.
    pub(crate) fn compile_with_warnings(
        catalog: &[Arc<ToolSpec>],
        inputs: &PolicyInputs<'_>,
        warnings: Vec<String>,
    ) -> CompiledFilter {
        let mut pass = Pass::new(catalog, warnings);

        pass.apply_feature_flags(inputs.feature_flags);
        if let Some(rules) = inputs.category_rules {
            pass.apply_category_rules(rules);
        }
        if let Some(overrides) = inputs.overrides {
            pass.apply_overrides(overrides);
        }
        if let Some(role) = inputs.role {
            pass.apply_role(role);
        }
        if let Some(role_overrides) = inputs.role_overrides {
            pass.apply_role_overrides(role_overrides);
        }

        let role = inputs.role.map(|r| r.name.clone()).filter(|n| !n.is_empty());
        pass.finish(role)
    }
}

// ── Compilation pass ─────────────────────────────────────────────────────────

/// Working state for one compilation. `decisions[i]` and `locked[i]` belong
/// to `tools[i]`.
struct Pass {
    tools: Vec<Arc<ToolSpec>>,
    /// Alias → canonical name, for resolving exact patterns.
    aliases: HashMap<String, String>,
    decisions: Vec<Decision>,
    /// Set by the feature-flag layer; locked tools ignore every later layer.
    locked: Vec<bool>,
    warnings: Vec<String>,
}

impl Pass {
    fn new(catalog: &[Arc<ToolSpec>], mut warnings: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(catalog.len());
        for spec in catalog {
            if seen.insert(spec.name.as_str()) {
                tools.push(Arc::clone(spec));
            } else {
                warnings.push(format!(
                    "catalog: duplicate tool '{}' ignored after first entry",
                    spec.name
                ));
            }
        }

        let aliases = tools
            .iter()
            .flat_map(|spec| {
                spec.aliases
                    .iter()
                    .map(move |alias| (alias.clone(), spec.name.clone()))
            })
            .collect();

        let n = tools.len();
        Self {
            tools,
            aliases,
            decisions: vec![Decision::by_default(); n],
            locked: vec![false; n],
            warnings,
        }
    }

    fn enabled_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.enabled).count()
    }

    /// Overwrite the decision for tool `i` unless the flag layer locked it.
    fn set(&mut self, i: usize, decision: Decision) {
        if !self.locked[i] {
            self.decisions[i] = decision;
        }
    }

    // ── Layer 1 ───────────────────────────────────────────────────────────────

    fn apply_feature_flags(&mut self, flags: &FeatureFlags) {
        for i in 0..self.tools.len() {
            if let Some(flag) = self.tools[i].feature_flag.as_deref() {
                if !flags.is_enabled(flag) {
                    self.decisions[i] =
                        Decision::new(false, DecisionLayer::FeatureFlag, Some(flag.to_string()));
                    self.locked[i] = true;
                }
            }
        }
        debug!(
            locked = self.locked.iter().filter(|l| **l).count(),
            enabled = self.enabled_count(),
            "feature flag gate applied"
        );
    }

    // ── Layer 2 ───────────────────────────────────────────────────────────────

    fn apply_category_rules(&mut self, rules: &CategoryRules) {
        let enabled = self.category_set("tools.enabled", rules.enabled.as_deref());
        let disabled = self
            .category_set("tools.disabled", rules.disabled.as_deref())
            .unwrap_or_default();

        for i in 0..self.tools.len() {
            let category = self.tools[i].category;
            let state = if disabled.contains(&category) {
                Some(false)
            } else {
                enabled.as_ref().map(|set| set.contains(&category))
            };
            if let Some(state) = state {
                let decision = Decision::new(
                    state,
                    DecisionLayer::CategoryBaseline,
                    Some(category.to_string()),
                );
                self.set(i, decision);
            }
        }
        debug!(enabled = self.enabled_count(), "category baseline applied");
    }

    /// Parse category names, warning on and skipping unknown ones.
    fn category_set(
        &mut self,
        source: &str,
        names: Option<&[String]>,
    ) -> Option<HashSet<ToolCategory>> {
        let names = names?;
        let mut set = HashSet::with_capacity(names.len());
        for name in names {
            match ToolCategory::from_str(name) {
                Ok(category) => {
                    set.insert(category);
                }
                Err(_) => self
                    .warnings
                    .push(format!("{}: unknown category '{}'", source, name)),
            }
        }
        Some(set)
    }

    // ── Layer 3 ───────────────────────────────────────────────────────────────

    fn apply_overrides(&mut self, overrides: &PatternOverrides) {
        let rules: Vec<(ToolPattern, bool)> = overrides
            .iter()
            .map(|(raw, value)| (self.resolve("tools.overrides", raw), *value))
            .collect();

        for i in 0..self.tools.len() {
            let spec = Arc::clone(&self.tools[i]);
            let matching: Vec<&(ToolPattern, bool)> =
                rules.iter().filter(|(p, _)| p.matches(&spec)).collect();
            let Some(top) = matching.iter().map(|(p, _)| p.specificity()).max() else {
                continue;
            };
            let winners: Vec<&(ToolPattern, bool)> = matching
                .into_iter()
                .filter(|(p, _)| p.specificity() == top)
                .collect();

            let agreed = winners.iter().all(|(_, v)| *v == winners[0].1);
            let decision = if agreed {
                Decision::new(
                    winners[0].1,
                    DecisionLayer::PatternOverride,
                    Some(winners[0].0.to_string()),
                )
            } else {
                let patterns = winners
                    .iter()
                    .map(|(p, v)| format!("'{}' = {}", p, v))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.warnings.push(format!(
                    "tools.overrides: conflicting overrides for '{}' ({}); disabling",
                    spec.name, patterns
                ));
                let rule = winners
                    .iter()
                    .find(|(_, v)| !*v)
                    .map(|(p, _)| p.to_string());
                Decision::new(false, DecisionLayer::PatternOverride, rule)
            };
            self.set(i, decision);
        }
        debug!(
            rules = rules.len(),
            enabled = self.enabled_count(),
            "pattern overrides applied"
        );
    }

    // ── Layer 4 ───────────────────────────────────────────────────────────────

    fn apply_role(&mut self, role: &RoleDefinition) {
        let label = if role.name.is_empty() {
            "role".to_string()
        } else {
            format!("role '{}'", role.name)
        };
        let allowed = self.resolve_list(&format!("{} allowed", label), role.allowed.as_deref());
        let denied = self.resolve_list(&format!("{} denied", label), role.denied.as_deref());
        let role_name = Some(role.name.clone()).filter(|n| !n.is_empty());

        if let Some(allowed) = &allowed {
            for i in 0..self.tools.len() {
                let decision = match first_match(allowed, &self.tools[i]) {
                    Some(pattern) => Decision::new(
                        true,
                        DecisionLayer::RoleAllowList,
                        Some(pattern.to_string()),
                    ),
                    None => Decision::new(false, DecisionLayer::RoleAllowList, role_name.clone()),
                };
                self.set(i, decision);
            }
        }

        if let Some(denied) = &denied {
            for i in 0..self.tools.len() {
                if let Some(pattern) = first_match(denied, &self.tools[i]) {
                    let decision =
                        Decision::new(false, DecisionLayer::RoleDenied, Some(pattern.to_string()));
                    self.set(i, decision);
                }
            }
        }
        debug!(role = %role.name, enabled = self.enabled_count(), "role applied");
    }

    // ── Layer 5 ───────────────────────────────────────────────────────────────

    fn apply_role_overrides(&mut self, role_overrides: &RoleOverrides) {
        let allow = self.resolve_list("roles.tools_allow", role_overrides.tools_allow.as_deref());
        let deny = self.resolve_list("roles.tools_deny", role_overrides.tools_deny.as_deref());

        for i in 0..self.tools.len() {
            let allowed_by = allow.as_deref().and_then(|p| first_match(p, &self.tools[i]));
            let denied_by = deny.as_deref().and_then(|p| first_match(p, &self.tools[i]));

            let decision = match (allowed_by, denied_by) {
                (_, Some(pattern)) => Decision::new(
                    false,
                    DecisionLayer::RoleOverrideDeny,
                    Some(pattern.to_string()),
                ),
                (Some(pattern), None) => Decision::new(
                    true,
                    DecisionLayer::RoleOverrideAllow,
                    Some(pattern.to_string()),
                ),
                (None, None) => continue,
            };
            self.set(i, decision);
        }
        debug!(enabled = self.enabled_count(), "role overrides applied");
    }

    // ── Pattern resolution ────────────────────────────────────────────────────

    fn resolve_list(&mut self, source: &str, raws: Option<&[String]>) -> Option<Vec<ToolPattern>> {
        raws.map(|raws| raws.iter().map(|raw| self.resolve(source, raw)).collect())
    }

    /// Parse `raw`, map an aliased exact name to its canonical tool, and warn
    /// when the pattern cannot select anything in the catalog.
    fn resolve(&mut self, source: &str, raw: &str) -> ToolPattern {
        let mut pattern = ToolPattern::parse(raw);

        if let PatternKind::Exact(name) = pattern.kind() {
            if let Some(canonical) = self.aliases.get(name) {
                self.warnings.push(format!(
                    "{}: '{}' is an alias of '{}'; matching the canonical name",
                    source, name, canonical
                ));
                pattern = ToolPattern::exact(canonical.clone());
            }
        }

        let matched = pattern.matches_any(self.tools.iter().map(|spec| spec.as_ref()));
        if !matched {
            let warning = match pattern.kind() {
                PatternKind::Exact(name) => format!("{}: unknown tool '{}'", source, name),
                PatternKind::Category { name, category: None } => {
                    format!("{}: unknown category '{}' in pattern '{}'", source, name, raw)
                }
                PatternKind::Prefix(_) | PatternKind::Category { .. } => {
                    format!("{}: pattern '{}' matched no tools", source, raw)
                }
            };
            self.warnings.push(warning);
        }
        pattern
    }

    fn finish(self, role: Option<String>) -> CompiledFilter {
        debug!(
            tools = self.tools.len(),
            enabled = self.enabled_count(),
            warnings = self.warnings.len(),
            "filter compiled"
        );
        let decided = self.tools.into_iter().zip(self.decisions).collect();
        CompiledFilter::new(role, decided, self.warnings)
    }
}

/// The first pattern in declaration order that matches `spec`.
fn first_match<'p>(patterns: &'p [ToolPattern], spec: &ToolSpec) -> Option<&'p ToolPattern> {
    patterns.iter().find(|p| p.matches(spec))
}

// ── Tests ────────────────────────────────────────────────────────────────────
