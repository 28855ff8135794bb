//! The tool registry: canonical tool records plus the bound filter.
//!
//! Tools are registered once at startup. Each canonical tool occupies one
//! slot in an arena; its name and every alias map to that slot index, so
//! enumeration is deduplicated by identity rather than by name.
//!
//! Enablement questions go to the currently bound `ToolFilter`. With no
//! filter bound, the registry falls back to feature-flag gating alone:
//! an unflagged tool is enabled, a flagged tool is enabled iff its flag is on.
//!
//! Both the filter and the feature-flag map sit behind `RwLock<Arc<_>>`.
//! Readers clone the `Arc` and drop the lock immediately; writers build the
//! replacement off to the side and swap it in one assignment. A reader
//! therefore always sees one whole filter, old or new, never a mix.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tracing::{debug, info, warn};

use wpnav_contracts::{
    error::{WpnavError, WpnavResult},
    execution::ExecutionContext,
    policy::FeatureFlags,
    tool::{ToolCategory, ToolSpec},
};

use crate::traits::{ToolFilter, ToolHandler};

/// One canonical tool: its spec and the handler that performs it.
#[derive(Clone)]
pub struct RegisteredTool {
    spec: Arc<ToolSpec>,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn spec(&self) -> &Arc<ToolSpec> {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// The catalog of invocable tools and the policy currently gating them.
///
/// Construct with [`ToolRegistry::new`], register every tool, then share it
/// (typically as `Arc<ToolRegistry>`) with request handlers. Registration
/// takes `&mut self`; everything after startup works through `&self`.
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    /// Canonical names and aliases → index into `tools`.
    index: HashMap<String, usize>,
    feature_flags: RwLock<Arc<FeatureFlags>>,
    filter: RwLock<Option<Arc<dyn ToolFilter>>>,
}

impl ToolRegistry {
    /// Create an empty registry gated by `feature_flags` until a filter is bound.
    pub fn new(feature_flags: FeatureFlags) -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            feature_flags: RwLock::new(Arc::new(feature_flags)),
            filter: RwLock::new(None),
        }
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Register a tool under its canonical name and every alias.
    ///
    /// Fails with `DuplicateTool` if the canonical name is taken, and with
    /// `AliasCollision` if any alias (or the canonical name) clashes with an
    /// existing name or alias. A failed registration leaves the registry
    /// unchanged.
    pub fn register(&mut self, spec: ToolSpec, handler: Arc<dyn ToolHandler>) -> WpnavResult<()> {
        if let Some(&slot) = self.index.get(&spec.name) {
            let existing = self.tools[slot].name();
            return Err(if existing == spec.name {
                WpnavError::DuplicateTool {
                    name: spec.name.clone(),
                }
            } else {
                WpnavError::AliasCollision {
                    alias: spec.name.clone(),
                    existing: existing.to_string(),
                }
            });
        }

        for (i, alias) in spec.aliases.iter().enumerate() {
            let clash = if let Some(&slot) = self.index.get(alias) {
                Some(self.tools[slot].name().to_string())
            } else if *alias == spec.name || spec.aliases[..i].contains(alias) {
                Some(spec.name.clone())
            } else {
                None
            };
            if let Some(existing) = clash {
                return Err(WpnavError::AliasCollision {
                    alias: alias.clone(),
                    existing,
                });
            }
        }

        let slot = self.tools.len();
        self.index.insert(spec.name.clone(), slot);
        for alias in &spec.aliases {
            self.index.insert(alias.clone(), slot);
        }

        debug!(
            tool = %spec.name,
            category = %spec.category,
            aliases = spec.aliases.len(),
            "tool registered"
        );

        self.tools.push(RegisteredTool {
            spec: Arc::new(spec),
            handler,
        });
        Ok(())
    }

    /// Register every `(spec, handler)` pair, stopping at the first error.
    pub fn register_all(
        &mut self,
        tools: impl IntoIterator<Item = (ToolSpec, Arc<dyn ToolHandler>)>,
    ) -> WpnavResult<()> {
        for (spec, handler) in tools {
            self.register(spec, handler)?;
        }
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    /// Resolve a canonical name or alias to its registered tool.
    pub fn get(&self, name_or_alias: &str) -> Option<&RegisteredTool> {
        self.index.get(name_or_alias).map(|&slot| &self.tools[slot])
    }

    /// Resolve a canonical name or alias to its canonical name.
    pub fn canonical_name(&self, name_or_alias: &str) -> Option<&str> {
        self.get(name_or_alias).map(RegisteredTool::name)
    }

    /// Number of canonical tools (aliases not counted).
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Every canonical tool spec exactly once, in registration order,
    /// regardless of enablement. This is the compiler's input catalog.
    pub fn catalog(&self) -> Vec<Arc<ToolSpec>> {
        self.tools.iter().map(|t| Arc::clone(&t.spec)).collect()
    }

    /// Every canonical tool in `category`, regardless of enablement.
    pub fn by_category(&self, category: ToolCategory) -> Vec<Arc<ToolSpec>> {
        self.tools
            .iter()
            .filter(|t| t.spec.category == category)
            .map(|t| Arc::clone(&t.spec))
            .collect()
    }

    // ── Enablement ────────────────────────────────────────────────────────────

    /// Every currently enabled tool exactly once, in registration order.
    ///
    /// Evaluated against a single filter snapshot, so a concurrent rebind
    /// cannot produce a listing that mixes two policies.
    pub fn all_definitions(&self) -> Vec<Arc<ToolSpec>> {
        let gate = self.gate();
        self.tools
            .iter()
            .filter(|t| gate.allows(&t.spec))
            .map(|t| Arc::clone(&t.spec))
            .collect()
    }

    /// Canonical names of every currently enabled tool.
    pub fn enabled_names(&self) -> Vec<String> {
        self.all_definitions()
            .iter()
            .map(|spec| spec.name.clone())
            .collect()
    }

    /// Return true if the named tool (canonical or alias) is enabled.
    ///
    /// Unknown names are never enabled.
    pub fn is_enabled(&self, name_or_alias: &str) -> bool {
        match self.get(name_or_alias) {
            Some(tool) => self.gate().allows(&tool.spec),
            None => false,
        }
    }

    /// Resolve, check and invoke a tool.
    ///
    /// # Errors
    ///
    /// - `ToolNotFound` if no tool answers to `name_or_alias`.
    /// - `ToolDisabled` if the tool exists but is not enabled; the reason
    ///   names the feature flag when that flag was the cause.
    /// - Whatever the handler itself returns.
    pub fn execute(
        &self,
        name_or_alias: &str,
        args: &Value,
        ctx: &ExecutionContext,
    ) -> WpnavResult<Value> {
        let Some(tool) = self.get(name_or_alias) else {
            warn!(tool = %name_or_alias, request_id = %ctx.request_id.0, "unknown tool requested");
            return Err(WpnavError::ToolNotFound {
                name: name_or_alias.to_string(),
            });
        };

        let gate = self.gate();
        if !gate.allows(&tool.spec) {
            let reason = gate.explain(&tool.spec);
            warn!(
                tool = %tool.spec.name,
                requested_as = %name_or_alias,
                request_id = %ctx.request_id.0,
                reason = %reason,
                "disabled tool requested"
            );
            return Err(WpnavError::ToolDisabled {
                name: tool.spec.name.clone(),
                reason,
            });
        }
        drop(gate);

        debug!(
            tool = %tool.spec.name,
            request_id = %ctx.request_id.0,
            "dispatching tool"
        );
        tool.handler.call(args, ctx)
    }

    /// Explain why a tool (canonical or alias) is or is not enabled.
    ///
    /// Returns `None` for unknown names.
    pub fn explain(&self, name_or_alias: &str) -> Option<String> {
        let tool = self.get(name_or_alias)?;
        Some(self.gate().explain(&tool.spec))
    }

    // ── Binding ───────────────────────────────────────────────────────────────

    /// Publish `filter` as the active policy, replacing any previous one.
    pub fn bind_filter(&self, filter: Arc<dyn ToolFilter>) {
        let label = filter.label();
        let previous = {
            let mut slot = self.filter.write().unwrap_or_else(PoisonError::into_inner);
            slot.replace(filter)
        };
        info!(
            filter = %label,
            replaced = %previous.map(|f| f.label()).unwrap_or_else(|| "none".to_string()),
            "tool filter bound"
        );
    }

    /// Remove the bound filter; enablement reverts to feature-flag gating.
    pub fn clear_filter(&self) {
        let previous = self
            .filter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(previous) = previous {
            info!(filter = %previous.label(), "tool filter cleared");
        }
    }

    /// The currently bound filter, if any.
    pub fn current_filter(&self) -> Option<Arc<dyn ToolFilter>> {
        self.filter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the feature-flag map used by the unbound fallback.
    ///
    /// A bound filter already folded its own flag snapshot in at compile
    /// time; recompile and rebind to make new flags affect it.
    pub fn set_feature_flags(&self, flags: FeatureFlags) {
        *self
            .feature_flags
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(flags);
        debug!("feature flags replaced");
    }

    pub fn feature_flags(&self) -> Arc<FeatureFlags> {
        Arc::clone(
            &self
                .feature_flags
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Take one consistent snapshot of whatever currently decides enablement.
    fn gate(&self) -> Gate {
        match self.current_filter() {
            Some(filter) => Gate::Filter(filter),
            None => Gate::Flags(self.feature_flags()),
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.len())
            .field("names", &self.index.len())
            .field("filter", &self.current_filter().map(|f| f.label()))
            .finish()
    }
}

/// A point-in-time enablement source.
enum Gate {
    Filter(Arc<dyn ToolFilter>),
    Flags(Arc<FeatureFlags>),
}

impl Gate {
    fn allows(&self, spec: &ToolSpec) -> bool {
        match self {
            Gate::Filter(filter) => filter.is_enabled(&spec.name),
            Gate::Flags(flags) => spec
                .feature_flag
                .as_deref()
                .map_or(true, |flag| flags.is_enabled(flag)),
        }
    }

    fn explain(&self, spec: &ToolSpec) -> String {
        if let Gate::Filter(filter) = self {
            if let Some(reason) = filter.explain(&spec.name) {
                return reason;
            }
        }
        let enabled = self.allows(spec);
        match (spec.feature_flag.as_deref(), enabled) {
            (Some(flag), false) => format!("requires feature flag '{}'", flag),
            (Some(flag), true) => format!("enabled by feature flag '{}'", flag),
            (None, true) => "enabled by default".to_string(),
            (None, false) => "disabled by tool policy".to_string(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::{json, Value};

    use wpnav_contracts::{
        error::{WpnavError, WpnavResult},
        execution::ExecutionContext,
        policy::FeatureFlags,
        tool::{ToolCategory, ToolSpec},
    };

    use crate::traits::{ToolFilter, ToolHandler};

    use super::ToolRegistry;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A handler that counts its invocations and echoes its arguments.
    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    impl ToolHandler for CountingHandler {
        fn call(&self, args: &Value, _ctx: &ExecutionContext) -> WpnavResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "echo": args }))
        }
    }

    /// A filter that enables exactly the listed canonical names.
    #[derive(Debug)]
    struct SetFilter {
        label: &'static str,
        enabled: HashSet<String>,
    }

    impl SetFilter {
        fn new(label: &'static str, names: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                label,
                enabled: names.iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    impl ToolFilter for SetFilter {
        fn is_enabled(&self, canonical_name: &str) -> bool {
            self.enabled.contains(canonical_name)
        }

        fn label(&self) -> String {
            self.label.to_string()
        }
    }

    fn null_handler(_args: &Value, _ctx: &ExecutionContext) -> WpnavResult<Value> {
        Ok(Value::Null)
    }

    fn noop() -> Arc<dyn ToolHandler> {
        Arc::new(null_handler)
    }

    /// Three tools: one aliased, one flag-gated.
    fn registry_with(flags: FeatureFlags) -> ToolRegistry {
        let mut registry = ToolRegistry::new(flags);
        registry
            .register(
                ToolSpec::new("wpnav_introspect", ToolCategory::Core).with_alias("wpnav_about"),
                noop(),
            )
            .unwrap();
        registry
            .register(
                ToolSpec::new("wpnav_get_post", ToolCategory::Content)
                    .with_alias("wpnav_read_post")
                    .with_alias("wpnav_fetch_post"),
                noop(),
            )
            .unwrap();
        registry
            .register(
                ToolSpec::new("wpnav_run_workflow", ToolCategory::Workflows)
                    .with_feature_flag("WPNAV_ENABLE_WORKFLOWS"),
                noop(),
            )
            .unwrap();
        registry
    }

    // ── Registration ─────────────────────────────────────────────────────────

    #[test]
    fn alias_resolves_to_same_record() {
        let registry = registry_with(FeatureFlags::new());

        let by_name = registry.get("wpnav_get_post").unwrap();
        let by_alias = registry.get("wpnav_read_post").unwrap();
        assert!(Arc::ptr_eq(by_name.spec(), by_alias.spec()));
        assert_eq!(registry.canonical_name("wpnav_fetch_post"), Some("wpnav_get_post"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn duplicate_canonical_name_is_rejected() {
        let mut registry = registry_with(FeatureFlags::new());
        let err = registry
            .register(ToolSpec::new("wpnav_get_post", ToolCategory::Content), noop())
            .unwrap_err();
        assert!(matches!(err, WpnavError::DuplicateTool { name } if name == "wpnav_get_post"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn alias_colliding_with_canonical_name_is_rejected() {
        let mut registry = registry_with(FeatureFlags::new());
        let err = registry
            .register(
                ToolSpec::new("wpnav_help", ToolCategory::Core).with_alias("wpnav_introspect"),
                noop(),
            )
            .unwrap_err();

        match err {
            WpnavError::AliasCollision { alias, existing } => {
                assert_eq!(alias, "wpnav_introspect");
                assert_eq!(existing, "wpnav_introspect");
            }
            other => panic!("expected AliasCollision, got {:?}", other),
        }
        // Nothing from the failed registration leaked into the index.
        assert!(registry.get("wpnav_help").is_none());
    }

    #[test]
    fn alias_colliding_with_other_alias_is_rejected() {
        let mut registry = registry_with(FeatureFlags::new());
        let err = registry
            .register(
                ToolSpec::new("wpnav_help", ToolCategory::Core).with_alias("wpnav_about"),
                noop(),
            )
            .unwrap_err();
        assert!(matches!(err, WpnavError::AliasCollision { existing, .. } if existing == "wpnav_introspect"));
    }

    #[test]
    fn canonical_name_colliding_with_alias_is_rejected() {
        let mut registry = registry_with(FeatureFlags::new());
        let err = registry
            .register(ToolSpec::new("wpnav_read_post", ToolCategory::Content), noop())
            .unwrap_err();
        assert!(matches!(err, WpnavError::AliasCollision { existing, .. } if existing == "wpnav_get_post"));
    }

    #[test]
    fn repeated_alias_within_one_spec_is_rejected() {
        let mut registry = ToolRegistry::new(FeatureFlags::new());
        let err = registry
            .register(
                ToolSpec::new("wpnav_help", ToolCategory::Core)
                    .with_alias("wpnav_h")
                    .with_alias("wpnav_h"),
                noop(),
            )
            .unwrap_err();
        assert!(matches!(err, WpnavError::AliasCollision { .. }));
        assert!(registry.is_empty());
    }

    // ── Fallback gating ──────────────────────────────────────────────────────

    #[test]
    fn unbound_registry_gates_only_on_feature_flags() {
        let registry = registry_with(FeatureFlags::new());

        assert!(registry.is_enabled("wpnav_introspect"));
        assert!(registry.is_enabled("wpnav_read_post"));
        assert!(!registry.is_enabled("wpnav_run_workflow"));
        assert!(!registry.is_enabled("wpnav_does_not_exist"));
        assert_eq!(registry.all_definitions().len(), 2);
    }

    #[test]
    fn set_feature_flags_affects_fallback() {
        let registry = registry_with(FeatureFlags::new());
        registry.set_feature_flags(FeatureFlags::new().with("WPNAV_ENABLE_WORKFLOWS", true));

        assert!(registry.is_enabled("wpnav_run_workflow"));
        assert_eq!(registry.all_definitions().len(), 3);
    }

    // ── Bound filter ─────────────────────────────────────────────────────────

    #[test]
    fn bound_filter_decides_enablement() {
        let registry = registry_with(FeatureFlags::new());
        registry.bind_filter(SetFilter::new("content-only", &["wpnav_get_post"]));

        assert!(!registry.is_enabled("wpnav_introspect"));
        assert!(registry.is_enabled("wpnav_fetch_post"));
        assert_eq!(registry.enabled_names(), vec!["wpnav_get_post".to_string()]);
        assert_eq!(registry.current_filter().unwrap().label(), "content-only");
    }

    #[test]
    fn clear_filter_reverts_to_flag_gating() {
        let registry = registry_with(FeatureFlags::new());
        registry.bind_filter(SetFilter::new("none", &[]));
        assert!(registry.all_definitions().is_empty());

        registry.clear_filter();
        assert!(registry.current_filter().is_none());
        assert_eq!(registry.all_definitions().len(), 2);
    }

    #[test]
    fn rebinding_replaces_previous_filter() {
        let registry = registry_with(FeatureFlags::new());
        registry.bind_filter(SetFilter::new("first", &["wpnav_introspect"]));
        registry.bind_filter(SetFilter::new("second", &["wpnav_get_post"]));

        assert!(!registry.is_enabled("wpnav_introspect"));
        assert!(registry.is_enabled("wpnav_get_post"));
    }

    #[test]
    fn all_definitions_lists_aliased_tool_once() {
        let registry = registry_with(FeatureFlags::new());
        let names: Vec<String> = registry
            .all_definitions()
            .iter()
            .map(|s| s.name.clone())
            .collect();
        assert_eq!(names, vec!["wpnav_introspect", "wpnav_get_post"]);
    }

    #[test]
    fn by_category_ignores_enablement() {
        let registry = registry_with(FeatureFlags::new());
        let workflows = registry.by_category(ToolCategory::Workflows);
        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].name, "wpnav_run_workflow");
        assert!(registry.by_category(ToolCategory::Auth).is_empty());
    }

    // ── Execution ────────────────────────────────────────────────────────────

    #[test]
    fn execute_unknown_tool_is_not_found() {
        let registry = registry_with(FeatureFlags::new());
        let result = registry.execute("wpnav_nope", &Value::Null, &ExecutionContext::new());
        assert!(matches!(result, Err(WpnavError::ToolNotFound { name }) if name == "wpnav_nope"));
    }

    #[test]
    fn execute_flag_gated_tool_names_the_flag() {
        let registry = registry_with(FeatureFlags::new());
        let result = registry.execute("wpnav_run_workflow", &Value::Null, &ExecutionContext::new());

        match result {
            Err(WpnavError::ToolDisabled { name, reason }) => {
                assert_eq!(name, "wpnav_run_workflow");
                assert!(
                    reason.contains("WPNAV_ENABLE_WORKFLOWS"),
                    "reason should name the flag: {reason}"
                );
            }
            other => panic!("expected ToolDisabled, got {:?}", other),
        }
    }

    #[test]
    fn execute_policy_disabled_tool_never_calls_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new(FeatureFlags::new());
        registry
            .register(
                ToolSpec::new("wpnav_delete_post", ToolCategory::Content),
                Arc::new(CountingHandler { calls: calls.clone() }),
            )
            .unwrap();
        registry.bind_filter(SetFilter::new("deny-all", &[]));

        let result = registry.execute("wpnav_delete_post", &json!({ "id": 1 }), &ExecutionContext::new());

        assert!(matches!(result, Err(WpnavError::ToolDisabled { reason, .. }) if reason == "disabled by tool policy"));
        assert_eq!(calls.load(Ordering::SeqCst), 0, "handler must not run for a disabled tool");
    }

    #[test]
    fn execute_enabled_tool_via_alias_calls_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new(FeatureFlags::new());
        registry
            .register(
                ToolSpec::new("wpnav_get_post", ToolCategory::Content).with_alias("wpnav_read_post"),
                Arc::new(CountingHandler { calls: calls.clone() }),
            )
            .unwrap();

        let output = registry
            .execute("wpnav_read_post", &json!({ "id": 7 }), &ExecutionContext::new())
            .unwrap();

        assert_eq!(output, json!({ "echo": { "id": 7 } }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explain_without_filter_uses_flag_state() {
        let registry = registry_with(FeatureFlags::new());
        assert_eq!(registry.explain("wpnav_about").as_deref(), Some("enabled by default"));
        assert_eq!(
            registry.explain("wpnav_run_workflow").as_deref(),
            Some("requires feature flag 'WPNAV_ENABLE_WORKFLOWS'")
        );
        assert!(registry.explain("wpnav_nope").is_none());
    }

    // ── Concurrency ──────────────────────────────────────────────────────────

    /// Readers racing a stream of rebinds must only ever observe one of the
    /// two complete filters: both tools on, or both tools off.
    #[test]
    fn concurrent_readers_observe_whole_filters() {
        let registry = Arc::new(registry_with(FeatureFlags::new()));
        let all_on = SetFilter::new("on", &["wpnav_introspect", "wpnav_get_post"]);
        let all_off = SetFilter::new("off", &[]);
        registry.bind_filter(all_on.clone());

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let count = registry.all_definitions().len();
                        assert!(count == 0 || count == 2, "observed a mixed filter: {count}");
                    }
                })
            })
            .collect();

        for i in 0..500 {
            if i % 2 == 0 {
                registry.bind_filter(all_off.clone());
            } else {
                registry.bind_filter(all_on.clone());
            }
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
