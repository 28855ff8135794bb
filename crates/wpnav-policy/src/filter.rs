//! The compiled, immutable enablement table.
//!
//! A `CompiledFilter` is built once by the compiler, shared as
//! `Arc<CompiledFilter>`, and discarded when a newer one is bound. Nothing
//! in it changes after construction.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use wpnav_contracts::tool::ToolSpec;
use wpnav_core::traits::ToolFilter;

use crate::decision::Decision;

/// Identity of one compilation, shown in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FilterId(pub uuid::Uuid);

impl FilterId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for FilterId {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of one compilation pass.
#[derive(Debug)]
pub struct CompiledFilter {
    id: FilterId,
    compiled_at: DateTime<Utc>,
    role: Option<String>,
    enabled: HashSet<String>,
    /// Enabled specs, each canonical tool once, in catalog order.
    definitions: Vec<Arc<ToolSpec>>,
    decisions: HashMap<String, Decision>,
    warnings: Vec<String>,
}

impl CompiledFilter {
    pub(crate) fn new(
        role: Option<String>,
        decided: Vec<(Arc<ToolSpec>, Decision)>,
        warnings: Vec<String>,
    ) -> Self {
        let mut enabled = HashSet::new();
        let mut definitions = Vec::new();
        let mut decisions = HashMap::with_capacity(decided.len());

        for (spec, decision) in decided {
            if decision.enabled {
                enabled.insert(spec.name.clone());
                definitions.push(Arc::clone(&spec));
            }
            decisions.insert(spec.name.clone(), decision);
        }

        Self {
            id: FilterId::new(),
            compiled_at: Utc::now(),
            role,
            enabled,
            definitions,
            decisions,
            warnings,
        }
    }

    pub fn id(&self) -> FilterId {
        self.id
    }

    pub fn compiled_at(&self) -> DateTime<Utc> {
        self.compiled_at
    }

    /// Name of the role that was active for this compilation.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// O(1) membership test on canonical names.
    pub fn is_enabled(&self, canonical_name: &str) -> bool {
        self.enabled.contains(canonical_name)
    }

    /// Every enabled tool exactly once.
    pub fn enabled_definitions(&self) -> &[Arc<ToolSpec>] {
        &self.definitions
    }

    pub fn enabled_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|spec| spec.name.as_str())
    }

    pub fn enabled_count(&self) -> usize {
        self.definitions.len()
    }

    /// Diagnostics produced while compiling, in layer order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The recorded decision for a canonical tool name.
    pub fn decision(&self, canonical_name: &str) -> Option<&Decision> {
        self.decisions.get(canonical_name)
    }
}

impl ToolFilter for CompiledFilter {
    fn is_enabled(&self, canonical_name: &str) -> bool {
        CompiledFilter::is_enabled(self, canonical_name)
    }

    fn explain(&self, canonical_name: &str) -> Option<String> {
        self.decision(canonical_name).map(|d| d.to_string())
    }

    fn label(&self) -> String {
        self.id.0.to_string()
    }
}
