//! Tool patterns: the keys used by overrides, roles and role overrides.
//!
//! Three shapes are recognised:
//!
//! - `category:*` matches every tool whose category is `category`
//! - `prefix*` matches every tool whose canonical name starts with `prefix`
//! - anything else is an exact canonical name
//!
//! A `*` anywhere but the end makes the pattern an exact name, which then
//! simply fails to match (and the compiler warns about it).

use std::fmt;
use std::str::FromStr;

use wpnav_contracts::tool::{ToolCategory, ToolSpec};

/// A parsed tool pattern. Keeps the raw text for warnings and explanations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolPattern {
    raw: String,
    kind: PatternKind,
}

/// The recognised pattern shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Exact(String),
    Prefix(String),
    /// `Some` when the category name is in the closed enum.
    Category {
        name: String,
        category: Option<ToolCategory>,
    },
}

/// How narrowly a pattern selects tools. Higher wins inside one layer.
///
/// Exact names beat wildcards, longer wildcard prefixes beat shorter ones,
/// and any wildcard beats a category binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Specificity {
    Category,
    Prefix(usize),
    Exact,
}

impl ToolPattern {
    pub fn parse(raw: &str) -> Self {
        let kind = if let Some(name) = raw.strip_suffix(":*") {
            PatternKind::Category {
                name: name.to_string(),
                category: ToolCategory::from_str(name).ok(),
            }
        } else if let Some(prefix) = raw.strip_suffix('*').filter(|p| !p.contains('*')) {
            PatternKind::Prefix(prefix.to_string())
        } else {
            PatternKind::Exact(raw.to_string())
        };
        Self {
            raw: raw.to_string(),
            kind,
        }
    }

    /// Build an exact-name pattern without parsing.
    pub fn exact(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            raw: name.clone(),
            kind: PatternKind::Exact(name),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// Return true if this pattern selects `spec`.
    ///
    /// Exact patterns compare against the canonical name only; resolve
    /// aliases before building the pattern.
    pub fn matches(&self, spec: &ToolSpec) -> bool {
        match &self.kind {
            PatternKind::Exact(name) => spec.name == *name,
            PatternKind::Prefix(prefix) => spec.name.starts_with(prefix.as_str()),
            PatternKind::Category { category, .. } => *category == Some(spec.category),
        }
    }

    pub fn specificity(&self) -> Specificity {
        match &self.kind {
            PatternKind::Exact(_) => Specificity::Exact,
            PatternKind::Prefix(prefix) => Specificity::Prefix(prefix.len()),
            PatternKind::Category { .. } => Specificity::Category,
        }
    }

    /// Return true if at least one tool in `catalog` matches.
    pub fn matches_any<'a>(&self, catalog: impl IntoIterator<Item = &'a ToolSpec>) -> bool {
        catalog.into_iter().any(|spec| self.matches(spec))
    }
}

impl fmt::Display for ToolPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use wpnav_contracts::tool::{ToolCategory, ToolSpec};

    use super::*;

    fn list_users() -> ToolSpec {
        ToolSpec::new("wpnav_list_users", ToolCategory::Users).with_alias("wpnav_users")
    }

    #[test]
    fn exact_pattern_matches_canonical_name_only() {
        let spec = list_users();
        assert!(ToolPattern::parse("wpnav_list_users").matches(&spec));
        assert!(!ToolPattern::parse("wpnav_users").matches(&spec), "aliases are not matched");
        assert!(!ToolPattern::parse("wpnav_list").matches(&spec));
    }

    #[test]
    fn wildcard_pattern_matches_by_prefix() {
        let spec = list_users();
        assert!(ToolPattern::parse("wpnav_list_*").matches(&spec));
        assert!(ToolPattern::parse("wpnav_*").matches(&spec));
        assert!(!ToolPattern::parse("wpnav_get_*").matches(&spec));
    }

    #[test]
    fn bare_star_matches_everything() {
        let pattern = ToolPattern::parse("*");
        assert_eq!(pattern.kind(), &PatternKind::Prefix(String::new()));
        assert!(pattern.matches(&list_users()));
    }

    #[test]
    fn category_pattern_matches_by_category() {
        let spec = list_users();
        assert!(ToolPattern::parse("users:*").matches(&spec));
        assert!(!ToolPattern::parse("content:*").matches(&spec));
    }

    #[test]
    fn unknown_category_pattern_matches_nothing() {
        let pattern = ToolPattern::parse("comments:*");
        match pattern.kind() {
            PatternKind::Category { name, category } => {
                assert_eq!(name, "comments");
                assert!(category.is_none());
            }
            other => panic!("expected Category, got {:?}", other),
        }
        assert!(!pattern.matches(&list_users()));
    }

    #[test]
    fn inner_star_is_treated_as_exact_name() {
        let pattern = ToolPattern::parse("wpnav_*_users");
        assert_eq!(pattern.kind(), &PatternKind::Exact("wpnav_*_users".to_string()));
        assert!(!pattern.matches(&list_users()));
    }

    #[test]
    fn specificity_ordering() {
        let exact = ToolPattern::parse("wpnav_list_users").specificity();
        let long = ToolPattern::parse("wpnav_list_*").specificity();
        let short = ToolPattern::parse("wpnav_*").specificity();
        let category = ToolPattern::parse("users:*").specificity();

        assert!(exact > long);
        assert!(long > short);
        assert!(short > category);
    }

    #[test]
    fn matches_any_scans_catalog() {
        let catalog = [list_users(), ToolSpec::new("wpnav_help", ToolCategory::Core)];
        assert!(ToolPattern::parse("core:*").matches_any(&catalog));
        assert!(!ToolPattern::parse("wpnav_delete_*").matches_any(&catalog));
    }
}
