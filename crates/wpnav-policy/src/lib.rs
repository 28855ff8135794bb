//! # wpnav-policy
//!
//! Compiles the layered tool policy into an immutable enablement table and
//! binds it to a [`ToolRegistry`](wpnav_core::registry::ToolRegistry).
//!
//! ## Overview
//!
//! Five configuration sources decide whether a tool is exposed. They are
//! applied in a fixed order, later layers overriding earlier ones:
//!
//! 1. Feature flags. A flagged tool whose flag is off is locked out; nothing
//!    later can re-enable it.
//! 2. Category rules. An `enabled` list is an allow-list of categories; a
//!    `disabled` list removes categories and wins over `enabled`.
//! 3. Pattern overrides. The most specific matching pattern wins.
//! 4. The active role. `allowed` is exclusive, then `denied` removes.
//! 5. Role overrides. `tools_allow` adds, then `tools_deny` removes.
//!
//! The result is a [`CompiledFilter`]: a hash set of canonical names plus a
//! [`Decision`] per tool explaining which layer settled it.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use wpnav_policy::{bind_config, ToolPolicyConfig};
//!
//! let config = ToolPolicyConfig::from_file(Path::new("policy.toml"))?;
//! let filter = bind_config(&registry, &config);
//! for warning in filter.warnings() {
//!     eprintln!("{warning}");
//! }
//! ```
//!
//! ## Patterns
//!
//! Overrides, role lists and role overrides all take the same pattern
//! syntax: an exact canonical name, a trailing-`*` prefix, or `category:*`.
//! Patterns that match nothing are kept and reported as warnings.

pub mod binding;
pub mod compiler;
pub mod config;
pub mod decision;
pub mod filter;
pub mod pattern;

pub use binding::{bind_config, compile_and_bind};
pub use compiler::{FilterCompiler, PolicyInputs};
pub use config::{RolesSection, ToolPolicyConfig, ToolsSection};
pub use decision::{Decision, DecisionLayer};
pub use filter::{CompiledFilter, FilterId};
pub use pattern::{PatternKind, Specificity, ToolPattern};
