//! # wpnav-ref-catalog
//!
//! Reference WordPress tool catalog for the wpnav tool gate.
//!
//! Provides seventeen tools across ten categories, each answered by a mock
//! handler over fictional site data, and three demo scenarios:
//!
//! 1. **Category scoping**: category baselines refined by pattern overrides,
//!    with per-tool explanations for everything left disabled.
//! 2. **Role switch**: recompiling and rebinding for a new role while reader
//!    threads keep querying the registry.
//! 3. **Flag gating**: a feature-flagged tool that no override can unlock
//!    until its flag is switched on.
//!
//! All data is hardcoded and fictional. No site is contacted.

pub mod catalog;
pub mod mock_site;
pub mod scenarios;

pub use catalog::{reference_registry, reference_specs, reference_tools, WORKFLOWS_FLAG};
