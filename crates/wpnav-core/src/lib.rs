//! # wpnav-core
//!
//! The tool registry and its trust seams.
//!
//! This crate provides:
//! - The two core traits (`ToolHandler`, `ToolFilter`)
//! - The `ToolRegistry` that resolves names and aliases, gates dispatch on
//!   the bound filter, and swaps filters atomically
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wpnav_core::{ToolRegistry, traits::{ToolFilter, ToolHandler}};
//!
//! let mut registry = ToolRegistry::new(flags);
//! registry.register(spec, handler)?;
//! registry.bind_filter(compiled);
//! let output = registry.execute("wpnav_list_posts", &args, &ctx)?;
//! ```

pub mod registry;
pub mod traits;

pub use registry::{RegisteredTool, ToolRegistry};
