//! # wpnav-contracts
//!
//! Shared types, tool records, policy inputs and errors for the WP Navigator
//! tool gate.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions and error types.

pub mod error;
pub mod execution;
pub mod policy;
pub mod tool;
