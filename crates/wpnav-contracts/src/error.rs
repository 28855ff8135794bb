//! Error types for the tool gate.
//!
//! Policy compilation never fails; it reports problems as warnings. Only
//! registration, configuration loading and tool execution return errors,
//! and every variant carries enough context to tell the caller what to fix.

use thiserror::Error;

/// The unified error type for the tool gate.
#[derive(Debug, Error)]
pub enum WpnavError {
    /// No tool is registered under the requested name or alias.
    #[error("tool '{name}' not found")]
    ToolNotFound { name: String },

    /// The tool exists but the bound policy does not currently enable it.
    ///
    /// `reason` names the feature flag when the flag was the disabling cause.
    #[error("tool '{name}' is disabled: {reason}")]
    ToolDisabled { name: String, reason: String },

    /// A second tool was registered under an already-used canonical name.
    #[error("tool '{name}' is already registered")]
    DuplicateTool { name: String },

    /// An alias collides with an existing canonical name or alias.
    #[error("alias '{alias}' collides with tool '{existing}'")]
    AliasCollision { alias: String, existing: String },

    /// A category name outside the closed category enum.
    #[error("unknown tool category '{name}'")]
    UnknownCategory { name: String },

    /// The tool handler ran and reported a failure.
    #[error("tool '{tool}' failed: {reason}")]
    HandlerFailed { tool: String, reason: String },

    /// A configuration document is missing, unreadable or malformed.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },
}

/// Convenience alias used throughout the workspace.
pub type WpnavResult<T> = Result<T, WpnavError>;
