//! Per-request execution context handed to tool handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub uuid::Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

/// What a handler knows about the request it is serving.
///
/// The gate itself never reads `metadata`; it is passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub request_id: RequestId,
    /// Name of the role active when the request was dispatched, if any.
    pub role: Option<String>,
    pub received_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            role: None,
            received_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
