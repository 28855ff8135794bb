//! Simulated WordPress site data for the reference catalog.
//!
//! All data in this module is hardcoded and fictional. No site is contacted;
//! each handler answers from these fixtures so the gate can be exercised
//! end to end without a network.

use chrono::Utc;
use serde_json::{json, Value};

use wpnav_contracts::{
    error::{WpnavError, WpnavResult},
    execution::ExecutionContext,
};
use wpnav_core::traits::ToolHandler;

// ── Fixtures ──────────────────────────────────────────────────────────────────

const POSTS: [(u64, &str, &str); 3] = [
    (101, "Hello world", "publish"),
    (102, "Release notes 2.4", "draft"),
    (103, "Spring sale", "publish"),
];

const USERS: [(u64, &str, &str); 2] = [(1, "admin", "administrator"), (7, "casey", "editor")];

const PLUGINS: [(&str, bool); 2] = [("akismet", true), ("hello-dolly", false)];

fn posts() -> Value {
    POSTS
        .iter()
        .map(|(id, title, status)| json!({ "id": id, "title": title, "status": status }))
        .collect()
}

fn find_post(id: u64) -> Option<Value> {
    POSTS
        .iter()
        .find(|(post_id, _, _)| *post_id == id)
        .map(|(id, title, status)| json!({ "id": id, "title": title, "status": status }))
}

fn require_id(tool: &str, args: &Value) -> WpnavResult<u64> {
    args["id"].as_u64().ok_or_else(|| WpnavError::HandlerFailed {
        tool: tool.to_string(),
        reason: "missing integer argument 'id'".to_string(),
    })
}

// ── Handler ───────────────────────────────────────────────────────────────────

/// Answers one catalog tool from the fixtures above.
///
/// Mutating tools report what they would have done with `"dry_run": true`.
#[derive(Debug, Clone, Copy)]
pub struct MockSiteHandler {
    tool: &'static str,
}

impl MockSiteHandler {
    pub fn new(tool: &'static str) -> Self {
        Self { tool }
    }

    fn respond(&self, args: &Value) -> WpnavResult<Value> {
        let data = match self.tool {
            "wpnav_introspect" => json!({
                "site": "https://demo.example.org",
                "wordpress": "6.5",
                "plugin": "wp-navigator 1.0"
            }),
            "wpnav_help" => json!({ "topics": ["content", "users", "plugins", "workflows"] }),
            "wpnav_list_posts" => json!({ "posts": posts() }),
            "wpnav_get_post" => {
                let id = require_id(self.tool, args)?;
                find_post(id).ok_or_else(|| WpnavError::HandlerFailed {
                    tool: self.tool.to_string(),
                    reason: format!("post {} not found", id),
                })?
            }
            "wpnav_create_post" => json!({
                "dry_run": true,
                "title": args["title"].as_str().unwrap_or("Untitled"),
                "status": "draft"
            }),
            "wpnav_delete_post" | "wpnav_delete_user" => {
                let id = require_id(self.tool, args)?;
                json!({ "dry_run": true, "deleted": id })
            }
            "wpnav_list_pages" => json!({ "pages": [{ "id": 2, "title": "About" }] }),
            "wpnav_list_categories" => json!({ "categories": ["news", "releases"] }),
            "wpnav_list_users" => json!({
                "users": USERS
                    .iter()
                    .map(|(id, login, role)| json!({ "id": id, "login": login, "role": role }))
                    .collect::<Vec<_>>()
            }),
            "wpnav_list_plugins" => json!({
                "plugins": PLUGINS
                    .iter()
                    .map(|(slug, active)| json!({ "slug": slug, "active": active }))
                    .collect::<Vec<_>>()
            }),
            "wpnav_activate_plugin" => json!({
                "dry_run": true,
                "activated": args["slug"].as_str().unwrap_or("")
            }),
            "wpnav_list_themes" => json!({ "themes": ["twentytwentyfour"], "active": "twentytwentyfour" }),
            "wpnav_run_workflow" => json!({
                "dry_run": true,
                "workflow": args["workflow"].as_str().unwrap_or("unnamed"),
                "steps": 0
            }),
            "wpnav_batch_update" => json!({
                "dry_run": true,
                "operations": args["operations"].as_array().map_or(0, Vec::len)
            }),
            "wpnav_get_settings" => json!({ "blogname": "Demo Site", "timezone": "UTC" }),
            "wpnav_search_tools" => json!({ "query": args["query"].as_str().unwrap_or("") }),
            other => {
                return Err(WpnavError::HandlerFailed {
                    tool: other.to_string(),
                    reason: "no fixture for this tool".to_string(),
                })
            }
        };
        Ok(data)
    }
}

impl ToolHandler for MockSiteHandler {
    fn call(&self, args: &Value, ctx: &ExecutionContext) -> WpnavResult<Value> {
        let data = self.respond(args)?;
        Ok(json!({
            "tool": self.tool,
            "request_id": ctx.request_id.0.to_string(),
            "served_at": Utc::now().to_rfc3339(),
            "data": data
        }))
    }
}
