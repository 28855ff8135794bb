//! wpnav tool gate: Demo CLI
//!
//! Runs the reference scenarios, or binds a policy file to the reference
//! catalog and inspects the result.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- role-switch
//!   cargo run -p demo -- --policy site.toml list --all
//!   cargo run -p demo -- --policy site.toml --role editor explain wpnav_delete_post
//!   cargo run -p demo -- exec wpnav_get_post --args '{"id": 101}'

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wpnav_contracts::{
    error::{WpnavError, WpnavResult},
    execution::ExecutionContext,
    policy::FeatureFlags,
    tool::ToolCategory,
};
use wpnav_core::registry::ToolRegistry;
use wpnav_policy::{bind_config, ToolPolicyConfig};
use wpnav_ref_catalog::{
    reference_registry,
    scenarios::{category_scoping, flag_gating, role_switch},
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// wpnav: layered tool gate over a WordPress tool catalog.
///
/// Scenario subcommands run self-contained demos. The inspection subcommands
/// bind `--policy` (or an empty policy) to the reference catalog first.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "wpnav tool gate reference demo",
    long_about = "Runs wpnav tool-gate scenarios, or compiles a TOML tool policy against\n\
                  the reference catalog to list, explain and call tools."
)]
struct Cli {
    /// TOML tool policy to bind before inspecting.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Active role, replacing `roles.active` from the policy.
    #[arg(long, global = true)]
    role: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: Category scoping with pattern overrides.
    CategoryScoping,
    /// Scenario 2: Role switch while readers enumerate tools.
    RoleSwitch,
    /// Scenario 3: Feature-flag gating that no override can bypass.
    FlagGating,
    /// List enabled tools, or every tool with its state.
    List {
        #[arg(long)]
        all: bool,
    },
    /// Show tools grouped by category, enabled or not.
    Categories,
    /// Explain why a tool (canonical name or alias) is enabled or disabled.
    Explain { tool: String },
    /// Call a tool through the gate.
    Exec {
        tool: String,
        /// JSON arguments for the tool.
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Command::RunAll => run_all(),
        Command::CategoryScoping => category_scoping::run_scenario(),
        Command::RoleSwitch => role_switch::run_scenario(),
        Command::FlagGating => flag_gating::run_scenario(),
        Command::List { all } => bound_registry(&cli).and_then(|r| list(&r, *all)),
        Command::Categories => bound_registry(&cli).map(|r| categories(&r)),
        Command::Explain { tool } => bound_registry(&cli).and_then(|r| explain(&r, tool)),
        Command::Exec { tool, args } => {
            bound_registry(&cli).and_then(|r| exec(&r, tool, args, cli.role.as_deref()))
        }
    };

    if let Err(e) = result {
        eprintln!("Demo error: {}", e);
        std::process::exit(1);
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> WpnavResult<()> {
    print_banner();
    category_scoping::run_scenario()?;
    role_switch::run_scenario()?;
    flag_gating::run_scenario()?;
    println!("All scenarios completed successfully.");
    Ok(())
}

// ── Inspection ────────────────────────────────────────────────────────────────

/// The reference registry with the CLI's policy and role bound.
fn bound_registry(cli: &Cli) -> WpnavResult<ToolRegistry> {
    let config = match &cli.policy {
        Some(path) => ToolPolicyConfig::from_file(path)?,
        None => ToolPolicyConfig::default(),
    };
    let config = match cli.role.as_deref() {
        Some(role) => config.with_role(Some(role)),
        None => config,
    };
    debug!(policy = ?cli.policy, role = ?config.roles.active, "binding policy");

    let registry = reference_registry(FeatureFlags::new())?;
    let filter = bind_config(&registry, &config);
    for warning in filter.warnings() {
        eprintln!("warning: {}", warning);
    }
    Ok(registry)
}

fn list(registry: &ToolRegistry, all: bool) -> WpnavResult<()> {
    if all {
        for spec in registry.catalog() {
            let state = if registry.is_enabled(&spec.name) { "on " } else { "off" };
            let reason = registry.explain(&spec.name).unwrap_or_default();
            println!("{} {:<24} {}", state, spec.name, reason);
        }
    } else {
        for spec in registry.all_definitions() {
            println!("{:<24} {}", spec.name, spec.description);
        }
    }
    Ok(())
}

fn categories(registry: &ToolRegistry) {
    for category in ToolCategory::ALL {
        let tools = registry.by_category(category);
        if tools.is_empty() {
            continue;
        }
        println!("{}:", category);
        for spec in tools {
            let mark = if registry.is_enabled(&spec.name) { '+' } else { '-' };
            println!("  {} {}", mark, spec.name);
        }
    }
}

fn explain(registry: &ToolRegistry, tool: &str) -> WpnavResult<()> {
    let canonical = registry
        .canonical_name(tool)
        .ok_or_else(|| WpnavError::ToolNotFound {
            name: tool.to_string(),
        })?;
    let state = if registry.is_enabled(canonical) { "enabled" } else { "disabled" };
    let reason = registry.explain(canonical).unwrap_or_default();
    if canonical == tool {
        println!("{}: {} ({})", tool, state, reason);
    } else {
        println!("{} (alias of {}): {} ({})", tool, canonical, state, reason);
    }
    Ok(())
}

fn exec(registry: &ToolRegistry, tool: &str, args: &str, role: Option<&str>) -> WpnavResult<()> {
    let args: serde_json::Value =
        serde_json::from_str(args).map_err(|e| WpnavError::ConfigError {
            reason: format!("invalid --args JSON: {}", e),
        })?;
    let ctx = match role {
        Some(role) => ExecutionContext::new().with_role(role),
        None => ExecutionContext::new(),
    };
    let out = registry.execute(tool, &args, &ctx)?;
    let pretty = serde_json::to_string_pretty(&out).map_err(|e| WpnavError::HandlerFailed {
        tool: tool.to_string(),
        reason: format!("response is not serializable: {}", e),
    })?;
    println!("{}", pretty);
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("wpnav: Layered Tool Gate");
    println!("Reference Catalog Demo");
    println!("========================");
    println!();
    println!("Compilation layers, later layers override earlier ones:");
    println!("  [1] Feature flags: a disabled flag locks its tools out for good");
    println!("  [2] Category rules: enabled allow-list, disabled wins");
    println!("  [3] Pattern overrides: most specific pattern wins");
    println!("  [4] Active role: allowed is exclusive, then denied");
    println!("  [5] Role overrides: tools_allow, then tools_deny");
    println!();
}
