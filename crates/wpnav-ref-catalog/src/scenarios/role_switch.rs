//! Scenario 2: Role switch under load
//!
//! The editorial policy is recompiled for each staff role in turn and bound
//! to a shared registry while reader threads keep enumerating enabled tools.
//! Every enumeration a reader observes must equal the full enabled set of
//! exactly one compiled filter; a half-applied policy would show up as a set
//! matching none of them.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use tracing::info;

use wpnav_contracts::{error::WpnavResult, policy::FeatureFlags};
use wpnav_policy::{bind_config, ToolPolicyConfig};

use crate::catalog::reference_registry;
use crate::scenarios::EDITORIAL_POLICY;

/// Roles cycled through, `None` being the role-less policy.
const ROLES: [Option<&str>; 4] = [None, Some("editor"), Some("author"), Some("auditor")];

/// What the readers saw while roles were being switched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSwitchReport {
    pub rebinds: usize,
    pub reads: usize,
    /// Reads whose enabled set matched no compiled filter.
    pub torn_reads: usize,
}

fn sorted_names(mut names: Vec<String>) -> Vec<String> {
    names.sort_unstable();
    names
}

/// Rebind every role `rounds` times while `readers` threads enumerate.
pub fn run_role_switch(readers: usize, rounds: usize) -> WpnavResult<RoleSwitchReport> {
    let registry = reference_registry(FeatureFlags::new())?;
    let config = ToolPolicyConfig::from_toml_str(EDITORIAL_POLICY)?;

    // Every set a reader may legitimately observe.
    let catalog = registry.catalog();
    let valid: HashSet<Vec<String>> = ROLES
        .iter()
        .map(|role| {
            let filter = config.with_role(*role).compile(&catalog);
            sorted_names(filter.enabled_names().map(str::to_string).collect())
        })
        .collect();

    bind_config(&registry, &config);

    let done = AtomicBool::new(false);
    let reads = AtomicUsize::new(0);
    let torn = AtomicUsize::new(0);
    let mut rebinds = 0;

    thread::scope(|s| {
        for _ in 0..readers {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let seen = sorted_names(registry.enabled_names());
                    if !valid.contains(&seen) {
                        torn.fetch_add(1, Ordering::Relaxed);
                    }
                    reads.fetch_add(1, Ordering::Relaxed);
                }
            });
        }

        for _ in 0..rounds {
            for role in ROLES {
                bind_config(&registry, &config.with_role(role));
                rebinds += 1;
            }
        }
        done.store(true, Ordering::Release);
    });

    let report = RoleSwitchReport {
        rebinds,
        reads: reads.into_inner(),
        torn_reads: torn.into_inner(),
    };
    info!(
        rebinds = report.rebinds,
        reads = report.reads,
        torn = report.torn_reads,
        "role switch finished"
    );
    Ok(report)
}

/// Run Scenario 2: Role switch under load.
pub fn run_scenario() -> WpnavResult<()> {
    println!("=== Scenario 2: Role Switch Under Load ===");
    println!();

    let registry = reference_registry(FeatureFlags::new())?;
    let config = ToolPolicyConfig::from_toml_str(EDITORIAL_POLICY)?;
    for role in ROLES {
        let filter = bind_config(&registry, &config.with_role(role));
        println!(
            "  Role {:<10} {:>2} tool(s) enabled",
            role.unwrap_or("(none)"),
            filter.enabled_count()
        );
    }
    println!();

    let report = run_role_switch(4, 50)?;
    println!("  Rebinds:    {}", report.rebinds);
    println!("  Reads:      {}", report.reads);
    println!(
        "  Torn reads: {} ({})",
        report.torn_reads,
        if report.torn_reads == 0 { "CONSISTENT" } else { "INCONSISTENT" }
    );
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Each role compiles to its own enabled set.
    #[test]
    fn test_role_sets() {
        let registry = reference_registry(FeatureFlags::new()).unwrap();
        let config = ToolPolicyConfig::from_toml_str(EDITORIAL_POLICY).unwrap();
        let catalog = registry.catalog();

        let count = |role: Option<&str>| config.with_role(role).compile(&catalog).enabled_count();
        assert_eq!(count(None), 9);
        assert_eq!(count(Some("editor")), 10);
        assert_eq!(count(Some("author")), 5);
        assert_eq!(count(Some("auditor")), 9);
    }

    /// The author role's allow-list is exclusive and its deny list applies.
    #[test]
    fn test_author_role_explanations() {
        let registry = reference_registry(FeatureFlags::new()).unwrap();
        let config = ToolPolicyConfig::from_toml_str(EDITORIAL_POLICY)
            .unwrap()
            .with_role(Some("author"));
        bind_config(&registry, &config);

        assert_eq!(
            registry.explain("wpnav_list_pages").as_deref(),
            Some("disabled by role deny pattern 'wpnav_list_pages'")
        );
        assert_eq!(
            registry.explain("wpnav_list_users").as_deref(),
            Some("not in the allow-list of role 'author'")
        );
        assert_eq!(
            registry.explain("wpnav_help").as_deref(),
            Some("enabled by role allow pattern 'core:*'")
        );
    }

    /// Readers never observe a half-applied filter.
    #[test]
    fn test_no_torn_reads_during_rebinds() {
        let report = run_role_switch(4, 25).unwrap();
        assert_eq!(report.rebinds, 100);
        assert_eq!(report.torn_reads, 0);
    }
}
