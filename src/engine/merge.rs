//! Merging rule sets and resolving allow/deny conflicts
//!
//! Resolution is security first: deny always wins. An allow entry is dropped
//! when the same string is denied or when a broader deny covers it. The
//! reverse never happens, so the deny list can only grow.

use std::collections::BTreeSet;
use tracing::debug;

use crate::parser::rule::parse_rule;
use crate::rules::subsumption::{partition_subsumed, subsumes};
use crate::rules::{Category, CategoryCounts, MergeResult, RuleSet};

/// Merge the global rule set with every local one.
///
/// The returned [`MergeResult`] carries the merged set and the statistics.
/// Output depends only on the inputs, never on their order.
pub fn merge_permissions(global: &RuleSet, locals: &[RuleSet]) -> MergeResult {
    let union = union_all(global, locals);

    // Within-category cleanup: narrower allows next to a broader allow
    let allow: Vec<String> = union.allow.iter().cloned().collect();
    let (allow, mut subsumed) = partition_subsumed(&allow, Category::Allow);
    for raw in &subsumed {
        debug!(rule = %raw, "allow rule covered by a broader allow");
    }

    let (allow, conflicts) = resolve_conflicts(allow, &union);
    let conflicts_resolved = conflicts.len();
    for conflict in conflicts {
        match conflict {
            Conflict::Exact(raw) => {
                debug!(rule = %raw, "allow rule removed, identical deny exists");
            }
            Conflict::Covered { allow, deny } => {
                debug!(rule = %allow, deny = %deny, "allow rule removed, covered by deny");
                subsumed.push(allow);
            }
        }
    }

    let merged = RuleSet {
        allow,
        deny: union.deny,
        ask: union.ask,
    };

    let files_scanned = locals.len();
    let files_processed = locals.iter().filter(|l| !l.is_empty()).count();

    let mut added = CategoryCounts::default();
    for category in Category::ALL {
        let new = merged
            .get(category)
            .difference(global.get(category))
            .count();
        added.set(category, new);
    }

    MergeResult {
        files_scanned,
        files_processed,
        files_skipped: files_scanned - files_processed,
        added,
        subsumed,
        conflicts_resolved,
        merged,
    }
}

fn union_all(global: &RuleSet, locals: &[RuleSet]) -> RuleSet {
    let mut union = global.clone();
    for local in locals {
        for category in Category::ALL {
            union
                .get_mut(category)
                .extend(local.get(category).iter().cloned());
        }
    }
    union
}

enum Conflict {
    Exact(String),
    Covered { allow: String, deny: String },
}

/// Split `allow` into the entries that survive the deny list and the conflicts
fn resolve_conflicts(allow: Vec<String>, union: &RuleSet) -> (BTreeSet<String>, Vec<Conflict>) {
    let deny_rules = union.rules(Category::Deny);
    let mut kept = BTreeSet::new();
    let mut conflicts = Vec::new();

    for raw in allow {
        if union.deny.contains(&raw) {
            conflicts.push(Conflict::Exact(raw));
            continue;
        }

        let covering = parse_rule(&raw, Category::Allow)
            .ok()
            .and_then(|rule| deny_rules.iter().find(|deny| subsumes(deny, &rule)));

        match covering {
            Some(deny) => conflicts.push(Conflict::Covered {
                deny: deny.raw().to_string(),
                allow: raw,
            }),
            None => {
                kept.insert(raw);
            }
        }
    }

    (kept, conflicts)
}
