//! Subsumption between permission rules
//!
//! `subsumes(a, b)` holds when `a` already grants (or denies) everything `b`
//! does, so `b` is redundant next to `a`. The relation is a strict partial
//! order on rules of one type: irreflexive, anti-symmetric and transitive.
//! Both command and path checks compare whole tokens/components, never
//! substrings, which is what keeps `git:*` away from `gitk` and `/a/foo/**`
//! away from `/a/foobar/**`.

use std::collections::HashSet;

use crate::parser::rule::parse_rule;
use crate::rules::{Category, CommandPattern, PathPattern, Rule, Scope};

/// A broader rule together with every rule it makes redundant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsumption {
    pub broader: Rule,
    pub narrower: Vec<Rule>,
}

/// Whether `broader` makes `narrower` redundant
pub fn subsumes(broader: &Rule, narrower: &Rule) -> bool {
    if broader.rule_type() != narrower.rule_type() {
        return false;
    }

    match (broader.scope(), narrower.scope()) {
        (Scope::Command(b), Scope::Command(n)) => command_subsumes(b, n),
        (Scope::Path(b), Scope::Path(n)) => path_subsumes(b, n),
        _ => false,
    }
}

/// A bare command matches only itself; only a wildcard reaches subcommands
fn command_subsumes(broader: &CommandPattern, narrower: &CommandPattern) -> bool {
    broader.wildcard
        && !broader.tokens.is_empty()
        && broader.tokens.len() < narrower.tokens.len()
        && narrower.tokens.starts_with(&broader.tokens)
}

fn path_subsumes(broader: &PathPattern, narrower: &PathPattern) -> bool {
    broader.recursive
        && narrower.recursive
        && broader.key == narrower.key
        && broader.absolute == narrower.absolute
        && broader.components.len() < narrower.components.len()
        && narrower.components.starts_with(&broader.components)
}

/// For each rule that subsumes at least one other rule of the same category
/// and type, the rules it subsumes. Groups follow the input order.
pub fn detect_subsumptions(rules: &[Rule]) -> Vec<Subsumption> {
    rules
        .iter()
        .filter_map(|broader| {
            let narrower: Vec<Rule> = rules
                .iter()
                .filter(|n| n.category() == broader.category() && subsumes(broader, n))
                .cloned()
                .collect();
            (!narrower.is_empty()).then(|| Subsumption {
                broader: broader.clone(),
                narrower,
            })
        })
        .collect()
}

/// Drop every entry that another entry in the same list subsumes.
///
/// Survivors keep their relative order. Strings that do not parse are never
/// removed and never cause removals.
pub fn remove_subsumed(rules: &[String], category: Category) -> Vec<String> {
    partition_subsumed(rules, category).0
}

/// Like [`remove_subsumed`], but also returns what was removed, in input order
pub fn partition_subsumed(rules: &[String], category: Category) -> (Vec<String>, Vec<String>) {
    let parsed: Vec<Rule> = rules
        .iter()
        .filter_map(|raw| parse_rule(raw, category).ok())
        .collect();

    let detected = detect_subsumptions(&parsed);
    let covered: HashSet<&str> = detected
        .iter()
        .flat_map(|s| s.narrower.iter().map(Rule::raw))
        .collect();

    rules
        .iter()
        .cloned()
        .partition(|raw| !covered.contains(raw.as_str()))
}
