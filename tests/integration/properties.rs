//! Algebraic laws of subsumption and merging

use std::collections::BTreeSet;

use claude_consolidate::parser::parse_rule;
use claude_consolidate::rules::subsumption::{remove_subsumed, subsumes};
use claude_consolidate::{merge_permissions, Category, Rule, RuleSet};
use proptest::prelude::*;

fn arb_word() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("git"), Just("log"), Just("npm"), Just("run"), Just("test")]
}

fn arb_command_rule() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(arb_word(), 1..4),
        prop_oneof![Just(""), Just(":*"), Just(" *")],
    )
        .prop_map(|(words, suffix)| format!("Bash({}{})", words.join(" "), suffix))
}

fn arb_path_rule() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("Read"), Just("Edit"), Just("Write")],
        prop_oneof![Just("/"), Just("~/"), Just("path:/"), Just("file_path:/")],
        prop::collection::vec(prop_oneof![Just("a"), Just("b"), Just("src")], 0..4),
        any::<bool>(),
    )
        .prop_map(|(tool, prefix, components, recursive)| {
            let base = format!("{}{}", prefix, components.join("/"));
            if recursive {
                format!("{}({}/**)", tool, base)
            } else {
                format!("{}({})", tool, base)
            }
        })
}

fn arb_opaque_rule() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("WebFetch(domain:example.com)".to_string()),
        Just("WebFetch(domain:docs.rs)".to_string()),
        Just("WebSearch(rust)".to_string()),
    ]
}

/// Strings that do not parse, or parse despite odd spacing
fn arb_odd_raw() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Bash (".to_string()),
        Just("mcp__x".to_string()),
        Just("Bash()".to_string()),
        Just("Frobnicate(x)".to_string()),
        Just("Bash( git:*)".to_string()),
        Just("  Bash(git log:*)".to_string()),
        Just("Read(/a/** )".to_string()),
    ]
}

fn arb_parseable_raw() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => arb_command_rule(),
        4 => arb_path_rule(),
        1 => arb_opaque_rule(),
    ]
}

fn arb_raw() -> impl Strategy<Value = String> {
    prop_oneof![
        8 => arb_parseable_raw(),
        1 => arb_odd_raw(),
    ]
}

fn arb_rule() -> impl Strategy<Value = Rule> {
    arb_parseable_raw().prop_map(|raw| parse_rule(&raw, Category::Allow).unwrap())
}

fn arb_rule_set() -> impl Strategy<Value = RuleSet> {
    (
        prop::collection::vec(arb_raw(), 0..6),
        prop::collection::vec(arb_raw(), 0..4),
        prop::collection::vec(arb_raw(), 0..3),
    )
        .prop_map(|(allow, deny, ask)| RuleSet::from_lists(allow, deny, ask))
}

fn union(global: &RuleSet, locals: &[RuleSet], category: Category) -> BTreeSet<String> {
    let mut all = global.get(category).clone();
    for local in locals {
        all.extend(local.get(category).iter().cloned());
    }
    all
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_subsumption_irreflexive(r in arb_rule()) {
        prop_assert!(!subsumes(&r, &r));
    }

    #[test]
    fn prop_subsumption_antisymmetric(a in arb_rule(), b in arb_rule()) {
        prop_assert!(!(subsumes(&a, &b) && subsumes(&b, &a)));
    }

    #[test]
    fn prop_subsumption_transitive(a in arb_rule(), b in arb_rule(), c in arb_rule()) {
        if subsumes(&a, &b) && subsumes(&b, &c) {
            prop_assert!(subsumes(&a, &c));
        }
    }

    #[test]
    fn prop_subsumption_never_crosses_types(a in arb_rule(), b in arb_rule()) {
        if a.rule_type() != b.rule_type() {
            prop_assert!(!subsumes(&a, &b));
            prop_assert!(!subsumes(&b, &a));
        }
    }

    #[test]
    fn prop_remove_subsumed_idempotent(rules in prop::collection::vec(arb_raw(), 0..12)) {
        let once = remove_subsumed(&rules, Category::Allow);
        let twice = remove_subsumed(&once, Category::Allow);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_remove_subsumed_keeps_unparsable(rules in prop::collection::vec(arb_raw(), 0..12)) {
        let kept = remove_subsumed(&rules, Category::Allow);
        for raw in rules.iter().filter(|r| parse_rule(r, Category::Allow).is_err()) {
            prop_assert!(kept.contains(raw));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_merge_deterministic(
        global in arb_rule_set(),
        locals in prop::collection::vec(arb_rule_set(), 0..4),
    ) {
        let first = merge_permissions(&global, &locals);
        let second = merge_permissions(&global, &locals);
        prop_assert_eq!(&first, &second);

        let mut reversed = locals.clone();
        reversed.reverse();
        let swapped = merge_permissions(&global, &reversed);
        prop_assert_eq!(&first.merged, &swapped.merged);
        prop_assert_eq!(first.conflicts_resolved, swapped.conflicts_resolved);
    }

    #[test]
    fn prop_deny_never_shrinks(
        global in arb_rule_set(),
        locals in prop::collection::vec(arb_rule_set(), 0..4),
    ) {
        let result = merge_permissions(&global, &locals);
        prop_assert_eq!(result.merged.deny, union(&global, &locals, Category::Deny));
    }

    #[test]
    fn prop_allow_and_deny_disjoint(
        global in arb_rule_set(),
        locals in prop::collection::vec(arb_rule_set(), 0..4),
    ) {
        let result = merge_permissions(&global, &locals);
        prop_assert!(result.merged.allow.is_disjoint(&result.merged.deny));
    }

    #[test]
    fn prop_allow_only_shrinks(
        global in arb_rule_set(),
        locals in prop::collection::vec(arb_rule_set(), 0..4),
    ) {
        let result = merge_permissions(&global, &locals);
        prop_assert!(result.merged.allow.is_subset(&union(&global, &locals, Category::Allow)));
    }

    #[test]
    fn prop_ask_untouched(
        global in arb_rule_set(),
        locals in prop::collection::vec(arb_rule_set(), 0..4),
    ) {
        let result = merge_permissions(&global, &locals);
        prop_assert_eq!(result.merged.ask, union(&global, &locals, Category::Ask));
    }

    #[test]
    fn prop_merge_of_output_is_stable(
        global in arb_rule_set(),
        locals in prop::collection::vec(arb_rule_set(), 0..4),
    ) {
        let result = merge_permissions(&global, &locals);
        let again = merge_permissions(&result.merged, &[]);
        prop_assert_eq!(again.conflicts_resolved, 0);
        prop_assert!(again.subsumed.is_empty());
        prop_assert_eq!(again.added.total(), 0);
        prop_assert_eq!(again.merged, result.merged);
    }

    #[test]
    fn prop_no_surviving_allow_is_covered_by_deny(
        global in arb_rule_set(),
        locals in prop::collection::vec(arb_rule_set(), 0..4),
    ) {
        let result = merge_permissions(&global, &locals);
        let denies = result.merged.rules(Category::Deny);
        for allow in result.merged.rules(Category::Allow) {
            for deny in &denies {
                prop_assert!(!subsumes(deny, &allow));
            }
        }
    }

    #[test]
    fn prop_conflicts_counted_exactly(
        global in arb_rule_set(),
        locals in prop::collection::vec(arb_rule_set(), 0..4),
    ) {
        let result = merge_permissions(&global, &locals);
        let union_allow: Vec<String> =
            union(&global, &locals, Category::Allow).into_iter().collect();
        let after_subsumption = remove_subsumed(&union_allow, Category::Allow);

        prop_assert_eq!(
            result.conflicts_resolved,
            after_subsumption.len() - result.merged.allow.len()
        );

        let unique: BTreeSet<&String> = result.subsumed.iter().collect();
        prop_assert_eq!(unique.len(), result.subsumed.len());
    }
}
