
use std::collections::HashSet;

use proptest::prelude::*;
use qrewrite::{Action, ExpandedQuery, Query, RewriteEngine};
use strategies::{
    GenInput, arb_query, arb_rules, expected_boolean, expected_simple_matches, sequence,
};

fn ids_and_spans(actions: &[Action<'_>]) -> Vec<(Vec<String>, usize, usize)> {
    actions
        .iter()
        .map(|a| {
            (
                a.instructions_list.iter().map(|i| i.id_text()).collect(),
                a.start,
                a.end,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Invariant 1: Determinism
//
// The same collection and sequence always produce the same actions, also
// across recompilation of the same text.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn determinism_repeated(rules in arb_rules(), query in arb_query()) {
        let collection = rules.compile();
        let seq = sequence(&query);
        let first = ids_and_spans(&collection.rewrite_actions(&seq));
        for _ in 0..3 {
            let again = ids_and_spans(&collection.rewrite_actions(&seq));
            prop_assert_eq!(&first, &again, "repeated scan changed the actions");
        }
    }

    #[test]
    fn determinism_recompile(rules in arb_rules(), query in arb_query()) {
        let seq = sequence(&query);
        let c1 = rules.compile();
        let c2 = rules.compile();
        prop_assert_eq!(
            ids_and_spans(&c1.rewrite_actions(&seq)),
            ids_and_spans(&c2.rewrite_actions(&seq))
        );
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Ordering and bounds
//
// Actions are sorted by start, then rule order, and every span lies inside
// the sequence.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn actions_are_ordered_and_bounded(rules in arb_rules(), query in arb_query()) {
        let collection = rules.compile();
        let actions = collection.rewrite_actions(&sequence(&query));
        for pair in actions.windows(2) {
            prop_assert!(
                (pair[0].start, pair[0].order()) <= (pair[1].start, pair[1].order()),
                "actions out of order: {} before {}", pair[0], pair[1]
            );
        }
        for action in &actions {
            prop_assert!(action.start <= action.end);
            prop_assert!(action.end <= query.len());
            prop_assert_eq!(action.matched_terms.len(), action.end - action.start);
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Agreement with reference matchers
//
// Simple rules fire exactly at their contiguous occurrences; boolean rules
// fire exactly when the expression holds over the set of query words, and
// at most once.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn simple_rules_match_contiguous_occurrences(rules in arb_rules(), query in arb_query()) {
        let collection = rules.compile();
        let simple_ids: HashSet<&str> = rules
            .rules
            .iter()
            .filter(|r| matches!(r.input, GenInput::Simple(_)))
            .map(|r| r.id.as_str())
            .collect();

        let mut found = HashSet::new();
        for action in collection.rewrite_actions(&sequence(&query)) {
            for instructions in &action.instructions_list {
                let id = instructions.id_text();
                if simple_ids.contains(id.as_str()) {
                    found.insert((id, action.start));
                }
            }
        }
        prop_assert_eq!(found, expected_simple_matches(&rules, &query));
    }

    #[test]
    fn boolean_rules_follow_word_presence(rules in arb_rules(), query in arb_query()) {
        let collection = rules.compile();
        let actions = collection.rewrite_actions(&sequence(&query));
        for rule in &rules.rules {
            let GenInput::Boolean(expr) = &rule.input else { continue };
            let fired = actions
                .iter()
                .filter(|a| a.instructions_list.iter().any(|i| i.id_text() == rule.id))
                .count();
            let expected = usize::from(expected_boolean(expr, &query));
            prop_assert_eq!(fired, expected, "rule {} on {:?}", expr, query);
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: Rewriting
//
// Every matched rule is reported once per action it belongs to, and the
// user query keeps its terms (UP never touches it).
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn rewrite_reports_every_applied_rule(rules in arb_rules(), query in arb_query()) {
        let collection = rules.compile();
        let expected: usize = collection
            .rewrite_actions(&sequence(&query))
            .iter()
            .map(|a| a.instructions_list.len())
            .sum();

        let engine = RewriteEngine::new(&collection);
        let mut request = ExpandedQuery::new(Query::from_terms(query.iter().cloned()));
        let before = request.user_query.clone();
        let report = engine.rewrite(&mut request).unwrap();

        prop_assert_eq!(report.applied().len(), expected);
        prop_assert_eq!(request.boost_up.len(), expected);
        prop_assert_eq!(request.user_query, before);
    }
}
