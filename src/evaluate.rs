use std::borrow::Cow;
use std::collections::HashSet;

use crate::collection::RulesCollection;
use crate::network::Completion;
use crate::query::{TermPositionSequence, TermRef};
use crate::trie::TrieHit;
use crate::types::{Action, InputElement, Instructions, RuleInput, TrieTarget};

/// Scan `sequence` from every start position and collect the resulting
/// actions, stably sorted by start and rule order.
///
/// `fired` holds the boolean rules already reported for the current request;
/// a boolean rule completing again in another sequence is dropped.
pub(crate) fn rewrite_actions<'c>(
    collection: &'c RulesCollection,
    sequence: &TermPositionSequence,
    fired: &mut HashSet<usize>,
) -> Vec<Action<'c>> {
    let len = sequence.len();
    let positions: Vec<Vec<Cow<'_, str>>> = (0..len)
        .map(|p| {
            sequence
                .position(p)
                .iter()
                .map(|t| collection.config.normalize(&t.value))
                .collect()
        })
        .collect();

    let mut evaluation = collection.network.evaluation();
    let mut actions = Vec::new();

    for start in 0..len {
        for hit in collection.trie.lookup(&positions, start) {
            let terms = hit_terms(sequence, &hit);
            let mut matched: Vec<&'c Instructions> = Vec::new();

            for target in hit.targets {
                match *target {
                    TrieTarget::Rule(index) => {
                        let rule = &collection.rules[index];
                        if let RuleInput::Simple(elements) = &rule.input {
                            if fields_match(elements, &terms) {
                                matched.push(&rule.instructions);
                            }
                        }
                    }
                    TrieTarget::Literal(id) => {
                        let literal = collection.literals.literal(id);
                        if fields_match(std::slice::from_ref(literal), &terms) {
                            evaluation.notify_literal(id, hit.start, hit.end());
                        }
                    }
                }
            }

            if !matched.is_empty() {
                actions.push(Action {
                    instructions_list: matched,
                    matched_terms: terms.into_iter().cloned().collect(),
                    start: hit.start,
                    end: hit.end(),
                    wildcard_suffix: hit.suffix.clone(),
                });
            }
        }

        for completion in evaluation.evaluate(len) {
            if fired.insert(completion.rule) {
                actions.push(boolean_action(collection, sequence, completion));
            }
        }
    }

    for completion in evaluation.finish(len) {
        if fired.insert(completion.rule) {
            actions.push(boolean_action(collection, sequence, completion));
        }
    }

    actions.sort_by_key(|a| (a.start, a.order()));
    actions
}

fn hit_terms<'s>(sequence: &'s TermPositionSequence, hit: &TrieHit<'_>) -> Vec<&'s TermRef> {
    hit.choice
        .iter()
        .enumerate()
        .map(|(offset, &alt)| &sequence.position(hit.start + offset)[alt])
        .collect()
}

/// Whether every consumed term satisfies the field restriction of the
/// element it was matched against.
fn fields_match(elements: &[InputElement], terms: &[&TermRef]) -> bool {
    let mut terms = terms.iter();
    for element in elements {
        for _ in element.term_values() {
            match terms.next() {
                Some(term) if element.accepts_fields(&term.fields) => {}
                _ => return false,
            }
        }
    }
    true
}

fn boolean_action<'c>(
    collection: &'c RulesCollection,
    sequence: &TermPositionSequence,
    completion: Completion,
) -> Action<'c> {
    Action {
        instructions_list: vec![&collection.rules[completion.rule].instructions],
        matched_terms: sequence.span(completion.start, completion.end),
        start: completion.start,
        end: completion.end,
        wildcard_suffix: None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use crate::query::{NodeId, TermPositionSequence, TermRef};
    use crate::{RulesCollection, RulesConfig};

    fn collection(text: &str) -> RulesCollection {
        RulesCollection::from_rules_text(text).unwrap()
    }

    fn summary(collection: &RulesCollection, seq: &TermPositionSequence) -> Vec<(String, usize, usize)> {
        collection
            .rewrite_actions(seq)
            .iter()
            .map(|a| (a.instructions_list[0].id_text(), a.start, a.end))
            .collect()
    }

    #[test]
    fn simple_contiguous_match() {
        let c = collection("aa l =>\n  SYNONYM: x\n  @_id: \"r\"");
        let seq = TermPositionSequence::from_values(["aa", "l"]);
        let actions = c.rewrite_actions(&seq);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].matched_values(), vec!["aa", "l"]);
        assert_eq!((actions[0].start, actions[0].end), (0, 2));

        let gap = TermPositionSequence::from_values(["aa", "x", "l"]);
        assert!(c.rewrite_actions(&gap).is_empty());
    }

    #[test]
    fn overlapping_simple_and_boolean() {
        let c = collection("a b =>\n  SYNONYM: s\n  @_id: \"ab\"\na AND c =>\n  UP: u\n  @_id: \"ac\"");
        let seq = TermPositionSequence::from_values(["a", "b", "c", "l"]);
        let actions = c.rewrite_actions(&seq);
        assert_eq!(
            summary(&c, &seq),
            vec![("ab".to_owned(), 0, 2), ("ac".to_owned(), 0, 3)]
        );
        assert_eq!(actions[1].matched_values(), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_break_by_rule_order() {
        let c = collection("b =>\n  UP: x\n  @_id: \"first\"\na b =>\n  UP: y\n  @_id: \"second\"\na =>\n  UP: z\n  @_id: \"third\"");
        let seq = TermPositionSequence::from_values(["a", "b"]);
        assert_eq!(
            summary(&c, &seq),
            vec![
                ("second".to_owned(), 0, 2),
                ("third".to_owned(), 0, 1),
                ("first".to_owned(), 1, 2),
            ]
        );
    }

    #[test]
    fn same_input_rules_share_one_action() {
        let c = collection("a =>\n  UP: x\na =>\n  DOWN: y");
        let actions = c.rewrite_actions(&TermPositionSequence::from_values(["a"]));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].instructions_list.len(), 2);
    }

    #[test]
    fn prefix_match_carries_suffix() {
        let c = collection("lap* =>\n  SYNONYM: note$1");
        let actions = c.rewrite_actions(&TermPositionSequence::from_values(["laptops"]));
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].wildcard_suffix.as_deref(), Some("tops"));
    }

    #[test]
    fn query_values_are_normalized() {
        let c = collection("laptop =>\n  UP: x");
        let actions = c.rewrite_actions(&TermPositionSequence::from_values(["LapTop"]));
        assert_eq!(actions.len(), 1);

        let strict = RulesCollection::from_rules_text_with_config(
            "laptop =>\n  UP: x",
            RulesConfig::new().normalizer(crate::IdentityNormalizer),
        )
        .unwrap();
        assert!(strict
            .rewrite_actions(&TermPositionSequence::from_values(["LapTop"]))
            .is_empty());
    }

    #[test]
    fn field_restriction_filters_terms() {
        let c = collection("title:apple =>\n  UP: x");
        let mut seq = TermPositionSequence::new();
        seq.push_position(vec![TermRef {
            id: NodeId(1),
            value: "apple".into(),
            fields: BTreeSet::from(["brand".to_owned()]),
        }]);
        assert!(c.rewrite_actions(&seq).is_empty());

        let mut seq = TermPositionSequence::new();
        seq.push_position(vec![TermRef {
            id: NodeId(1),
            value: "apple".into(),
            fields: BTreeSet::from(["title".to_owned(), "body".to_owned()]),
        }]);
        assert_eq!(c.rewrite_actions(&seq).len(), 1);
    }

    #[test]
    fn boolean_not_matches_on_absence() {
        let c = collection("a AND NOT b =>\n  UP: x");
        assert_eq!(
            c.rewrite_actions(&TermPositionSequence::from_values(["c", "a"])).len(),
            1
        );
        assert!(c
            .rewrite_actions(&TermPositionSequence::from_values(["b", "a"]))
            .is_empty());
    }

    #[test]
    fn boolean_multi_term_literal_is_contiguous() {
        let c = collection("iphone 12 AND case =>\n  UP: x");
        assert_eq!(
            c.rewrite_actions(&TermPositionSequence::from_values(["case", "iphone", "12"]))
                .len(),
            1
        );
        assert!(c
            .rewrite_actions(&TermPositionSequence::from_values(["iphone", "case", "12"]))
            .is_empty());
    }

    #[test]
    fn boolean_rule_fires_once_across_sequences() {
        let c = collection("a AND b =>\n  UP: x\nb =>\n  UP: y");
        let seq = TermPositionSequence::from_values(["a", "b"]);
        let mut fired = HashSet::new();
        let first = super::rewrite_actions(&c, &seq, &mut fired);
        let second = super::rewrite_actions(&c, &seq, &mut fired);
        assert_eq!(first.len(), 2);
        // the simple rule matches again, the boolean one does not
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].instructions_list[0].id_text(), "b#1");
    }

    #[test]
    fn nothing_matches_on_empty_sequence() {
        let c = collection("a =>\n  UP: x");
        assert!(c.rewrite_actions(&TermPositionSequence::new()).is_empty());
    }
}
