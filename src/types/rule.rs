use super::input::RuleInput;
use super::instruction::Instructions;

/// A rule: a condition on the query's terms and the instructions it triggers.
///
/// Rules are produced by the rules text compiler or assembled by hand and
/// added to a [`RulesCollectionBuilder`](crate::RulesCollectionBuilder).
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub input: RuleInput,
    pub instructions: Instructions,
}

impl Rule {
    #[must_use]
    pub fn new(input: RuleInput, instructions: Instructions) -> Self {
        Self {
            input,
            instructions,
        }
    }
}

/// Where a trie terminal points: a simple-input rule, or a literal of the
/// boolean network. A boolean literal behaves like a synthetic rule whose
/// only effect is to notify the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TrieTarget {
    /// Index into `RulesCollection::rules`.
    Rule(usize),
    Literal(super::LiteralId),
}
