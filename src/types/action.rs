use std::fmt;

use super::instruction::Instructions;
use crate::query::TermRef;

/// One realized rule match against a specific query: the instructions to
/// apply, the terms the match covered, and its position span.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Action<'c> {
    pub instructions_list: Vec<&'c Instructions>,
    pub matched_terms: Vec<TermRef>,
    pub start: usize,
    /// Exclusive.
    pub end: usize,
    /// The part of the last matched term beyond a prefix input (`lap*`
    /// matching `laptops` yields `tops`). Substituted for `$1` in synonyms.
    pub wildcard_suffix: Option<String>,
}

impl Action<'_> {
    /// The lowest rule order among this action's instructions.
    #[must_use]
    pub fn order(&self) -> usize {
        self.instructions_list
            .iter()
            .map(|i| i.order)
            .min()
            .unwrap_or(usize::MAX)
    }

    #[must_use]
    pub fn matched_values(&self) -> Vec<&str> {
        self.matched_terms.iter().map(|t| t.value.as_str()).collect()
    }
}

impl fmt::Display for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.instructions_list.iter().map(|i| i.id_text()).collect();
        write!(
            f,
            "[{}] {}..{} -> {}",
            self.matched_values().join(" "),
            self.start,
            self.end,
            ids.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TermPositionSequence;

    #[test]
    fn order_is_minimum_over_instructions() {
        let a = Instructions::new(4, "a", vec![]);
        let b = Instructions::new(2, "b", vec![]);
        let action = Action {
            instructions_list: vec![&a, &b],
            matched_terms: vec![],
            start: 0,
            end: 1,
            wildcard_suffix: None,
        };
        assert_eq!(action.order(), 2);
    }

    #[test]
    fn display_shows_terms_span_and_ids() {
        let ins = Instructions::new(0, "r1", vec![]);
        let seq = TermPositionSequence::from_values(["aa", "l"]);
        let action = Action {
            instructions_list: vec![&ins],
            matched_terms: seq.span(0, 2),
            start: 0,
            end: 2,
            wildcard_suffix: None,
        };
        assert_eq!(action.to_string(), "[aa l] 0..2 -> r1");
    }
}
