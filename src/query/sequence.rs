use std::collections::BTreeSet;

use super::model::{Node, NodeId, Query};

/// A snapshot of a query term taken when a sequence is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRef {
    pub id: NodeId,
    pub value: String,
    pub fields: BTreeSet<String>,
}

/// Positions `0..N-1` of one boolean query, each holding the alternative
/// terms of a disjunction group. Generated terms are left out so that rules
/// never match on the output of earlier rewrites.
///
/// The sequence is a snapshot: mutating the query afterwards does not change
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermPositionSequence {
    positions: Vec<Vec<TermRef>>,
}

impl TermPositionSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence with a single unrestricted term per position and
    /// synthetic node ids. Convenient for matching without a query.
    #[must_use]
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seq = Self::new();
        for (i, value) in values.into_iter().enumerate() {
            seq.push_position(vec![TermRef {
                id: NodeId(i),
                value: value.into(),
                fields: BTreeSet::new(),
            }]);
        }
        seq
    }

    pub fn push_position(&mut self, alternatives: Vec<TermRef>) {
        self.positions.push(alternatives);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The alternatives at `position`.
    ///
    /// # Panics
    ///
    /// Panics if `position` is out of bounds.
    #[must_use]
    pub fn position(&self, position: usize) -> &[TermRef] {
        &self.positions[position]
    }

    /// Every alternative of every position in `start..end`.
    #[must_use]
    pub fn span(&self, start: usize, end: usize) -> Vec<TermRef> {
        self.positions[start..end].iter().flatten().cloned().collect()
    }

    /// One sequence per non-generated boolean query in `query`, depth first
    /// with a parent before its nested queries.
    #[must_use]
    pub fn from_query(query: &Query) -> Vec<TermPositionSequence> {
        let mut out = Vec::new();
        collect(query, query.root(), &mut out);
        out
    }
}

fn collect(query: &Query, boolean: NodeId, out: &mut Vec<TermPositionSequence>) {
    let slot = out.len();
    out.push(TermPositionSequence::new());
    let mut nested = Vec::new();

    for &clause in query.children(boolean) {
        match query.node(clause) {
            Some(Node::DisMax { disjuncts, .. }) => {
                let mut alternatives = Vec::new();
                for &d in disjuncts {
                    match query.node(d) {
                        Some(Node::Term(term)) if !term.generated => alternatives.push(TermRef {
                            id: d,
                            value: term.value.clone(),
                            fields: term.fields.clone(),
                        }),
                        Some(Node::Boolean {
                            generated: false, ..
                        }) => nested.push(d),
                        _ => {}
                    }
                }
                out[slot].push_position(alternatives);
            }
            Some(Node::Boolean {
                generated: false, ..
            }) => nested.push(clause),
            _ => {}
        }
    }

    for id in nested {
        collect(query, id, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Occur, Term};

    fn values(seq: &TermPositionSequence) -> Vec<Vec<&str>> {
        (0..seq.len())
            .map(|p| seq.position(p).iter().map(|t| t.value.as_str()).collect())
            .collect()
    }

    #[test]
    fn flat_query_yields_one_sequence() {
        let q = Query::from_terms(["a", "b", "c"]);
        let seqs = TermPositionSequence::from_query(&q);
        assert_eq!(seqs.len(), 1);
        assert_eq!(values(&seqs[0]), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn alternatives_share_a_position_and_generated_are_skipped() {
        let mut q = Query::new();
        let root = q.root();
        let dmq = q.add_dismax(root, Occur::Should, false);
        q.add_term(dmq, Term::new("tv"));
        q.add_term(dmq, Term::new("television"));
        q.add_term(dmq, Term::generated("telly"));
        let seqs = TermPositionSequence::from_query(&q);
        assert_eq!(values(&seqs[0]), vec![vec!["tv", "television"]]);
    }

    #[test]
    fn nested_boolean_gets_its_own_sequence() {
        let mut q = Query::from_terms(["a"]);
        let dmq = q.children(q.root())[0];
        let nested = q.add_boolean(dmq, Occur::Should, false);
        for v in ["x", "y"] {
            let inner = q.add_dismax(nested, Occur::Must, false);
            q.add_term(inner, Term::new(v));
        }
        let generated = q.add_boolean(dmq, Occur::Should, true);
        let inner = q.add_dismax(generated, Occur::Must, true);
        q.add_term(inner, Term::generated("z"));

        let seqs = TermPositionSequence::from_query(&q);
        assert_eq!(seqs.len(), 2);
        assert_eq!(values(&seqs[0]), vec![vec!["a"]]);
        assert_eq!(values(&seqs[1]), vec![vec!["x"], vec!["y"]]);
    }

    #[test]
    fn sequence_is_a_snapshot() {
        let mut q = Query::from_terms(["a", "b"]);
        let seqs = TermPositionSequence::from_query(&q);
        let (a, _) = q.terms()[0];
        q.remove_term(a);
        assert_eq!(values(&seqs[0]), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn span_flattens_alternatives() {
        let seq = TermPositionSequence::from_values(["a", "b", "c"]);
        let span: Vec<String> = seq.span(1, 3).into_iter().map(|t| t.value).collect();
        assert_eq!(span, vec!["b", "c"]);
    }
}
