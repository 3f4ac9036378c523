//! Character trie over normalized literal values.
//!
//! Multi-term keys are stored with their terms joined by [`SEPARATOR`], so a
//! walk that finishes a query term continues into the next position through
//! the separator edge.

use std::collections::HashMap;

use crate::types::TrieTarget;

pub(crate) const SEPARATOR: char = ' ';

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: HashMap<char, usize>,
    exact: Vec<TrieTarget>,
    prefix: Vec<TrieTarget>,
}

/// A terminal reached during a lookup.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrieHit<'t> {
    pub targets: &'t [TrieTarget],
    pub start: usize,
    /// Index of the chosen alternative at each consumed position.
    pub choice: Vec<usize>,
    /// Remainder of the last term past a prefix key; `None` for exact hits.
    pub suffix: Option<String>,
}

impl TrieHit<'_> {
    /// Exclusive end position.
    pub fn end(&self) -> usize {
        self.start + self.choice.len()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LiteralTrie {
    nodes: Vec<TrieNode>,
}

impl Default for LiteralTrie {
    fn default() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
        }
    }
}

impl LiteralTrie {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store `target` under `key`. A prefix key matches any strictly longer
    /// value starting with it.
    pub(crate) fn insert(&mut self, key: &str, is_prefix: bool, target: TrieTarget) {
        let mut current = 0;
        for c in key.chars() {
            current = match self.nodes[current].children.get(&c) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[current].children.insert(c, next);
                    next
                }
            };
        }
        let node = &mut self.nodes[current];
        let targets = if is_prefix {
            &mut node.prefix
        } else {
            &mut node.exact
        };
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    /// Number of trie nodes, root included.
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn child(&self, node: usize, c: char) -> Option<usize> {
        self.nodes[node].children.get(&c).copied()
    }

    /// Every terminal reachable from position `start`. `positions` holds the
    /// normalized values of each position's alternatives.
    pub(crate) fn lookup<S: AsRef<str>>(&self, positions: &[Vec<S>], start: usize) -> Vec<TrieHit<'_>> {
        let mut hits = Vec::new();
        let mut choice = Vec::new();
        self.walk(0, positions, start, start, &mut choice, &mut hits);
        hits
    }

    fn walk<'t, S: AsRef<str>>(
        &'t self,
        node: usize,
        positions: &[Vec<S>],
        start: usize,
        pos: usize,
        choice: &mut Vec<usize>,
        hits: &mut Vec<TrieHit<'t>>,
    ) {
        let Some(alternatives) = positions.get(pos) else {
            return;
        };
        let node = if choice.is_empty() {
            node
        } else {
            match self.child(node, SEPARATOR) {
                Some(next) => next,
                None => return,
            }
        };

        for (alt, value) in alternatives.iter().enumerate() {
            let value = value.as_ref();
            if value.is_empty() {
                continue;
            }
            choice.push(alt);

            let mut current = node;
            let mut complete = true;
            for (idx, c) in value.char_indices() {
                let Some(next) = self.child(current, c) else {
                    complete = false;
                    break;
                };
                current = next;
                let rest = &value[idx + c.len_utf8()..];
                let prefix = &self.nodes[current].prefix;
                if !rest.is_empty() && !prefix.is_empty() {
                    hits.push(TrieHit {
                        targets: prefix,
                        start,
                        choice: choice.clone(),
                        suffix: Some(rest.to_owned()),
                    });
                }
            }

            if complete {
                let exact = &self.nodes[current].exact;
                if !exact.is_empty() {
                    hits.push(TrieHit {
                        targets: exact,
                        start,
                        choice: choice.clone(),
                        suffix: None,
                    });
                }
                self.walk(current, positions, start, pos + 1, choice, hits);
            }
            choice.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LiteralId;

    fn positions(values: &[&[&str]]) -> Vec<Vec<String>> {
        values
            .iter()
            .map(|alts| alts.iter().map(|s| (*s).to_owned()).collect())
            .collect()
    }

    #[test]
    fn exact_single_and_multi_term() {
        let mut trie = LiteralTrie::new();
        trie.insert("aa", false, TrieTarget::Rule(0));
        trie.insert("aa l", false, TrieTarget::Rule(1));

        let pos = positions(&[&["aa"], &["l"], &["x"]]);
        let hits = trie.lookup(&pos, 0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].targets, &[TrieTarget::Rule(0)]);
        assert_eq!(hits[0].end(), 1);
        assert_eq!(hits[1].targets, &[TrieTarget::Rule(1)]);
        assert_eq!(hits[1].end(), 2);
    }

    #[test]
    fn no_match_on_partial_term() {
        let mut trie = LiteralTrie::new();
        trie.insert("laptop", false, TrieTarget::Rule(0));
        assert!(trie.lookup(&positions(&[&["lap"]]), 0).is_empty());
        assert!(trie.lookup(&positions(&[&["laptops"]]), 0).is_empty());
    }

    #[test]
    fn prefix_needs_a_remainder() {
        let mut trie = LiteralTrie::new();
        trie.insert("lap", true, TrieTarget::Rule(0));

        let hits = trie.lookup(&positions(&[&["laptop"]]), 0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].suffix.as_deref(), Some("top"));

        assert!(trie.lookup(&positions(&[&["lap"]]), 0).is_empty());
    }

    #[test]
    fn branches_over_alternatives() {
        let mut trie = LiteralTrie::new();
        trie.insert("a c", false, TrieTarget::Rule(0));

        let pos = positions(&[&["b", "a"], &["d", "c"]]);
        let hits = trie.lookup(&pos, 0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].choice, vec![1, 1]);
    }

    #[test]
    fn lookup_from_later_start() {
        let mut trie = LiteralTrie::new();
        trie.insert("c", false, TrieTarget::Literal(LiteralId(0)));
        let pos = positions(&[&["a"], &["b"], &["c"]]);
        assert!(trie.lookup(&pos, 0).is_empty());
        let hits = trie.lookup(&pos, 2);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start, 2);
        assert_eq!(hits[0].end(), 3);
    }

    #[test]
    fn shared_node_holds_all_targets() {
        let mut trie = LiteralTrie::new();
        trie.insert("a", false, TrieTarget::Rule(0));
        trie.insert("a", false, TrieTarget::Rule(3));
        trie.insert("a", false, TrieTarget::Rule(3));
        let hits = trie.lookup(&positions(&[&["a"]]), 0);
        assert_eq!(hits[0].targets, &[TrieTarget::Rule(0), TrieTarget::Rule(3)]);
    }
}
