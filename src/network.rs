//! Incremental evaluation of boolean rule inputs.
//!
//! Every boolean expression is compiled into a shared node graph whose leaves
//! are registered literals. Structurally identical sub-expressions map to the
//! same node, so a literal or clause used by many rules is counted once.
//!
//! Nodes without a `NOT` below them are monotone: once satisfied they stay
//! satisfied, and they are resolved incrementally as literals are reported.
//! Everything else is resolved when the scan has finished.

use std::collections::HashMap;

use crate::types::{BooleanExpr, LiteralId, LiteralRegister};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NodeKind {
    Literal(LiteralId),
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    kind: NodeKind,
    children: Vec<usize>,
}

#[derive(Debug, Clone)]
struct NetNode {
    kind: NodeKind,
    children: Vec<usize>,
    parents: Vec<usize>,
    monotone: bool,
    /// Boolean rules whose whole expression is this node.
    rules: Vec<usize>,
}

/// One boolean rule in the network.
#[derive(Debug, Clone)]
struct BooleanRule {
    /// Index into the owning collection's rules.
    rule: usize,
    root: usize,
    /// Literals reachable without crossing a `NOT`; they define the span.
    positive: Vec<LiteralId>,
}

/// The compiled graph of all boolean rule inputs of a collection.
#[derive(Debug, Clone, Default)]
pub(crate) struct BooleanNetwork {
    nodes: Vec<NetNode>,
    keys: HashMap<NodeKey, usize>,
    literal_nodes: HashMap<LiteralId, usize>,
    rules: Vec<BooleanRule>,
}

impl BooleanNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Compile `expr` for collection rule `rule`, registering its literals.
    /// `on_literal` is called for each literal the first time it is seen by
    /// the register.
    pub(crate) fn add_rule(
        &mut self,
        rule: usize,
        expr: &BooleanExpr,
        register: &mut LiteralRegister,
        mut on_literal: impl FnMut(LiteralId),
    ) {
        let root = self.intern(expr, register, &mut on_literal);
        let mut positive = Vec::new();
        collect_positive(expr, register, &mut positive);
        positive.sort_unstable();
        positive.dedup();

        let index = self.rules.len();
        self.rules.push(BooleanRule {
            rule,
            root,
            positive,
        });
        self.nodes[root].rules.push(index);
    }

    fn intern(
        &mut self,
        expr: &BooleanExpr,
        register: &mut LiteralRegister,
        on_literal: &mut impl FnMut(LiteralId),
    ) -> usize {
        let (kind, mut children) = match expr {
            BooleanExpr::Literal(element) => {
                let known = register.get(element).is_some();
                let id = register.register(element);
                if !known {
                    on_literal(id);
                }
                (NodeKind::Literal(id), Vec::new())
            }
            BooleanExpr::And(children) => {
                (NodeKind::And, self.intern_all(children, register, on_literal))
            }
            BooleanExpr::Or(children) => {
                (NodeKind::Or, self.intern_all(children, register, on_literal))
            }
            BooleanExpr::Not(inner) => {
                (NodeKind::Not, vec![self.intern(inner, register, on_literal)])
            }
        };
        children.sort_unstable();
        children.dedup();

        let key = NodeKey {
            kind,
            children: children.clone(),
        };
        if let Some(&existing) = self.keys.get(&key) {
            return existing;
        }

        let monotone = kind != NodeKind::Not && children.iter().all(|&c| self.nodes[c].monotone);
        let id = self.nodes.len();
        for &child in &children {
            self.nodes[child].parents.push(id);
        }
        if let NodeKind::Literal(lit) = kind {
            self.literal_nodes.insert(lit, id);
        }
        self.nodes.push(NetNode {
            kind,
            children,
            parents: Vec::new(),
            monotone,
            rules: Vec::new(),
        });
        self.keys.insert(key, id);
        id
    }

    fn intern_all(
        &mut self,
        exprs: &[BooleanExpr],
        register: &mut LiteralRegister,
        on_literal: &mut impl FnMut(LiteralId),
    ) -> Vec<usize> {
        exprs
            .iter()
            .map(|e| self.intern(e, register, on_literal))
            .collect()
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Start a fresh per-request evaluation.
    pub(crate) fn evaluation(&self) -> Evaluation<'_> {
        Evaluation {
            network: self,
            satisfied: vec![false; self.nodes.len()],
            and_counts: vec![0; self.nodes.len()],
            spans: HashMap::new(),
            fired: vec![false; self.rules.len()],
            pending: Vec::new(),
        }
    }
}

fn collect_positive(expr: &BooleanExpr, register: &LiteralRegister, out: &mut Vec<LiteralId>) {
    match expr {
        BooleanExpr::Literal(element) => {
            if let Some(id) = register.get(element) {
                out.push(id);
            }
        }
        BooleanExpr::And(children) | BooleanExpr::Or(children) => {
            for child in children {
                collect_positive(child, register, out);
            }
        }
        BooleanExpr::Not(_) => {}
    }
}

/// A boolean rule that fired, with the position span it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Completion {
    /// Index into the owning collection's rules.
    pub rule: usize,
    pub start: usize,
    pub end: usize,
}

/// Per-request state over a shared [`BooleanNetwork`].
#[derive(Debug)]
pub(crate) struct Evaluation<'n> {
    network: &'n BooleanNetwork,
    satisfied: Vec<bool>,
    and_counts: Vec<usize>,
    spans: HashMap<LiteralId, (usize, usize)>,
    fired: Vec<bool>,
    pending: Vec<usize>,
}

impl Evaluation<'_> {
    /// Report that `literal` matched positions `start..end`.
    pub(crate) fn notify_literal(&mut self, literal: LiteralId, start: usize, end: usize) {
        self.spans
            .entry(literal)
            .and_modify(|span| {
                span.0 = span.0.min(start);
                span.1 = span.1.max(end);
            })
            .or_insert((start, end));

        let Some(&node) = self.network.literal_nodes.get(&literal) else {
            return;
        };
        if self.satisfied[node] {
            return;
        }

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            self.satisfied[id] = true;
            let current = &self.network.nodes[id];
            for &rule in &current.rules {
                if !self.fired[rule] {
                    self.fired[rule] = true;
                    self.pending.push(rule);
                }
            }
            for &parent in &current.parents {
                let p = &self.network.nodes[parent];
                if !p.monotone || self.satisfied[parent] {
                    continue;
                }
                match p.kind {
                    NodeKind::And => {
                        self.and_counts[parent] += 1;
                        if self.and_counts[parent] == p.children.len() {
                            stack.push(parent);
                        }
                    }
                    NodeKind::Or => {
                        // pushed once: the flag is set before other children can reach it
                        self.satisfied[parent] = true;
                        stack.push(parent);
                    }
                    NodeKind::Literal(_) | NodeKind::Not => {}
                }
            }
        }
    }

    /// Drain the rules completed since the last call, in completion order.
    pub(crate) fn evaluate(&mut self, len: usize) -> Vec<Completion> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .map(|rule| self.completion(rule, len))
            .collect()
    }

    /// Resolve the rules that contain `NOT`, now that every literal of a
    /// sequence of `len` positions has been reported.
    pub(crate) fn finish(&mut self, len: usize) -> Vec<Completion> {
        let mut done = self.evaluate(len);
        let network = self.network;
        for (index, rule) in network.rules.iter().enumerate() {
            if self.fired[index] || network.nodes[rule.root].monotone {
                continue;
            }
            if self.resolve(rule.root) {
                self.fired[index] = true;
                done.push(self.completion(index, len));
            }
        }
        done
    }

    fn resolve(&self, node: usize) -> bool {
        let n = &self.network.nodes[node];
        if n.monotone {
            return self.satisfied[node];
        }
        match n.kind {
            NodeKind::Literal(_) => self.satisfied[node],
            NodeKind::And => n.children.iter().all(|&c| self.resolve(c)),
            NodeKind::Or => n.children.iter().any(|&c| self.resolve(c)),
            NodeKind::Not => !n.children.iter().any(|&c| self.resolve(c)),
        }
    }

    fn completion(&self, index: usize, len: usize) -> Completion {
        let rule = &self.network.rules[index];
        let span = rule
            .positive
            .iter()
            .filter_map(|lit| self.spans.get(lit))
            .fold(None, |acc: Option<(usize, usize)>, &(s, e)| match acc {
                Some((a, b)) => Some((a.min(s), b.max(e))),
                None => Some((s, e)),
            });
        let (start, end) = span.unwrap_or((0, len));
        Completion {
            rule: rule.rule,
            start,
            end,
        }
    }
}
