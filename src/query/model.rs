use std::collections::BTreeSet;
use std::fmt;

/// Index of a node in a [`Query`] arena. Ids stay valid (and are never reused)
/// when other nodes are added or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// How a clause participates in its parent boolean query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Occur {
    #[default]
    Should,
    Must,
    MustNot,
}

impl Occur {
    fn marker(self) -> &'static str {
        match self {
            Occur::Should => "",
            Occur::Must => "+",
            Occur::MustNot => "-",
        }
    }
}

/// A token occupying one query position.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub value: String,
    /// Fields the term is restricted to; empty means all fields.
    pub fields: BTreeSet<String>,
    /// Set on terms produced by a rewrite.
    pub generated: bool,
    pub boost: f32,
}

impl Term {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            fields: BTreeSet::new(),
            generated: false,
            boost: 1.0,
        }
    }

    #[must_use]
    pub fn generated(value: impl Into<String>) -> Self {
        Self {
            generated: true,
            ..Self::new(value)
        }
    }

    #[must_use]
    pub fn in_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

/// A node of the query tree.
///
/// Boolean queries hold clauses (disjunction groups or nested boolean
/// queries); a disjunction-max group holds alternative terms or nested
/// boolean queries and forms one query position.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Boolean {
        occur: Occur,
        generated: bool,
        clauses: Vec<NodeId>,
    },
    DisMax {
        occur: Occur,
        generated: bool,
        disjuncts: Vec<NodeId>,
    },
    Term(Term),
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    parent: Option<NodeId>,
    node: Node,
}

/// A mutable boolean / disjunction-max / term tree stored in an arena.
///
/// Removed nodes leave a tombstone so that ids held elsewhere (for instance
/// by already-collected actions) can be detected as stale instead of
/// silently pointing at a different node.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    slots: Vec<Option<Slot>>,
    root: NodeId,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    /// An empty boolean query.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![Some(Slot {
                parent: None,
                node: Node::Boolean {
                    occur: Occur::Should,
                    generated: false,
                    clauses: Vec::new(),
                },
            })],
            root: NodeId(0),
        }
    }

    /// A query with one `SHOULD` disjunction group per term.
    #[must_use]
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut query = Self::new();
        let root = query.root();
        for value in terms {
            let dmq = query.add_dismax(root, Occur::Should, false);
            query.add_term(dmq, Term::new(value));
        }
        query
    }

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The node behind `id`, or `None` if it was removed.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0)?.as_ref().map(|s| &s.node)
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots.get(id.0)?.as_ref()?.parent
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    #[must_use]
    pub fn term(&self, id: NodeId) -> Option<&Term> {
        match self.node(id)? {
            Node::Term(term) => Some(term),
            _ => None,
        }
    }

    /// Whether the root query has no clauses left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Children of a boolean or disjunction node; empty for terms.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(Node::Boolean { clauses, .. }) => clauses,
            Some(Node::DisMax { disjuncts, .. }) => disjuncts,
            _ => &[],
        }
    }

    /// Add a disjunction group to a boolean query.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a live boolean node.
    pub fn add_dismax(&mut self, parent: NodeId, occur: Occur, generated: bool) -> NodeId {
        self.add_clause(
            parent,
            Node::DisMax {
                occur,
                generated,
                disjuncts: Vec::new(),
            },
        )
    }

    /// Add a nested boolean query to a boolean query or disjunction group.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a live boolean or disjunction node.
    pub fn add_boolean(&mut self, parent: NodeId, occur: Occur, generated: bool) -> NodeId {
        self.add_clause(
            parent,
            Node::Boolean {
                occur,
                generated,
                clauses: Vec::new(),
            },
        )
    }

    /// Add a term to a disjunction group.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not a live disjunction node.
    pub fn add_term(&mut self, parent: NodeId, term: Term) -> NodeId {
        self.add_clause(parent, Node::Term(term))
    }

    /// Attach a childless node under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if the node kind cannot live under `parent`, or if `node`
    /// already carries children.
    pub fn add_clause(&mut self, parent: NodeId, node: Node) -> NodeId {
        assert!(
            self.children_of_node(&node).is_empty(),
            "add_clause expects a childless node"
        );
        let id = NodeId(self.slots.len());
        let slot = self
            .slots
            .get_mut(parent.0)
            .and_then(Option::as_mut)
            .expect("parent node must be live");
        match (&mut slot.node, &node) {
            (Node::Boolean { clauses, .. }, Node::DisMax { .. } | Node::Boolean { .. }) => {
                clauses.push(id);
            }
            (Node::DisMax { disjuncts, .. }, Node::Term(_) | Node::Boolean { .. }) => {
                disjuncts.push(id);
            }
            (parent_node, child) => {
                panic!("cannot add {child:?} under {parent_node:?}")
            }
        }
        self.slots.push(Some(Slot {
            parent: Some(parent),
            node,
        }));
        id
    }

    fn children_of_node<'a>(&self, node: &'a Node) -> &'a [NodeId] {
        match node {
            Node::Boolean { clauses, .. } => clauses,
            Node::DisMax { disjuncts, .. } => disjuncts,
            Node::Term(_) => &[],
        }
    }

    /// Remove a term. A disjunction group left without disjuncts is removed
    /// too, and so on upwards; the root is never removed.
    ///
    /// Returns `false` if `id` is not a live term.
    pub fn remove_term(&mut self, id: NodeId) -> bool {
        if self.term(id).is_none() {
            return false;
        }
        let mut current = id;
        loop {
            let parent = self.parent(current);
            self.remove_subtree(current);
            let Some(parent) = parent else { break };
            self.detach(parent, current);
            if parent == self.root || !self.children(parent).is_empty() {
                break;
            }
            current = parent;
        }
        true
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(Some(slot)) = self.slots.get_mut(parent.0) {
            match &mut slot.node {
                Node::Boolean { clauses, .. } => clauses.retain(|&c| c != child),
                Node::DisMax { disjuncts, .. } => disjuncts.retain(|&c| c != child),
                Node::Term(_) => {}
            }
        }
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.remove_subtree(child);
        }
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = None;
        }
    }

    /// Live terms in depth-first order.
    #[must_use]
    pub fn terms(&self) -> Vec<(NodeId, &Term)> {
        let mut out = Vec::new();
        self.collect_terms(self.root, &mut out);
        out
    }

    fn collect_terms<'a>(&'a self, id: NodeId, out: &mut Vec<(NodeId, &'a Term)>) {
        match self.node(id) {
            Some(Node::Term(term)) => out.push((id, term)),
            Some(_) => {
                for &child in self.children(id) {
                    self.collect_terms(child, out);
                }
            }
            None => {}
        }
    }

    /// Turn the root's `SHOULD` clauses into `MUST` clauses. `MUST_NOT`
    /// clauses are kept.
    pub fn require_all_clauses(&mut self) {
        let clauses = self.children(self.root).to_vec();
        for id in clauses {
            if let Some(Some(slot)) = self.slots.get_mut(id.0) {
                match &mut slot.node {
                    Node::Boolean { occur, .. } | Node::DisMax { occur, .. } => {
                        if *occur == Occur::Should {
                            *occur = Occur::Must;
                        }
                    }
                    Node::Term(_) => {}
                }
            }
        }
    }

    /// Mark every node of this query as generated.
    pub fn mark_generated(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            match &mut slot.node {
                Node::Boolean { generated, .. } | Node::DisMax { generated, .. } => {
                    *generated = true;
                }
                Node::Term(term) => term.generated = true,
            }
        }
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node(id) {
            Some(Node::Boolean { clauses, .. }) => {
                let nested = id != self.root;
                if nested {
                    write!(f, "[")?;
                }
                for (i, &clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    if let Some(occur) = self.occur(clause) {
                        write!(f, "{}", occur.marker())?;
                    }
                    self.fmt_node(clause, f)?;
                }
                if nested {
                    write!(f, "]")?;
                }
                Ok(())
            }
            Some(Node::DisMax { disjuncts, .. }) => {
                if disjuncts.len() == 1 {
                    return self.fmt_node(disjuncts[0], f);
                }
                write!(f, "(")?;
                for (i, &d) in disjuncts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    self.fmt_node(d, f)?;
                }
                write!(f, ")")
            }
            Some(Node::Term(term)) => {
                if !term.fields.is_empty() {
                    let fields: Vec<&str> = term.fields.iter().map(String::as_str).collect();
                    if fields.len() == 1 {
                        write!(f, "{}:", fields[0])?;
                    } else {
                        write!(f, "{{{}}}:", fields.join(","))?;
                    }
                }
                write!(f, "{}", term.value)?;
                if (term.boost - 1.0).abs() > f32::EPSILON {
                    write!(f, "^{}", term.boost)?;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn occur(&self, id: NodeId) -> Option<Occur> {
        match self.node(id)? {
            Node::Boolean { occur, .. } | Node::DisMax { occur, .. } => Some(*occur),
            Node::Term(_) => None,
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}
