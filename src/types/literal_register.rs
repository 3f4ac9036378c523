use std::collections::HashMap;

use super::InputElement;

/// Index of an interned boolean-input literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LiteralId(pub(crate) usize);

impl LiteralId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Interns literals by `(value, fields, is_prefix)` so that a literal shared by
/// many boolean rules is matched once and feeds every rule that uses it.
#[derive(Debug, Clone, Default)]
pub struct LiteralRegister {
    ids: HashMap<InputElement, LiteralId>,
    literals: Vec<InputElement>,
}

impl LiteralRegister {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a literal, returning its id. A literal that is already
    /// registered keeps its existing id.
    pub(crate) fn register(&mut self, literal: &InputElement) -> LiteralId {
        if let Some(&id) = self.ids.get(literal) {
            return id;
        }
        let id = LiteralId(self.literals.len());
        self.ids.insert(literal.clone(), id);
        self.literals.push(literal.clone());
        id
    }

    /// Look up the id of a registered literal.
    #[must_use]
    pub fn get(&self, literal: &InputElement) -> Option<LiteralId> {
        self.ids.get(literal).copied()
    }

    /// Resolve an id back to its literal.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this register.
    #[must_use]
    pub fn literal(&self, id: LiteralId) -> &InputElement {
        &self.literals[id.0]
    }

    /// The number of distinct literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Iterate over `(id, literal)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (LiteralId, &InputElement)> {
        self.literals
            .iter()
            .enumerate()
            .map(|(i, lit)| (LiteralId(i), lit))
    }
}
