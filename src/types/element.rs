use std::collections::BTreeSet;
use std::fmt;

/// A literal term condition: a value, an optional field restriction, and a
/// prefix flag.
///
/// Values may contain single spaces; such a literal spans several consecutive
/// query positions. Elements are normalized by the rules compiler before they
/// reach the matching structures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputElement {
    pub value: String,
    pub fields: BTreeSet<String>,
    pub is_prefix: bool,
}

impl InputElement {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            fields: BTreeSet::new(),
            is_prefix: false,
        }
    }

    #[must_use]
    pub fn prefix(value: impl Into<String>) -> Self {
        Self {
            is_prefix: true,
            ..Self::new(value)
        }
    }

    /// Restrict this element to the given field names.
    #[must_use]
    pub fn in_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Equality by value and fields, ignoring the prefix flag.
    #[must_use]
    pub fn same_term(&self, other: &InputElement) -> bool {
        self.value == other.value && self.fields == other.fields
    }

    /// Whether a query term carrying `fields` satisfies this element's field
    /// restriction. An unrestricted element accepts any term; a restricted one
    /// needs at least one shared field name.
    #[must_use]
    pub fn accepts_fields(&self, fields: &BTreeSet<String>) -> bool {
        self.fields.is_empty() || !self.fields.is_disjoint(fields)
    }

    /// Whether a normalized query term value matches this element's value,
    /// taking the prefix flag into account. Prefix elements need a strictly
    /// longer term.
    #[must_use]
    pub fn accepts_value(&self, value: &str) -> bool {
        if self.is_prefix {
            value.len() > self.value.len() && value.starts_with(&self.value)
        } else {
            value == self.value
        }
    }

    /// The individual term values of a (possibly multi-term) element.
    pub fn term_values(&self) -> impl Iterator<Item = &str> {
        self.value.split(' ').filter(|v| !v.is_empty())
    }
}

impl fmt::Display for InputElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.fields.iter().map(String::as_str).collect();
        write!(f, "fields=[{}] value={}", fields.join(","), self.value)?;
        if self.is_prefix {
            write!(f, "*")?;
        }
        Ok(())
    }
}
