use std::fmt;
use std::ops::Not;

use super::InputElement;

/// The condition part of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleInput {
    /// An ordered, contiguous sequence of literals.
    Simple(Vec<InputElement>),
    /// An AND/OR/NOT expression over literals, matched by co-occurrence.
    Boolean { expr: BooleanExpr, source: String },
}

impl RuleInput {
    /// The literals a `DELETE` instruction may refer to: the simple input's
    /// elements, or every literal of a boolean expression.
    #[must_use]
    pub fn elements(&self) -> Vec<&InputElement> {
        match self {
            RuleInput::Simple(elements) => elements.iter().collect(),
            RuleInput::Boolean { expr, .. } => {
                let mut out = Vec::new();
                expr.collect_literals(&mut out);
                out
            }
        }
    }

    #[must_use]
    pub fn is_boolean(&self) -> bool {
        matches!(self, RuleInput::Boolean { .. })
    }
}

/// User-facing boolean expression tree over literals.
/// Literals are interned into a [`LiteralRegister`](super::LiteralRegister)
/// when a rules collection is built.
#[derive(Debug, Clone, PartialEq)]
pub enum BooleanExpr {
    Literal(InputElement),
    And(Vec<BooleanExpr>),
    Or(Vec<BooleanExpr>),
    Not(Box<BooleanExpr>),
}

impl BooleanExpr {
    /// Combine with `other` under AND, flattening nested ANDs.
    #[must_use]
    pub fn and(self, other: BooleanExpr) -> BooleanExpr {
        match self {
            BooleanExpr::And(mut children) => {
                children.push(other);
                BooleanExpr::And(children)
            }
            lhs => BooleanExpr::And(vec![lhs, other]),
        }
    }

    /// Combine with `other` under OR, flattening nested ORs.
    #[must_use]
    pub fn or(self, other: BooleanExpr) -> BooleanExpr {
        match self {
            BooleanExpr::Or(mut children) => {
                children.push(other);
                BooleanExpr::Or(children)
            }
            lhs => BooleanExpr::Or(vec![lhs, other]),
        }
    }

    /// Whether at least one literal is reachable without passing a NOT.
    #[must_use]
    pub fn has_positive_literal(&self) -> bool {
        match self {
            BooleanExpr::Literal(_) => true,
            BooleanExpr::And(children) | BooleanExpr::Or(children) => {
                children.iter().any(BooleanExpr::has_positive_literal)
            }
            BooleanExpr::Not(_) => false,
        }
    }

    fn collect_literals<'a>(&'a self, out: &mut Vec<&'a InputElement>) {
        match self {
            BooleanExpr::Literal(el) => out.push(el),
            BooleanExpr::And(children) | BooleanExpr::Or(children) => {
                for child in children {
                    child.collect_literals(out);
                }
            }
            BooleanExpr::Not(inner) => inner.collect_literals(out),
        }
    }
}

impl Not for BooleanExpr {
    type Output = BooleanExpr;

    fn not(self) -> BooleanExpr {
        BooleanExpr::Not(Box::new(self))
    }
}

impl fmt::Display for BooleanExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[BooleanExpr], op: &str) -> fmt::Result {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{child}")?;
            }
            write!(f, ")")
        }

        match self {
            BooleanExpr::Literal(el) => {
                write!(f, "{}", el.value)?;
                if el.is_prefix {
                    write!(f, "*")?;
                }
                Ok(())
            }
            BooleanExpr::And(children) => join(f, children, "AND"),
            BooleanExpr::Or(children) => join(f, children, "OR"),
            BooleanExpr::Not(inner) => write!(f, "(NOT {inner})"),
        }
    }
}

/// Shorthand for a literal expression on an unrestricted, non-prefix value.
#[must_use]
pub fn literal(value: &str) -> BooleanExpr {
    BooleanExpr::Literal(InputElement::new(value))
}
