use thiserror::Error;

use super::model::{Occur, Query, Term};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryParseError {
    #[error("query text is empty")]
    Empty,

    #[error("invalid token '{token}': {reason}")]
    InvalidToken { token: String, reason: &'static str },
}

/// Builds a structured [`Query`] from the text of an `UP`, `DOWN` or `FILTER`
/// instruction.
pub trait QueryParser: Send + Sync + std::fmt::Debug {
    /// # Errors
    ///
    /// Returns [`QueryParseError`] if `text` cannot be turned into a query.
    fn parse(&self, text: &str) -> Result<Query, QueryParseError>;
}

/// Splits on whitespace; one disjunction group per token.
///
/// A leading `+` or `-` makes the group `MUST` or `MUST_NOT`, and
/// `field:value` restricts the term to one field.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceQueryParser;

impl QueryParser for WhitespaceQueryParser {
    fn parse(&self, text: &str) -> Result<Query, QueryParseError> {
        let mut query = Query::new();
        let root = query.root();

        for token in text.split_whitespace() {
            let (occur, rest) = match token.as_bytes()[0] {
                b'+' => (Occur::Must, &token[1..]),
                b'-' => (Occur::MustNot, &token[1..]),
                _ => (Occur::Should, token),
            };
            let term = match rest.split_once(':') {
                Some((field, value)) if !field.is_empty() => {
                    if value.is_empty() {
                        return Err(QueryParseError::InvalidToken {
                            token: token.to_owned(),
                            reason: "missing value after field",
                        });
                    }
                    Term::new(value).in_fields([field])
                }
                _ => Term::new(rest),
            };
            if term.value.is_empty() {
                return Err(QueryParseError::InvalidToken {
                    token: token.to_owned(),
                    reason: "operator without a term",
                });
            }
            let dmq = query.add_dismax(root, occur, false);
            query.add_term(dmq, term);
        }

        if query.is_empty() {
            return Err(QueryParseError::Empty);
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_terms_with_occur_and_fields() {
        let q = WhitespaceQueryParser.parse("+brand:acme -refurbished cheap").unwrap();
        assert_eq!(q.to_string(), "+brand:acme -refurbished cheap");
    }

    #[test]
    fn empty_text_fails() {
        assert_eq!(WhitespaceQueryParser.parse("   "), Err(QueryParseError::Empty));
    }

    #[test]
    fn dangling_operator_fails() {
        assert!(matches!(
            WhitespaceQueryParser.parse("a +"),
            Err(QueryParseError::InvalidToken { .. })
        ));
    }

    #[test]
    fn field_without_value_fails() {
        assert!(matches!(
            WhitespaceQueryParser.parse("brand:"),
            Err(QueryParseError::InvalidToken { .. })
        ));
    }
}
