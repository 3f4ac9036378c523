use std::fmt;

use crate::types::RuleErrorKind;

/// A compile-time rule error, positioned at a 1-based line of the rules text
/// when it comes from text.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleParseError {
    line: Option<usize>,
    kind: RuleErrorKind,
}

impl RuleParseError {
    pub(crate) fn new(kind: RuleErrorKind) -> Self {
        Self { line: None, kind }
    }

    pub(crate) fn at(line: usize, kind: RuleErrorKind) -> Self {
        Self {
            line: Some(line),
            kind,
        }
    }

    #[must_use]
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    #[must_use]
    pub fn kind(&self) -> &RuleErrorKind {
        &self.kind
    }
}

impl From<RuleErrorKind> for RuleParseError {
    fn from(kind: RuleErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for RuleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "rule error at line {line}: {}", self.kind),
            None => write!(f, "rule error: {}", self.kind),
        }
    }
}

impl std::error::Error for RuleParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
