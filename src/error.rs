use thiserror::Error;

use crate::parse::RuleParseError;
use crate::types::MatchRuntimeError;

/// Unified error type covering rule compilation, request-time failures, and
/// I/O.
///
/// Returned by convenience methods like
/// [`RulesCollection::from_rules_text()`](crate::RulesCollection::from_rules_text),
/// [`RulesCollection::from_file()`](crate::RulesCollection::from_file), and by
/// [`RewriteEngine::rewrite()`](crate::RewriteEngine::rewrite) when it is set to
/// fail fast.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error(transparent)]
    Parse(#[from] RuleParseError),

    #[error(transparent)]
    Runtime(#[from] MatchRuntimeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
