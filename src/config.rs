//! Compile-time configuration for a rules collection.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::query::{QueryParser, WhitespaceQueryParser};
use crate::types::InstructionType;

bitflags::bitflags! {
    /// The set of instruction types a rules text may use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InstructionTypes: u8 {
        const SYNONYM  = 1 << 0;
        const UP       = 1 << 1;
        const DOWN     = 1 << 2;
        const FILTER   = 1 << 3;
        const DELETE   = 1 << 4;
        const DECORATE = 1 << 5;
        const REPLACE  = 1 << 6;
    }
}

impl InstructionTypes {
    #[must_use]
    pub fn supports(self, ty: InstructionType) -> bool {
        self.contains(Self::from(ty))
    }
}

impl From<InstructionType> for InstructionTypes {
    fn from(ty: InstructionType) -> Self {
        match ty {
            InstructionType::Synonym => Self::SYNONYM,
            InstructionType::Up => Self::UP,
            InstructionType::Down => Self::DOWN,
            InstructionType::Filter => Self::FILTER,
            InstructionType::Delete => Self::DELETE,
            InstructionType::Decorate => Self::DECORATE,
            InstructionType::Replace => Self::REPLACE,
        }
    }
}

/// Normalizes rule literals and query term values before matching. Applied
/// uniformly to both sides.
pub trait TermNormalizer: Send + Sync + fmt::Debug {
    fn normalize<'a>(&self, value: &'a str) -> Cow<'a, str>;
}

/// Lowercases values; the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowercaseNormalizer;

impl TermNormalizer for LowercaseNormalizer {
    fn normalize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        if value.chars().any(char::is_uppercase) {
            Cow::Owned(value.to_lowercase())
        } else {
            Cow::Borrowed(value)
        }
    }
}

/// Leaves values untouched (case-sensitive matching).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl TermNormalizer for IdentityNormalizer {
    fn normalize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(value)
    }
}

/// Configuration used when compiling rules.
///
/// # Example
///
/// ```
/// use qrewrite::{InstructionTypes, RulesConfig};
///
/// let config = RulesConfig::new()
///     .instruction_types(InstructionTypes::SYNONYM | InstructionTypes::DELETE)
///     .boolean_input(false);
/// assert!(!config.allows_boolean_input());
/// ```
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub(crate) instruction_types: InstructionTypes,
    pub(crate) boolean_input: bool,
    pub(crate) normalizer: Arc<dyn TermNormalizer>,
    pub(crate) query_parser: Arc<dyn QueryParser>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            instruction_types: InstructionTypes::all(),
            boolean_input: true,
            normalizer: Arc::new(LowercaseNormalizer),
            query_parser: Arc::new(WhitespaceQueryParser),
        }
    }
}

impl RulesConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the instruction types rules may use.
    #[must_use]
    pub fn instruction_types(mut self, types: InstructionTypes) -> Self {
        self.instruction_types = types;
        self
    }

    /// Enable or disable `AND`/`OR`/`NOT` inputs. When disabled, operator
    /// words are plain literals.
    #[must_use]
    pub fn boolean_input(mut self, enabled: bool) -> Self {
        self.boolean_input = enabled;
        self
    }

    #[must_use]
    pub fn normalizer(mut self, normalizer: impl TermNormalizer + 'static) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    /// The parser for `UP`/`DOWN`/`FILTER` query text. It validates the text at
    /// compile time and, unless the engine overrides it, builds the sub-queries
    /// at request time.
    #[must_use]
    pub fn query_parser(mut self, parser: impl QueryParser + 'static) -> Self {
        self.query_parser = Arc::new(parser);
        self
    }

    #[must_use]
    pub fn supported_types(&self) -> InstructionTypes {
        self.instruction_types
    }

    #[must_use]
    pub fn allows_boolean_input(&self) -> bool {
        self.boolean_input
    }

    pub(crate) fn normalize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        self.normalizer.normalize(value)
    }
}
