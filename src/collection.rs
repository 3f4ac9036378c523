use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::config::RulesConfig;
use crate::error::RewriteError;
use crate::network::BooleanNetwork;
use crate::parse::RuleParseError;
use crate::query::TermPositionSequence;
use crate::trie::LiteralTrie;
use crate::types::{Action, LiteralRegister, Rule};

/// Builder for constructing a [`RulesCollection`] from rules assembled in
/// code.
///
/// # Example
///
/// ```
/// use qrewrite::{
///     InputElement, Instruction, Instructions, Rule, RuleInput, RulesCollectionBuilder,
///     TermPositionSequence,
/// };
///
/// let collection = RulesCollectionBuilder::new()
///     .rule(Rule::new(
///         RuleInput::Simple(vec![InputElement::new("notebook")]),
///         Instructions::new(
///             0,
///             "notebook-synonyms",
///             vec![Instruction::Synonym {
///                 terms: vec![InputElement::new("laptop")],
///                 weight: 1.0,
///             }],
///         ),
///     ))
///     .build()
///     .unwrap();
///
/// let actions = collection.rewrite_actions(&TermPositionSequence::from_values(["notebook"]));
/// assert_eq!(actions.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RulesCollectionBuilder {
    config: RulesConfig,
    rules: Vec<Rule>,
}

impl RulesCollectionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: RulesConfig) -> Self {
        Self {
            config,
            rules: Vec::new(),
        }
    }

    /// Add a rule. Declaration order is the rule's position among the added
    /// rules; `Instructions::order` is used as the tie-breaker when actions
    /// start at the same position.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Validate the rules and build the matching structures.
    ///
    /// # Errors
    ///
    /// Returns [`RuleParseError`] for duplicate ids or invalid inputs.
    pub fn build(self) -> Result<RulesCollection, RuleParseError> {
        crate::compile::compile(self.config, self.rules)
    }
}

/// A compiled, immutable set of rewrite rules.
///
/// Shared by reference (or behind an `Arc`) across request threads.
#[derive(Debug, Clone)]
pub struct RulesCollection {
    pub(crate) config: RulesConfig,
    pub(crate) rules: Vec<Rule>,
    pub(crate) trie: LiteralTrie,
    pub(crate) literals: LiteralRegister,
    pub(crate) network: BooleanNetwork,
}

impl RulesCollection {
    /// Compile rules text with the default configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use qrewrite::RulesCollection;
    ///
    /// let collection = RulesCollection::from_rules_text(
    ///     "notebook =>\n  SYNONYM: laptop\n  @_id: \"nb\"",
    /// )
    /// .unwrap();
    /// assert_eq!(collection.len(), 1);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Parse`] with the offending line.
    pub fn from_rules_text(text: &str) -> Result<Self, RewriteError> {
        Self::from_rules_text_with_config(text, RulesConfig::default())
    }

    /// # Errors
    ///
    /// Returns [`RewriteError::Parse`] with the offending line.
    pub fn from_rules_text_with_config(text: &str, config: RulesConfig) -> Result<Self, RewriteError> {
        let rules = crate::compile::rules_from_text(text, &config)?;
        Ok(crate::compile::compile(config, rules)?)
    }

    /// Read and compile a rules file.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Io`] if the file cannot be read, or
    /// [`RewriteError::Parse`] if its content is invalid.
    pub fn from_file(path: impl AsRef<Path>, config: RulesConfig) -> Result<Self, RewriteError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_rules_text_with_config(&text, config)
    }

    /// Find every rule matching `sequence`, ordered by start position and
    /// then by rule order. A boolean rule is reported at most once.
    pub fn rewrite_actions(&self, sequence: &TermPositionSequence) -> Vec<Action<'_>> {
        crate::evaluate::rewrite_actions(self, sequence, &mut HashSet::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The interned literals of all boolean inputs.
    #[must_use]
    pub fn literals(&self) -> &LiteralRegister {
        &self.literals
    }

    #[must_use]
    pub fn config(&self) -> &RulesConfig {
        &self.config
    }
}

impl fmt::Display for RulesCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RulesCollection ({} rules):", self.rules.len())?;
        for rule in &self.rules {
            let input = match &rule.input {
                crate::types::RuleInput::Simple(elements) => elements
                    .iter()
                    .map(|e| {
                        let star = if e.is_prefix { "*" } else { "" };
                        format!("{}{star}", e.value)
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
                crate::types::RuleInput::Boolean { expr, .. } => expr.to_string(),
            };
            let types: Vec<&str> = rule
                .instructions
                .instructions
                .iter()
                .map(|i| i.instruction_type().name())
                .collect();
            writeln!(
                f,
                "  [{}] {} => {}",
                rule.instructions.id_text(),
                input,
                types.join(", ")
            )?;
        }
        Ok(())
    }
}
