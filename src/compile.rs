use std::collections::HashSet;

use serde_json::Value;

use crate::collection::RulesCollection;
use crate::config::RulesConfig;
use crate::network::BooleanNetwork;
use crate::parse::input::compile_input;
use crate::parse::instruction::compile_instructions;
use crate::parse::{RuleParseError, parse_skeletons};
use crate::trie::{LiteralTrie, SEPARATOR};
use crate::types::{
    BooleanExpr, ID_PROPERTY, InputElement, Instruction, Instructions, LiteralRegister, Rule,
    RuleErrorKind, RuleInput, TrieTarget,
};

/// Compile rules text into rules, in declaration order.
pub(crate) fn rules_from_text(
    text: &str,
    config: &RulesConfig,
) -> Result<Vec<Rule>, RuleParseError> {
    let skeletons = parse_skeletons(text, config)?;
    let mut seen = HashSet::new();
    let mut rules = Vec::with_capacity(skeletons.len());

    for (order, skeleton) in skeletons.into_iter().enumerate() {
        let input = compile_input(&skeleton.input, config)
            .map_err(|kind| RuleParseError::at(skeleton.line, kind))?;
        let instructions = compile_instructions(&input, &skeleton.instructions, config)?;

        let mut properties = skeleton.properties;
        let id = properties
            .remove(ID_PROPERTY)
            .unwrap_or_else(|| Value::String(format!("{}#{order}", skeleton.input)));
        if !seen.insert(id.to_string()) {
            return Err(RuleParseError::at(
                skeleton.line,
                RuleErrorKind::DuplicateId {
                    id: id_text(&id),
                },
            ));
        }

        rules.push(Rule::new(
            input,
            Instructions::with_properties(order, id, instructions, properties),
        ));
    }
    Ok(rules)
}

/// Validate rules and build the matching structures.
pub(crate) fn compile(
    config: RulesConfig,
    mut rules: Vec<Rule>,
) -> Result<RulesCollection, RuleParseError> {
    check_ids(&rules)?;
    for rule in &mut rules {
        normalize_rule(rule, &config);
        check_input(&rule.input)?;
    }

    let mut trie = LiteralTrie::new();
    let mut literals = LiteralRegister::new();
    let mut network = BooleanNetwork::new();

    for (index, rule) in rules.iter().enumerate() {
        match &rule.input {
            RuleInput::Simple(elements) => {
                let key = join_values(elements);
                let is_prefix = elements.last().is_some_and(|e| e.is_prefix);
                trie.insert(&key, is_prefix, TrieTarget::Rule(index));
            }
            RuleInput::Boolean { expr, .. } => {
                let mut fresh = Vec::new();
                network.add_rule(index, expr, &mut literals, |id| fresh.push(id));
                for id in fresh {
                    let literal = literals.literal(id);
                    trie.insert(&literal.value, literal.is_prefix, TrieTarget::Literal(id));
                }
            }
        }
    }

    tracing::debug!(
        rules = rules.len(),
        literals = literals.len(),
        trie_nodes = trie.node_count(),
        network_nodes = network.node_count(),
        boolean_rules = network.rule_count(),
        "compiled rules collection"
    );

    Ok(RulesCollection {
        config,
        rules,
        trie,
        literals,
        network,
    })
}

fn id_text(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_ids(rules: &[Rule]) -> Result<(), RuleParseError> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule.instructions.id.to_string()) {
            return Err(RuleErrorKind::DuplicateId {
                id: rule.instructions.id_text(),
            }
            .into());
        }
    }
    Ok(())
}

fn check_input(input: &RuleInput) -> Result<(), RuleParseError> {
    match input {
        RuleInput::Simple(elements) => {
            if elements.is_empty() {
                return Err(RuleErrorKind::EmptyInput.into());
            }
            if elements.iter().any(|e| e.value.is_empty()) {
                return Err(RuleErrorKind::BlankLiteral.into());
            }
            if elements[..elements.len() - 1].iter().any(|e| e.is_prefix) {
                return Err(RuleErrorKind::PrefixNotLast.into());
            }
        }
        RuleInput::Boolean { expr, .. } => {
            if !expr.has_positive_literal() {
                return Err(RuleErrorKind::NoPositiveLiteral.into());
            }
        }
    }
    Ok(())
}

fn join_values(elements: &[InputElement]) -> String {
    let mut key = String::new();
    for element in elements {
        if !key.is_empty() {
            key.push(SEPARATOR);
        }
        key.push_str(&element.value);
    }
    key
}

fn normalize_element(element: &mut InputElement, config: &RulesConfig) {
    let normalized = config.normalize(&element.value).into_owned();
    element.value = normalized;
}

fn normalize_expr(expr: &mut BooleanExpr, config: &RulesConfig) {
    match expr {
        BooleanExpr::Literal(element) => normalize_element(element, config),
        BooleanExpr::And(children) | BooleanExpr::Or(children) => {
            for child in children {
                normalize_expr(child, config);
            }
        }
        BooleanExpr::Not(inner) => normalize_expr(inner, config),
    }
}

/// Rules built by hand may carry values in any case; bring them in line with
/// the normalizer that query terms will pass through.
fn normalize_rule(rule: &mut Rule, config: &RulesConfig) {
    match &mut rule.input {
        RuleInput::Simple(elements) => {
            for element in elements {
                normalize_element(element, config);
            }
        }
        RuleInput::Boolean { expr, .. } => normalize_expr(expr, config),
    }
    for instruction in &mut rule.instructions.instructions {
        match instruction {
            Instruction::Synonym { terms, .. }
            | Instruction::Delete {
                terms: Some(terms),
            } => {
                for term in terms {
                    normalize_element(term, config);
                }
            }
            _ => {}
        }
    }
}
