use crate::config::RulesConfig;
use crate::types::{
    BoostDirection, InputElement, Instruction, InstructionQuery, InstructionType, RuleErrorKind,
    RuleInput,
};

use super::error::RuleParseError;
use super::input::{parse_literal, split_terms};
use super::skeleton::InstructionSkeleton;

const RAW_QUERY_MARKER: &str = "* ";
const DEFAULT_WEIGHT: f32 = 1.0;

/// Compile the instruction lines of one rule against its compiled input.
///
/// # Errors
///
/// Returns the first failing instruction's error, positioned at its line.
pub(crate) fn compile_instructions(
    input: &RuleInput,
    skeletons: &[InstructionSkeleton],
    config: &RulesConfig,
) -> Result<Vec<Instruction>, RuleParseError> {
    skeletons
        .iter()
        .map(|sk| compile_instruction(input, sk, config).map_err(|k| RuleParseError::at(sk.line, k)))
        .collect()
}

fn compile_instruction(
    input: &RuleInput,
    sk: &InstructionSkeleton,
    config: &RulesConfig,
) -> Result<Instruction, RuleErrorKind> {
    let ty = sk.instruction;
    if input.is_boolean() && matches!(ty, InstructionType::Synonym | InstructionType::Delete) {
        return Err(RuleErrorKind::NotAllowedForBooleanInput { instruction: ty });
    }

    match ty {
        InstructionType::Synonym => {
            let weight = weight(ty, sk.param.as_deref())?;
            let terms = literals(required_value(sk)?, config)?;
            Ok(Instruction::Synonym { terms, weight })
        }
        InstructionType::Up | InstructionType::Down => {
            let direction = if ty == InstructionType::Up {
                BoostDirection::Up
            } else {
                BoostDirection::Down
            };
            let weight = weight(ty, sk.param.as_deref())?;
            let query = instruction_query(ty, required_value(sk)?, config)?;
            Ok(Instruction::Boost {
                query,
                direction,
                weight,
            })
        }
        InstructionType::Filter => {
            no_param(sk)?;
            let query = instruction_query(ty, required_value(sk)?, config)?;
            Ok(Instruction::Filter { query })
        }
        InstructionType::Delete => {
            no_param(sk)?;
            let terms = match sk.value.as_deref() {
                None => None,
                Some(value) => Some(delete_terms(input, value, config)?),
            };
            Ok(Instruction::Delete { terms })
        }
        InstructionType::Decorate => Ok(Instruction::Decorate {
            value: required_value(sk)?.to_owned(),
            key: sk.param.clone(),
        }),
        InstructionType::Replace => Ok(Instruction::Replace {
            value: sk.value.clone(),
        }),
    }
}

fn required_value(sk: &InstructionSkeleton) -> Result<&str, RuleErrorKind> {
    sk.value.as_deref().ok_or(RuleErrorKind::MissingValue {
        instruction: sk.instruction,
    })
}

fn no_param(sk: &InstructionSkeleton) -> Result<(), RuleErrorKind> {
    match sk.param {
        Some(_) => Err(RuleErrorKind::ParamNotAllowed {
            instruction: sk.instruction,
        }),
        None => Ok(()),
    }
}

fn weight(instruction: InstructionType, param: Option<&str>) -> Result<f32, RuleErrorKind> {
    let Some(param) = param else {
        return Ok(DEFAULT_WEIGHT);
    };
    match param.trim().parse::<f32>() {
        Ok(w) if w.is_finite() && w >= 0.0 => Ok(w),
        _ => Err(RuleErrorKind::InvalidParam {
            instruction,
            param: param.to_owned(),
        }),
    }
}

fn literals(value: &str, config: &RulesConfig) -> Result<Vec<InputElement>, RuleErrorKind> {
    split_terms(value)
        .into_iter()
        .map(|token| parse_literal(token, config))
        .collect()
}

fn delete_terms(
    input: &RuleInput,
    value: &str,
    config: &RulesConfig,
) -> Result<Vec<InputElement>, RuleErrorKind> {
    let elements = input.elements();
    literals(value, config)?
        .into_iter()
        .map(|term| {
            // the input element carries the prefix flag
            elements
                .iter()
                .find(|el| el.same_term(&term))
                .map(|el| (*el).clone())
                .ok_or_else(|| RuleErrorKind::DeleteTermNotInInput {
                    term: term.to_string(),
                })
        })
        .collect()
}

fn instruction_query(
    instruction: InstructionType,
    value: &str,
    config: &RulesConfig,
) -> Result<InstructionQuery, RuleErrorKind> {
    if let Some(raw) = value.strip_prefix(RAW_QUERY_MARKER) {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RuleErrorKind::MissingValue { instruction });
        }
        return Ok(InstructionQuery::Raw(raw.to_owned()));
    }
    config
        .query_parser
        .parse(value)
        .map_err(|e| RuleErrorKind::InvalidQuery {
            instruction,
            query: value.to_owned(),
            message: e.to_string(),
        })?;
    Ok(InstructionQuery::Parsed(value.to_owned()))
}
