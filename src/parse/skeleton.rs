use serde_json::{Map, Value};
use winnow::ascii::space0;
use winnow::combinator::{delimited, eof, opt, preceded};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{rest, take_till, take_while};

use crate::config::RulesConfig;
use crate::types::{InstructionType, RuleErrorKind};

use super::error::RuleParseError;
use super::properties;

const INPUT_MARKER: &str = "=>";
const BLOCK_OPEN: &str = "@{";
const BLOCK_CLOSE: &str = "}@";
const ESCAPED_BLOCK_CLOSE: &str = "\\}@";

/// One rule as written, before its input and instructions are compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSkeleton {
    pub input: String,
    /// 1-based line of the input line.
    pub line: usize,
    pub instructions: Vec<InstructionSkeleton>,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSkeleton {
    pub instruction: InstructionType,
    pub param: Option<String>,
    pub value: Option<String>,
    pub line: usize,
}

// -- Instruction lines ------------------------------------------------------

type RawInstruction<'i> = (&'i str, Option<&'i str>, Option<&'i str>);

fn instruction_line<'i>(input: &mut &'i str) -> ModalResult<RawInstruction<'i>> {
    let name = take_while(1.., |c: char| c.is_ascii_alphabetic()).parse_next(input)?;
    let param = opt(delimited((space0, '('), take_till(0.., ')'), ')')).parse_next(input)?;
    space0.parse_next(input)?;
    let value = opt(preceded(':', rest)).parse_next(input)?;
    eof.parse_next(input)?;
    Ok((name, param, value))
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn parse_instruction(
    line: &str,
    line_no: usize,
    config: &RulesConfig,
) -> Result<InstructionSkeleton, RuleParseError> {
    let malformed = || {
        RuleParseError::at(
            line_no,
            RuleErrorKind::MalformedLine {
                line: line.to_owned(),
            },
        )
    };
    let (name, param, value) = instruction_line.parse(line).map_err(|_| malformed())?;
    let instruction = InstructionType::from_name(name).ok_or_else(malformed)?;
    if !config.supported_types().supports(instruction) {
        return Err(RuleParseError::at(
            line_no,
            RuleErrorKind::UnsupportedInstruction {
                name: name.to_owned(),
            },
        ));
    }
    Ok(InstructionSkeleton {
        instruction,
        param: non_blank(param),
        value: non_blank(value),
        line: line_no,
    })
}

// -- Properties -------------------------------------------------------------

fn insert_property(
    properties: &mut Map<String, Value>,
    key: String,
    value: Value,
    line_no: usize,
) -> Result<(), RuleParseError> {
    if properties.contains_key(&key) {
        return Err(RuleParseError::at(
            line_no,
            RuleErrorKind::DuplicateProperty { key },
        ));
    }
    properties.insert(key, value);
    Ok(())
}

/// `@key: value`. A value that is not a structured value is kept as a string.
fn parse_single_property(line: &str, line_no: usize) -> Result<(String, Value), RuleParseError> {
    let invalid = |message: &str| {
        RuleParseError::at(
            line_no,
            RuleErrorKind::InvalidProperty {
                message: message.to_owned(),
            },
        )
    };
    let body = &line[1..];
    let (key, value) = body
        .split_once(':')
        .ok_or_else(|| invalid("expected '@key: value'"))?;
    let key = key.trim().trim_matches(|c: char| c == '"' || c == '\'');
    let value = value.trim();
    if key.is_empty() {
        return Err(invalid("property key is empty"));
    }
    if value.is_empty() {
        return Err(invalid("property value is empty"));
    }
    let parsed = properties::parse_value(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), parsed))
}

fn is_block_close(line: &str) -> bool {
    line.ends_with(BLOCK_CLOSE) && !line.ends_with(ESCAPED_BLOCK_CLOSE)
}

fn unescape_block_line(line: &str) -> String {
    match line.strip_suffix(ESCAPED_BLOCK_CLOSE) {
        Some(head) => format!("{head}{BLOCK_CLOSE}"),
        None => line.to_owned(),
    }
}

// -- Rules text -------------------------------------------------------------

/// An open `@{ ... }@` block: the line it started on and its content so far.
struct OpenBlock {
    line: usize,
    text: String,
}

/// Split rules text into rule skeletons.
///
/// # Errors
///
/// Returns [`RuleParseError`] positioned at the offending line.
pub fn parse_skeletons(
    text: &str,
    config: &RulesConfig,
) -> Result<Vec<RuleSkeleton>, RuleParseError> {
    let mut rules: Vec<RuleSkeleton> = Vec::new();
    let mut block: Option<OpenBlock> = None;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();

        if let Some(mut open) = block.take() {
            if is_block_close(line) {
                open.text.push_str(&line[..line.len() - BLOCK_CLOSE.len()]);
                open.text.push('\n');
                let rule = rules
                    .last_mut()
                    .ok_or_else(|| RuleParseError::at(open.line, RuleErrorKind::MissingInput))?;
                close_block(rule, &open)?;
            } else {
                open.text.push_str(&unescape_block_line(line));
                open.text.push('\n');
                block = Some(open);
            }
            continue;
        }

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(input) = line.strip_suffix(INPUT_MARKER) {
            let input = input.trim();
            if input.is_empty() {
                return Err(RuleParseError::at(line_no, RuleErrorKind::EmptyInput));
            }
            rules.push(RuleSkeleton {
                input: input.to_owned(),
                line: line_no,
                instructions: Vec::new(),
                properties: Map::new(),
            });
            continue;
        }

        let Some(rule) = rules.last_mut() else {
            return Err(RuleParseError::at(line_no, RuleErrorKind::MissingInput));
        };

        if let Some(after_open) = line.strip_prefix(BLOCK_OPEN) {
            if is_block_close(after_open) {
                let inner = &after_open[..after_open.len() - BLOCK_CLOSE.len()];
                let open = OpenBlock {
                    line: line_no,
                    text: format!("{inner}\n"),
                };
                close_block(rule, &open)?;
            } else {
                block = Some(OpenBlock {
                    line: line_no,
                    text: format!("{}\n", unescape_block_line(after_open)),
                });
            }
        } else if line.starts_with('@') {
            let (key, value) = parse_single_property(line, line_no)?;
            insert_property(&mut rule.properties, key, value, line_no)?;
        } else {
            let instruction = parse_instruction(line, line_no, config)?;
            rule.instructions.push(instruction);
        }
    }

    if let Some(open) = block {
        return Err(RuleParseError::at(
            open.line,
            RuleErrorKind::UnterminatedProperty,
        ));
    }
    Ok(rules)
}

fn close_block(rule: &mut RuleSkeleton, open: &OpenBlock) -> Result<(), RuleParseError> {
    let object = properties::parse_object(&format!("{{{}}}", open.text)).map_err(|message| {
        RuleParseError::at(open.line, RuleErrorKind::InvalidProperty { message })
    })?;
    for (key, value) in object {
        insert_property(&mut rule.properties, key, value, open.line)?;
    }
    Ok(())
}
