use std::collections::BTreeSet;

use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, repeat};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::Stream;
use winnow::token::take_while;

use crate::config::RulesConfig;
use crate::types::{BooleanExpr, InputElement, RuleErrorKind, RuleInput};

const OPERATORS: [&str; 3] = ["AND", "OR", "NOT"];

fn is_operator(word: &str) -> bool {
    OPERATORS.contains(&word)
}

// -- Literals ---------------------------------------------------------------

/// Parse one literal: `value`, `field:value`, `{f1,f2}:value`, each with an
/// optional trailing `*`. `\*` and `\:` are literal characters. The value is
/// normalized; field names are kept as written.
pub(crate) fn parse_literal(
    text: &str,
    config: &RulesConfig,
) -> Result<InputElement, RuleErrorKind> {
    let raw = text.trim();
    let (fields, value_part) = split_fields(raw)?;

    let mut value = String::with_capacity(value_part.len());
    let mut wildcards = 0;
    let mut wildcard_at_end = false;
    let mut chars = value_part.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    value.push(escaped);
                }
            }
            '*' => {
                wildcards += 1;
                wildcard_at_end = chars.peek().is_none();
            }
            c => value.push(c),
        }
    }

    if wildcards > 1 {
        return Err(RuleErrorKind::RepeatedWildcard {
            literal: raw.to_owned(),
        });
    }
    if wildcards == 1 && !wildcard_at_end {
        return Err(RuleErrorKind::MisplacedWildcard {
            literal: raw.to_owned(),
        });
    }

    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if value.is_empty() {
        return Err(RuleErrorKind::BlankLiteral);
    }

    Ok(InputElement {
        value: config.normalize(&value).into_owned(),
        fields,
        is_prefix: wildcards == 1,
    })
}

fn split_fields(raw: &str) -> Result<(BTreeSet<String>, &str), RuleErrorKind> {
    if let Some(block) = raw.strip_prefix('{') {
        let unclosed = || RuleErrorKind::UnclosedFieldBlock {
            literal: raw.to_owned(),
        };
        let (names, rest) = block.split_once('}').ok_or_else(unclosed)?;
        let value = rest.strip_prefix(':').ok_or_else(unclosed)?;
        let fields = names
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_owned)
            .collect();
        return Ok((fields, value));
    }

    match find_unescaped(raw, ':') {
        Some(idx) if idx > 0 => {
            let field = raw[..idx].trim();
            let fields = std::iter::once(field.to_owned()).collect();
            Ok((fields, &raw[idx + 1..]))
        }
        _ => Ok((BTreeSet::new(), raw)),
    }
}

fn find_unescaped(s: &str, needle: char) -> Option<usize> {
    let mut escaped = false;
    for (idx, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == needle {
            return Some(idx);
        }
    }
    None
}

/// Split on whitespace outside `{...}` field blocks.
pub(crate) fn split_terms(text: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut start = None;
    let mut depth = 0usize;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '{' {
            depth += 1;
        } else if c == '}' {
            depth = depth.saturating_sub(1);
        } else if c.is_whitespace() && depth == 0 {
            if let Some(s) = start.take() {
                terms.push(&text[s..idx]);
            }
            continue;
        }
        if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(s) = start {
        terms.push(&text[s..]);
    }
    terms
}

// -- Boolean grammar (precedence: OR < AND < NOT < primary) -----------------

#[derive(Debug, Clone, PartialEq)]
enum RawExpr {
    Literal(String),
    And(Vec<RawExpr>),
    Or(Vec<RawExpr>),
    Not(Box<RawExpr>),
}

fn ws(input: &mut &str) -> ModalResult<()> {
    multispace0.void().parse_next(input)
}

fn word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '(' && c != ')').parse_next(input)
}

fn keyword<'i>(kw: &'static str) -> impl Parser<&'i str, &'i str, ErrMode<ContextError>> {
    word.verify(move |w: &str| w == kw)
}

/// One or more consecutive non-operator words, joined by single spaces.
fn literal_words(input: &mut &str) -> ModalResult<String> {
    let mut words = Vec::new();
    loop {
        let checkpoint = input.checkpoint();
        ws.parse_next(input)?;
        match word.parse_next(input) {
            Ok(w) if !is_operator(w) => words.push(w),
            _ => {
                input.reset(&checkpoint);
                break;
            }
        }
    }
    if words.is_empty() {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    Ok(words.join(" "))
}

fn primary(input: &mut &str) -> ModalResult<RawExpr> {
    ws.parse_next(input)?;
    alt((
        delimited('(', or_expr, (ws, cut_err(')'))),
        literal_words.map(RawExpr::Literal),
    ))
    .context(StrContext::Expected(StrContextValue::Description("literal")))
    .parse_next(input)
}

fn unary(input: &mut &str) -> ModalResult<RawExpr> {
    ws.parse_next(input)?;
    if opt(keyword("NOT")).parse_next(input)?.is_some() {
        let inner = cut_err(unary).parse_next(input)?;
        Ok(RawExpr::Not(Box::new(inner)))
    } else {
        primary(input)
    }
}

fn and_expr(input: &mut &str) -> ModalResult<RawExpr> {
    let first = unary(input)?;
    let rest: Vec<RawExpr> =
        repeat(0.., preceded((ws, keyword("AND")), cut_err(unary))).parse_next(input)?;
    Ok(combine(first, rest, RawExpr::And))
}

fn or_expr(input: &mut &str) -> ModalResult<RawExpr> {
    let first = and_expr(input)?;
    let rest: Vec<RawExpr> =
        repeat(0.., preceded((ws, keyword("OR")), cut_err(and_expr))).parse_next(input)?;
    Ok(combine(first, rest, RawExpr::Or))
}

fn combine(first: RawExpr, rest: Vec<RawExpr>, op: fn(Vec<RawExpr>) -> RawExpr) -> RawExpr {
    if rest.is_empty() {
        first
    } else {
        let mut children = Vec::with_capacity(rest.len() + 1);
        children.push(first);
        children.extend(rest);
        op(children)
    }
}

fn resolve(raw: RawExpr, config: &RulesConfig) -> Result<BooleanExpr, RuleErrorKind> {
    Ok(match raw {
        RawExpr::Literal(text) => BooleanExpr::Literal(parse_literal(&text, config)?),
        RawExpr::And(children) => BooleanExpr::And(
            children
                .into_iter()
                .map(|c| resolve(c, config))
                .collect::<Result<_, _>>()?,
        ),
        RawExpr::Or(children) => BooleanExpr::Or(
            children
                .into_iter()
                .map(|c| resolve(c, config))
                .collect::<Result<_, _>>()?,
        ),
        RawExpr::Not(inner) => BooleanExpr::Not(Box::new(resolve(*inner, config)?)),
    })
}

fn parse_boolean(text: &str, config: &RulesConfig) -> Result<BooleanExpr, RuleErrorKind> {
    let raw = delimited(ws, or_expr, ws)
        .parse(text)
        .map_err(|e| RuleErrorKind::BooleanSyntax {
            input: text.to_owned(),
            message: format!("unexpected input at offset {}", e.offset()),
        })?;
    let expr = resolve(raw, config)?;
    if !expr.has_positive_literal() {
        return Err(RuleErrorKind::NoPositiveLiteral);
    }
    Ok(expr)
}

fn has_operator(text: &str) -> bool {
    text.contains(['(', ')'])
        || text
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .any(is_operator)
}

// -- Input ------------------------------------------------------------------

/// Compile a rule's input text.
///
/// Text containing `AND`, `OR`, `NOT` or parentheses becomes a boolean input
/// when the configuration allows it; anything else is a simple input of whitespace
/// separated literals.
pub(crate) fn compile_input(text: &str, config: &RulesConfig) -> Result<RuleInput, RuleErrorKind> {
    let text = text.trim();
    if text.is_empty() {
        return Err(RuleErrorKind::EmptyInput);
    }

    if config.allows_boolean_input() && has_operator(text) {
        let expr = parse_boolean(text, config)?;
        return Ok(RuleInput::Boolean {
            expr,
            source: text.to_owned(),
        });
    }

    let elements = split_terms(text)
        .into_iter()
        .map(|token| parse_literal(token, config))
        .collect::<Result<Vec<_>, _>>()?;
    let last = elements.len() - 1;
    if elements[..last].iter().any(|e| e.is_prefix) {
        return Err(RuleErrorKind::PrefixNotLast);
    }
    Ok(RuleInput::Simple(elements))
}
