//! Permissive structured values for rule properties.
//!
//! Accepts JSON plus bare object keys, single-quoted strings, and trailing
//! commas in objects and arrays.

use serde_json::{Map, Number, Value};
use winnow::ascii::multispace0;
use winnow::combinator::{alt, cut_err, delimited, opt};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

fn ws(input: &mut &str) -> ModalResult<()> {
    multispace0.void().parse_next(input)
}

fn cut<T>() -> ModalResult<T> {
    Err(ErrMode::Cut(ContextError::new()))
}

fn quoted(input: &mut &str) -> ModalResult<String> {
    let quote = alt(('"', '\'')).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = cut_err(any).parse_next(input)?;
        match ch {
            c if c == quote => return Ok(s),
            '\\' => {
                let esc = cut_err(any).parse_next(input)?;
                match esc {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    'u' => {
                        let hex = cut_err(take_while(4, |c: char| c.is_ascii_hexdigit()))
                            .parse_next(input)?;
                        let decoded = u32::from_str_radix(hex, 16)
                            .ok()
                            .and_then(char::from_u32);
                        match decoded {
                            Some(c) => s.push(c),
                            None => return cut(),
                        }
                    }
                    other => s.push(other),
                }
            }
            c => s.push(c),
        }
    }
}

fn number(input: &mut &str) -> ModalResult<Value> {
    let text = take_while(1.., |c: char| {
        c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')
    })
    .parse_next(input)?;
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::from(i));
    }
    match text.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Ok(Value::Number(n)),
        None => cut(),
    }
}

fn key(input: &mut &str) -> ModalResult<String> {
    alt((
        quoted,
        take_while(1.., |c: char| {
            c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '$')
        })
        .map(str::to_owned),
    ))
    .context(StrContext::Expected(StrContextValue::Description("key")))
    .parse_next(input)
}

fn object(input: &mut &str) -> ModalResult<Map<String, Value>> {
    '{'.parse_next(input)?;
    let mut map = Map::new();
    loop {
        ws.parse_next(input)?;
        if opt('}').parse_next(input)?.is_some() {
            return Ok(map);
        }
        let k = cut_err(key).parse_next(input)?;
        ws.parse_next(input)?;
        cut_err(':').parse_next(input)?;
        let v = cut_err(value).parse_next(input)?;
        map.insert(k, v);
        ws.parse_next(input)?;
        if cut_err(alt((',', '}'))).parse_next(input)? == '}' {
            return Ok(map);
        }
    }
}

fn array(input: &mut &str) -> ModalResult<Vec<Value>> {
    '['.parse_next(input)?;
    let mut items = Vec::new();
    loop {
        ws.parse_next(input)?;
        if opt(']').parse_next(input)?.is_some() {
            return Ok(items);
        }
        items.push(cut_err(value).parse_next(input)?);
        ws.parse_next(input)?;
        if cut_err(alt((',', ']'))).parse_next(input)? == ']' {
            return Ok(items);
        }
    }
}

fn value(input: &mut &str) -> ModalResult<Value> {
    ws.parse_next(input)?;
    alt((
        object.map(Value::Object),
        array.map(Value::Array),
        quoted.map(Value::String),
        "true".value(Value::Bool(true)),
        "false".value(Value::Bool(false)),
        "null".value(Value::Null),
        number,
    ))
    .context(StrContext::Expected(StrContextValue::Description("value")))
    .parse_next(input)
}

/// Parse a complete structured value.
pub(crate) fn parse_value(text: &str) -> Result<Value, String> {
    delimited(ws, value, ws)
        .parse(text)
        .map_err(|e| format!("unexpected input at offset {}", e.offset()))
}

/// Parse a complete structured value that must be an object.
pub(crate) fn parse_object(text: &str) -> Result<Map<String, Value>, String> {
    match parse_value(text)? {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected an object, found {other}")),
    }
}
