//! Set-literal text form of value ranges in flat constraint files.
//!
//! Ranges are written the way a Python set prints, e.g.
//! `{'A', "O'B", 1, 2.5, True, nan}`, and `set()` when empty. The reader is
//! more lenient than the writer: it also accepts `[...]` and `(...)`
//! brackets, double or single quotes with an optional `u` prefix, and
//! `NaN`/`None`/`null` for missing values.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{FrameCheckError, Result};
use crate::input::{format_float, Value};

/// Render values as a set literal.
pub fn render_set(values: &[Value]) -> String {
    if values.is_empty() {
        return "set()".to_string();
    }
    let items: Vec<String> = values.iter().map(render_item).collect();
    format!("{{{}}}", items.join(", "))
}

fn render_item(value: &Value) -> String {
    match value {
        Value::Null => "nan".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Text(s) => quote(s),
        Value::DateTime(_) => quote(&value.render()),
    }
}

/// Quote a string: single quotes unless the text contains one and no
/// double quote.
fn quote(text: &str) -> String {
    let delim = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(delim);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}

/// Parse a set (or list/tuple) literal back into values.
pub fn parse_set(text: &str) -> Result<Vec<Value>> {
    let trimmed = text.trim();
    if trimmed == "set()" || trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let mut chars = trimmed.chars().peekable();
    let close = match chars.next() {
        Some('{') => '}',
        Some('[') => ']',
        Some('(') => ')',
        _ => return Err(literal_error(text, "expected '{', '[' or '('")),
    };

    let mut values = Vec::new();
    loop {
        skip_whitespace(&mut chars);
        match chars.peek() {
            Some(&c) if c == close => {
                chars.next();
                break;
            }
            None => return Err(literal_error(text, "unterminated literal")),
            _ => {}
        }

        values.push(parse_item(&mut chars).map_err(|msg| literal_error(text, &msg))?);

        skip_whitespace(&mut chars);
        match chars.next() {
            Some(',') => continue,
            Some(c) if c == close => break,
            Some(c) => return Err(literal_error(text, &format!("unexpected '{}'", c))),
            None => return Err(literal_error(text, "unterminated literal")),
        }
    }

    skip_whitespace(&mut chars);
    if chars.next().is_some() {
        return Err(literal_error(text, "trailing characters after literal"));
    }

    Ok(values)
}

fn literal_error(text: &str, message: &str) -> FrameCheckError {
    FrameCheckError::Literal(format!("{} in {:?}", message, text))
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn parse_item(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<Value, String> {
    match chars.peek() {
        Some('\'') | Some('"') => parse_quoted(chars).map(Value::Text),
        Some('u') | Some('U') => {
            let mut lookahead = chars.clone();
            lookahead.next();
            if matches!(lookahead.peek(), Some('\'') | Some('"')) {
                chars.next();
                parse_quoted(chars).map(Value::Text)
            } else {
                parse_bare(chars)
            }
        }
        _ => parse_bare(chars),
    }
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<String, String> {
    let delim = chars.next().ok_or("expected quote")?;
    let mut out = String::new();

    loop {
        match chars.next() {
            None => return Err("unterminated string".to_string()),
            Some(c) if c == delim => return Ok(out),
            Some('\\') => {
                let escaped = chars.next().ok_or("dangling escape")?;
                match escaped {
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    '0' => out.push('\0'),
                    'x' => out.push(parse_hex(chars, 2)?),
                    'u' => out.push(parse_hex(chars, 4)?),
                    'U' => out.push(parse_hex(chars, 8)?),
                    '\\' | '\'' | '"' => out.push(escaped),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            Some(c) => out.push(c),
        }
    }
}

fn parse_hex(chars: &mut Peekable<Chars<'_>>, digits: usize) -> std::result::Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.chars().count() != digits {
        return Err("truncated escape".to_string());
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid escape '{}'", hex))
}

fn parse_bare(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<Value, String> {
    let mut token = String::new();
    while let Some(&c) = chars.peek() {
        if c == ',' || c == '}' || c == ']' || c == ')' || c.is_whitespace() {
            break;
        }
        token.push(c);
        chars.next();
    }

    match token.as_str() {
        "" => Err("expected a value".to_string()),
        "True" | "true" => Ok(Value::Bool(true)),
        "False" | "false" => Ok(Value::Bool(false)),
        "nan" | "NaN" | "NAN" | "None" | "null" => Ok(Value::Null),
        _ => {
            if let Ok(i) = token.parse::<i64>() {
                return Ok(Value::Int(i));
            }
            token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("unrecognized token '{}'", token))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_set() {
        let values = vec![
            Value::from("A"),
            Value::from("O'B"),
            Value::Int(1),
            Value::Float(2.5),
            Value::Bool(true),
            Value::Null,
        ];
        assert_eq!(render_set(&values), r#"{'A', "O'B", 1, 2.5, True, nan}"#);
        assert_eq!(render_set(&[]), "set()");
    }

    #[test]
    fn test_parse_set() {
        let parsed = parse_set(r#"{'A', "O'B", 1, 2.5, True, nan}"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Value::from("A"),
                Value::from("O'B"),
                Value::Int(1),
                Value::Float(2.5),
                Value::Bool(true),
                Value::Null,
            ]
        );
    }

    #[test]
    fn test_parse_lenient_forms() {
        assert_eq!(parse_set("set()").unwrap(), vec![]);
        assert_eq!(parse_set("{}").unwrap(), vec![]);
        assert_eq!(
            parse_set("[u'caf\\xe9', NaN, None,]").unwrap(),
            vec![Value::from("café"), Value::Null, Value::Null]
        );
        assert_eq!(
            parse_set("('a\\u00f1o',)").unwrap(),
            vec![Value::from("año")]
        );
    }

    #[test]
    fn test_escapes_survive() {
        let values = vec![Value::from("both ' and \""), Value::from("back\\slash\ttab")];
        assert_eq!(parse_set(&render_set(&values)).unwrap(), values);
    }

    #[test]
    fn test_malformed_literals() {
        assert!(matches!(parse_set("'A', 'B'"), Err(FrameCheckError::Literal(_))));
        assert!(parse_set("{'A', 'B'").is_err());
        assert!(parse_set("{'A' 'B'}").is_err());
        assert!(parse_set("{abc}").is_err());
        assert!(parse_set("{'A'} extra").is_err());
    }
}
