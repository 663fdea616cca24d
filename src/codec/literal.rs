//! Scalar literals of the snapshot format
//!
//! A scalar is read from its leading token: `None`/`True`/`False`, a
//! double-quoted string, a `/`-prefixed resource path (itself quoted when
//! it has edge whitespace or control characters), a `(x, y)` pair,
//! digits (integer), digits with a single decimal point (float), and
//! anything else verbatim as a string. Strings that would read back as
//! something else are written quoted.

use crate::value::{ResourcePath, Value};

pub const NULL: &str = "None";
pub const TRUE: &str = "True";
pub const FALSE: &str = "False";
pub const PATH_MARKER: char = '/';

const INFINITY: &str = "inf";
const NEG_INFINITY: &str = "-inf";
const NAN: &str = "NaN";

/// Errors reading a single literal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("unterminated string")]
    UnterminatedString,

    #[error("invalid escape `\\{0}`")]
    InvalidEscape(char),

    #[error("unexpected characters after string: `{0}`")]
    TrailingCharacters(String),

    #[error("invalid pair `{0}`")]
    InvalidPair(String),

    #[error("integer `{0}` out of range")]
    IntegerOverflow(String),

    #[error("missing `:` in entry `{0}`")]
    MissingSeparator(String),
}

/// Textual form of a scalar value; `None` for containers and objects
#[must_use]
pub fn encode_scalar(value: &Value) -> Option<String> {
    Some(match value {
        Value::Null => NULL.to_string(),
        Value::Bool(true) => TRUE.to_string(),
        Value::Bool(false) => FALSE.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::Str(s) => encode_str(s),
        Value::Pair(x, y) => format!("({}, {})", format_float(*x), format_float(*y)),
        Value::Path(path) => format!("{PATH_MARKER}{}", encode_path(path.as_str())),
        Value::Seq(_) | Value::Map(_) | Value::Object(_) => return None,
    })
}

/// Float text that always reads back as the same float
#[must_use]
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return NAN.to_string();
    }
    if value.is_infinite() {
        let token = if value > 0.0 { INFINITY } else { NEG_INFINITY };
        return token.to_string();
    }
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// String scalar, quoted only when the bare form would read back differently
#[must_use]
pub fn encode_str(s: &str) -> String {
    if needs_quotes(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

/// Resource path text after the marker, quoted when trimming or line
/// splitting would change it
fn encode_path(path: &str) -> String {
    if path.trim() != path || path.starts_with('"') || path.chars().any(char::is_control) {
        quote(path)
    } else {
        path.to_string()
    }
}

/// Mapping key, quoted like a string and additionally when it contains `:`
#[must_use]
pub fn encode_key(key: &str) -> String {
    if key.contains(':') || needs_quotes(key) {
        quote(key)
    } else {
        key.to_string()
    }
}

fn needs_quotes(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return true;
    };
    s.trim() != s
        || s.chars().any(char::is_control)
        || matches!(first, '{' | '}' | '[' | ']' | '"')
        || decode_scalar(s) != Ok(Value::Str(s.to_string()))
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Read a quoted string at the start of `text`
///
/// Returns the unescaped string and the byte offset just past the closing quote.
fn unquote(text: &str) -> Result<(String, usize), LiteralError> {
    let mut out = String::new();
    let mut chars = text.char_indices().skip(1);
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Ok((out, index + 1)),
            '\\' => {
                let (_, escaped) = chars.next().ok_or(LiteralError::UnterminatedString)?;
                out.push(match escaped {
                    '\\' => '\\',
                    '"' => '"',
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    other => return Err(LiteralError::InvalidEscape(other)),
                });
            }
            c => out.push(c),
        }
    }
    Err(LiteralError::UnterminatedString)
}

/// Read a scalar literal
///
/// # Errors
///
/// Fails on broken quoted strings, malformed pairs and integers that do
/// not fit in 64 bits
pub fn decode_scalar(text: &str) -> Result<Value, LiteralError> {
    match text {
        NULL => return Ok(Value::Null),
        TRUE => return Ok(Value::Bool(true)),
        FALSE => return Ok(Value::Bool(false)),
        INFINITY => return Ok(Value::Float(f64::INFINITY)),
        NEG_INFINITY => return Ok(Value::Float(f64::NEG_INFINITY)),
        NAN => return Ok(Value::Float(f64::NAN)),
        _ => {}
    }

    if text.starts_with('"') {
        return unquote_whole(text).map(Value::Str);
    }
    if let Some(path) = text.strip_prefix(PATH_MARKER) {
        if path.starts_with('"') {
            return unquote_whole(path).map(|p| Value::Path(ResourcePath::new(p)));
        }
        return Ok(Value::Path(ResourcePath::new(path)));
    }
    if text.starts_with('(') {
        return decode_pair(text);
    }
    if is_integer(text) {
        return text
            .parse()
            .map(Value::Int)
            .map_err(|_| LiteralError::IntegerOverflow(text.to_string()));
    }
    if is_float(text)
        && let Ok(f) = text.parse()
    {
        return Ok(Value::Float(f));
    }
    Ok(Value::Str(text.to_string()))
}

/// A quoted string that must span all of `text`
fn unquote_whole(text: &str) -> Result<String, LiteralError> {
    let (s, end) = unquote(text)?;
    if end != text.len() {
        return Err(LiteralError::TrailingCharacters(text[end..].to_string()));
    }
    Ok(s)
}

fn decode_pair(text: &str) -> Result<Value, LiteralError> {
    let invalid = || LiteralError::InvalidPair(text.to_string());
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(invalid)?;
    let (x, y) = inner.split_once(',').ok_or_else(invalid)?;
    let x: f64 = x.trim().parse().map_err(|_| invalid())?;
    let y: f64 = y.trim().parse().map_err(|_| invalid())?;
    Ok(Value::Pair(x, y))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_integer(text: &str) -> bool {
    is_digits(text.strip_prefix('-').unwrap_or(text))
}

fn is_float(text: &str) -> bool {
    text.strip_prefix('-')
        .unwrap_or(text)
        .split_once('.')
        .is_some_and(|(whole, frac)| is_digits(whole) && is_digits(frac))
}

/// Split a `key:value` entry line
///
/// Returns the key exactly as written (used as the closing tag of nested
/// blocks), the decoded key, and the value text.
///
/// # Errors
///
/// Fails if the key is a broken quoted string or no `:` follows it
pub fn split_entry(line: &str) -> Result<(&str, String, &str), LiteralError> {
    let missing = || LiteralError::MissingSeparator(line.to_string());
    if line.starts_with('"') {
        let (key, end) = unquote(line)?;
        let rest = line[end..].strip_prefix(':').ok_or_else(missing)?;
        Ok((&line[..end], key, rest.trim_start()))
    } else {
        let (key, rest) = line.split_once(':').ok_or_else(missing)?;
        Ok((key, key.to_string(), rest.trim_start()))
    }
}
