//! Parameter reader.
//!
//! # Responsibilities
//! - Look a key up in the query string or the form body
//! - Apply the default/required policy
//! - Coerce the raw text to the requested type
//!
//! # Design Decisions
//! - Integers and floats parse their leading numeric prefix; anything
//!   unparsable becomes zero, overflow saturates
//! - `Array` is escaped like `Text`: no structured value is produced
//! - A supplied default is returned untouched, without coercion

use crate::http::request::Params;
use crate::ocs::error::OcsReject;

/// Where a parameter is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    Query,
    Body,
}

impl ParamSource {
    /// Query string for GET/HEAD, form body for everything else.
    pub fn for_method(method: &str) -> Self {
        if method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD") {
            ParamSource::Query
        } else {
            ParamSource::Body
        }
    }
}

/// Requested coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Pass-through. Never forward into markup.
    Raw,
    Text,
    Int,
    Float,
    Array,
}

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl ParamValue {
    /// Text form; numbers print in plain decimal.
    pub fn into_text(self) -> String {
        match self {
            ParamValue::Text(s) => s,
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Float(f) => f.to_string(),
        }
    }

    /// Integer form; text is parsed like an `Int` parameter.
    pub fn as_int(&self) -> i64 {
        match self {
            ParamValue::Text(s) => parse_int(s),
            ParamValue::Int(i) => *i,
            ParamValue::Float(f) => *f as i64,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

/// Reads parameters of one request.
#[derive(Debug, Clone, Copy)]
pub struct ParameterReader<'a> {
    query: &'a Params,
    body: &'a Params,
}

impl<'a> ParameterReader<'a> {
    pub fn new(query: &'a Params, body: &'a Params) -> Self {
        Self { query, body }
    }

    /// Read `key` from `source`.
    ///
    /// Returns `default` when the key is absent, or
    /// [`OcsReject::MissingParameter`] when no default was given.
    pub fn read(
        &self,
        source: ParamSource,
        key: &str,
        kind: ParamType,
        default: Option<ParamValue>,
    ) -> Result<ParamValue, OcsReject> {
        let params = match source {
            ParamSource::Query => self.query,
            ParamSource::Body => self.body,
        };

        match params.get(key) {
            Some(raw) => Ok(coerce(raw, kind)),
            None => default.ok_or_else(|| OcsReject::missing(key)),
        }
    }

    /// Shorthand for a text value.
    pub fn text(
        &self,
        source: ParamSource,
        key: &str,
        default: Option<&str>,
    ) -> Result<String, OcsReject> {
        self.read(source, key, ParamType::Text, default.map(ParamValue::from))
            .map(ParamValue::into_text)
    }

    /// Shorthand for an integer value.
    pub fn int(
        &self,
        source: ParamSource,
        key: &str,
        default: Option<i64>,
    ) -> Result<i64, OcsReject> {
        self.read(source, key, ParamType::Int, default.map(ParamValue::from))
            .map(|v| v.as_int())
    }
}

fn coerce(raw: &str, kind: ParamType) -> ParamValue {
    match kind {
        ParamType::Raw => ParamValue::Text(raw.to_string()),
        ParamType::Int => ParamValue::Int(parse_int(raw)),
        ParamType::Float => ParamValue::Float(parse_float(raw)),
        ParamType::Text | ParamType::Array => ParamValue::Text(html_escape(raw)),
    }
}

/// Leading whitespace, optional sign, then digits. `"12abc"` is 12,
/// `"abc"` is 0.
pub fn parse_int(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

/// Longest leading prefix that parses as a float; 0.0 when there is none.
pub fn parse_float(raw: &str) -> f64 {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(0.0)
}

/// Escape the five HTML special characters.
pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Remove `<...>` tags. An unterminated tag swallows the rest of the input.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for ch in input.chars() {
        match (in_tag, ch) {
            (false, '<') => in_tag = true,
            (true, '>') => in_tag = false,
            (false, c) => out.push(c),
            (true, _) => {}
        }
    }
    out
}

/// Backslash-escape quotes, backslashes and NUL.
pub fn addslashes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}
