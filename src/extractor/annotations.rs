//! Annotation usages: recognition and argument parsing.
//!
//! The argument text is re-scanned with the lexer so commas, braces and `=` inside string
//! literals never split an argument list.

use crate::lexer::{self, DepthCounter};
use crate::model::{AnnotationUsage, AnnotationValue};

/// Parses the annotation starting at `at` (which must hold `@`).
///
/// `code` is the code view and `text` the original source; structure is read from the
/// former, argument text is sliced from the latter. Returns the usage and the offset just
/// past it, or `None` when no identifier follows the `@`.
pub fn read_annotation(
    code: &[u8],
    text: &str,
    at: usize,
    limit: usize,
) -> Option<(AnnotationUsage, usize)> {
    let name_start = skip_ws(code, at + 1, limit);
    let name_end = qualified_name_end(code, name_start, limit);
    if name_end == name_start {
        return None;
    }
    let name: String = text[name_start..name_end]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let after = skip_ws(code, name_end, limit);
    if after < limit && code[after] == b'(' {
        let (arguments, next) = match find_paren_close(code, after, limit) {
            Some(close) => (text[after + 1..close].trim().to_string(), close + 1),
            None => (text[after + 1..limit].trim().to_string(), limit),
        };
        let values = parse_arguments(&arguments);
        return Some((
            AnnotationUsage {
                name,
                arguments,
                values,
            },
            next,
        ));
    }

    Some((
        AnnotationUsage {
            name,
            arguments: String::new(),
            values: Vec::new(),
        },
        name_end,
    ))
}

/// Splits annotation argument text into key/value pairs.
///
/// A single element without `=` is the implicit `value`. Anything else that is not a clean
/// `key = value` list yields no pairs; the raw text is still kept on the usage.
pub fn parse_arguments(arguments: &str) -> Vec<AnnotationValue> {
    let arguments = arguments.trim();
    if arguments.is_empty() {
        return Vec::new();
    }

    let lexed = lexer::scan(arguments);
    let code = lexed.code.as_bytes();
    let elements = split_top_level(code, 0, code.len());

    let mut values = Vec::new();
    for (start, end) in &elements {
        let element = arguments[*start..*end].trim();
        match find_assignment(code, *start, *end) {
            Some(eq) => {
                let key = arguments[*start..eq].trim();
                if !is_identifier(key) {
                    return Vec::new();
                }
                values.push(AnnotationValue {
                    name: key.to_string(),
                    value: arguments[eq + 1..*end].trim().to_string(),
                });
            }
            None if elements.len() == 1 && !element.is_empty() => {
                values.push(AnnotationValue {
                    name: "value".to_string(),
                    value: element.to_string(),
                });
            }
            None => return Vec::new(),
        }
    }
    values
}

/// String values of an annotation element: a literal or an array of literals.
///
/// Returns `None` when the value is not made purely of string literals (a constant
/// reference or a concatenation, for example).
pub fn string_values(value: &str) -> Option<Vec<String>> {
    let value = value.trim();
    if let Some(inner) = value.strip_prefix('{').and_then(|v| v.strip_suffix('}')) {
        let lexed = lexer::scan(inner);
        let code = lexed.code.as_bytes();
        return split_top_level(code, 0, code.len())
            .into_iter()
            .map(|(s, e)| inner[s..e].trim())
            .filter(|element| !element.is_empty())
            .map(unquote)
            .collect();
    }
    unquote(value).map(|s| vec![s])
}

/// Trailing identifiers of enum constant references, e.g. `RequestMethod.GET` → `GET`.
pub fn enum_values(value: &str) -> Vec<String> {
    let value = value.trim();
    let inner = value
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .unwrap_or(value);
    inner
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.rsplit('.').next().unwrap_or(v).trim().to_string())
        .collect()
}

fn unquote(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            if c == '"' {
                // `"a" + "b"` and similar
                return None;
            }
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    Some(out)
}

pub(crate) fn find_assignment(code: &[u8], start: usize, end: usize) -> Option<usize> {
    let mut depth = DepthCounter::default();
    for i in start..end {
        depth.feed(code[i]);
        if code[i] == b'=' && depth.is_flat() {
            let next = code.get(i + 1).copied();
            let prev = if i > 0 { code.get(i - 1).copied() } else { None };
            let is_comparison = next == Some(b'=')
                || matches!(prev, Some(b'=') | Some(b'!') | Some(b'<') | Some(b'>'));
            if !is_comparison {
                return Some(i);
            }
        }
    }
    None
}

/// Byte ranges of the comma-separated elements of `code[start..end]` at bracket depth 0.
///
/// A `<` only opens a type-argument list when a matching `>` follows with nothing but
/// type-name bytes in between; otherwise it is a comparison and commas after it still split.
pub(crate) fn split_top_level(code: &[u8], start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut parts = Vec::new();
    let mut depth = DepthCounter::default();
    let mut part_start = start;
    let mut i = start;
    while i < end {
        match code[i] {
            b'<' => {
                if let Some(close) = type_arguments_end(code, i, end) {
                    i = close + 1;
                    continue;
                }
            }
            b',' if depth.is_flat() => {
                parts.push((part_start, i));
                part_start = i + 1;
            }
            byte => depth.feed(byte),
        }
        i += 1;
    }
    if part_start < end || !parts.is_empty() {
        parts.push((part_start, end));
    }
    parts
        .into_iter()
        .filter(|(s, e)| code[*s..*e].iter().any(|b| !b.is_ascii_whitespace()))
        .collect()
}

/// Offset of the `>` closing the type-argument list opened at `open`.
fn type_arguments_end(code: &[u8], open: usize, end: usize) -> Option<usize> {
    let mut angle = 0usize;
    for (i, &byte) in code.iter().enumerate().take(end).skip(open) {
        match byte {
            b'<' => angle += 1,
            b'>' => {
                angle -= 1;
                if angle == 0 {
                    return Some(i);
                }
            }
            b',' | b'.' | b'?' | b'[' | b']' | b'&' | b'@' => {}
            b if is_ident_byte(b) || b.is_ascii_whitespace() => {}
            _ => return None,
        }
    }
    None
}

fn find_paren_close(code: &[u8], open: usize, limit: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, byte) in code.iter().enumerate().take(limit).skip(open) {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn skip_ws(code: &[u8], mut pos: usize, limit: usize) -> usize {
    while pos < limit && code[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// End of a dotted identifier such as `org.springframework.web.bind.annotation.GetMapping`.
fn qualified_name_end(code: &[u8], start: usize, limit: usize) -> usize {
    let mut pos = start;
    loop {
        let ident_end = ident_end(code, pos, limit);
        if ident_end == pos {
            return pos;
        }
        let after = skip_ws(code, ident_end, limit);
        if after < limit && code[after] == b'.' {
            let next = skip_ws(code, after + 1, limit);
            // `@interface` is handled by the caller; `.` followed by a non-identifier ends here
            if ident_end_is_some(code, next, limit) {
                pos = next;
                continue;
            }
        }
        return ident_end;
    }
}

fn ident_end_is_some(code: &[u8], pos: usize, limit: usize) -> bool {
    ident_end(code, pos, limit) > pos
}

pub(crate) fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$' || byte >= 0x80
}

pub(crate) fn ident_end(code: &[u8], start: usize, limit: usize) -> usize {
    if start >= limit || code[start].is_ascii_digit() {
        return start;
    }
    let mut pos = start;
    while pos < limit && is_ident_byte(code[pos]) {
        pos += 1;
    }
    pos
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let bytes = text.as_bytes();
    !bytes.is_empty() && ident_end(bytes, 0, bytes.len()) == bytes.len()
}
