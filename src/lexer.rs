//! Lexical scanner for Java source text.
//!
//! The scanner is a small state machine that classifies every byte of the input into exactly
//! one span: code, a comment, or a literal. Later passes work on the *code view*, a copy of
//! the input with every non-code byte blanked out, so braces or keywords inside strings and
//! comments can never be mistaken for structure.
//!
//! Scanning never fails. An unterminated literal or comment swallows the rest of the input
//! and is recorded as a [`Diagnostic`].

use crate::model::{Diagnostic, DiagnosticKind, TextSpan};
use log::debug;
use serde::{Deserialize, Serialize};

/// Classification of a span of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Code,
    LineComment,
    BlockComment,
    StringLiteral,
    CharLiteral,
    /// Triple-quoted `"""` literal
    TextBlock,
}

impl SpanKind {
    pub fn is_comment(&self) -> bool {
        matches!(self, SpanKind::LineComment | SpanKind::BlockComment)
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            SpanKind::StringLiteral | SpanKind::CharLiteral | SpanKind::TextBlock
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedSpan {
    pub kind: SpanKind,
    pub start: usize,
    pub end: usize,
}

impl ClassifiedSpan {
    pub fn span(&self) -> TextSpan {
        TextSpan::new(self.start, self.end)
    }
}

/// Output of [`scan`].
#[derive(Debug, Clone)]
pub struct LexedSource {
    /// Contiguous, non-overlapping, covering `0..len`
    pub spans: Vec<ClassifiedSpan>,
    /// Same byte length as the input; bytes outside code spans are spaces, newlines kept
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
    line_starts: Vec<usize>,
}

impl LexedSource {
    /// 1-based line number of a byte offset
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Comment spans in source order
    pub fn comments(&self) -> impl Iterator<Item = &ClassifiedSpan> {
        self.spans.iter().filter(|s| s.kind.is_comment())
    }

    /// Code view restricted to `span`
    pub fn code_in(&self, span: TextSpan) -> &str {
        let end = span.end.min(self.code.len());
        let start = span.start.min(end);
        &self.code[start..end]
    }

    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Running bracket counter, fed only with code characters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DepthCounter {
    pub braces: i64,
    pub parens: i64,
    pub brackets: i64,
}

impl DepthCounter {
    pub fn feed(&mut self, byte: u8) {
        match byte {
            b'{' => self.braces += 1,
            b'}' => self.braces -= 1,
            b'(' => self.parens += 1,
            b')' => self.parens -= 1,
            b'[' => self.brackets += 1,
            b']' => self.brackets -= 1,
            _ => {}
        }
    }

    /// True when no bracket of any kind is open
    pub fn is_flat(&self) -> bool {
        self.braces <= 0 && self.parens <= 0 && self.brackets <= 0
    }
}

/// Classifies `text` into spans and builds the code view.
pub fn scan(text: &str) -> LexedSource {
    let bytes = text.as_bytes();
    let line_starts = compute_line_starts(text);
    let mut spans = Vec::new();
    let mut unterminated: Vec<(DiagnosticKind, usize)> = Vec::new();

    let mut code_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let next = bytes.get(i + 1).copied();
        let lexeme = match (bytes[i], next) {
            (b'/', Some(b'/')) => Some(scan_line_comment(bytes, i)),
            (b'/', Some(b'*')) => Some(scan_block_comment(bytes, i)),
            (b'"', _) if bytes[i..].starts_with(b"\"\"\"") => Some(scan_text_block(bytes, i)),
            (b'"', _) => Some(scan_quoted(bytes, i, b'"', SpanKind::StringLiteral)),
            (b'\'', _) => Some(scan_quoted(bytes, i, b'\'', SpanKind::CharLiteral)),
            _ => None,
        };

        let Some((kind, end, terminated)) = lexeme else {
            i += 1;
            continue;
        };

        if code_start < i {
            spans.push(ClassifiedSpan {
                kind: SpanKind::Code,
                start: code_start,
                end: i,
            });
        }
        spans.push(ClassifiedSpan { kind, start: i, end });
        if !terminated {
            unterminated.push((unterminated_kind(kind), i));
        }
        i = end;
        code_start = end;
    }
    if code_start < bytes.len() {
        spans.push(ClassifiedSpan {
            kind: SpanKind::Code,
            start: code_start,
            end: bytes.len(),
        });
    }

    let code = build_code_view(bytes, &spans);
    let mut lexed = LexedSource {
        spans,
        code,
        diagnostics: Vec::new(),
        line_starts,
    };

    for (kind, offset) in unterminated {
        let line = lexed.line_of(offset);
        lexed.diagnostics.push(Diagnostic {
            kind,
            offset,
            line,
            message: format!("{} starting at line {} runs to end of input", describe(kind), line),
        });
    }
    check_brace_balance(&mut lexed);

    debug!(
        "Scanned {} bytes into {} spans ({} diagnostics)",
        bytes.len(),
        lexed.spans.len(),
        lexed.diagnostics.len()
    );
    lexed
}

fn compute_line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        text.bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(idx, _)| idx + 1),
    );
    starts
}

fn scan_line_comment(bytes: &[u8], start: usize) -> (SpanKind, usize, bool) {
    let end = bytes[start..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |p| start + p);
    (SpanKind::LineComment, end, true)
}

fn scan_block_comment(bytes: &[u8], start: usize) -> (SpanKind, usize, bool) {
    let mut j = start + 2;
    while j + 1 < bytes.len() {
        if bytes[j] == b'*' && bytes[j + 1] == b'/' {
            return (SpanKind::BlockComment, j + 2, true);
        }
        j += 1;
    }
    (SpanKind::BlockComment, bytes.len(), false)
}

fn scan_text_block(bytes: &[u8], start: usize) -> (SpanKind, usize, bool) {
    let mut j = start + 3;
    while j < bytes.len() {
        if bytes[j] == b'\\' {
            j += 2;
            continue;
        }
        if bytes[j..].starts_with(b"\"\"\"") {
            return (SpanKind::TextBlock, j + 3, true);
        }
        j += 1;
    }
    (SpanKind::TextBlock, bytes.len(), false)
}

/// String and char literals. A raw newline cannot appear inside either, so reaching one
/// means the literal was never closed and the rest of the input is taken.
fn scan_quoted(bytes: &[u8], start: usize, quote: u8, kind: SpanKind) -> (SpanKind, usize, bool) {
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' => break,
            b if b == quote => return (kind, j + 1, true),
            _ => j += 1,
        }
    }
    (kind, bytes.len(), false)
}

fn unterminated_kind(kind: SpanKind) -> DiagnosticKind {
    match kind {
        SpanKind::StringLiteral => DiagnosticKind::UnterminatedString,
        SpanKind::CharLiteral => DiagnosticKind::UnterminatedChar,
        SpanKind::TextBlock => DiagnosticKind::UnterminatedTextBlock,
        _ => DiagnosticKind::UnterminatedComment,
    }
}

fn describe(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::UnterminatedString => "unterminated string literal",
        DiagnosticKind::UnterminatedChar => "unterminated char literal",
        DiagnosticKind::UnterminatedTextBlock => "unterminated text block",
        DiagnosticKind::UnterminatedComment => "unterminated block comment",
        DiagnosticKind::UnbalancedBraces => "unbalanced braces",
    }
}

fn build_code_view(bytes: &[u8], spans: &[ClassifiedSpan]) -> String {
    let mut view = bytes.to_vec();
    for span in spans.iter().filter(|s| s.kind != SpanKind::Code) {
        for byte in &mut view[span.start..span.end] {
            if *byte != b'\n' {
                *byte = b' ';
            }
        }
    }
    // Span boundaries sit on ASCII delimiters, so whole characters are blanked.
    match String::from_utf8(view) {
        Ok(view) => view,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

fn check_brace_balance(lexed: &mut LexedSource) {
    let mut counter = DepthCounter::default();
    let mut underflow_at = None;
    for (idx, byte) in lexed.code.bytes().enumerate() {
        counter.feed(byte);
        if counter.braces < 0 {
            underflow_at.get_or_insert(idx);
            counter.braces = 0;
        }
    }

    if let Some(offset) = underflow_at {
        let line = lexed.line_of(offset);
        lexed.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::UnbalancedBraces,
            offset,
            line,
            message: format!("unmatched closing brace at line {}", line),
        });
    }
    if counter.braces > 0 {
        let offset = lexed.code.len();
        let line = lexed.line_of(offset);
        lexed.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::UnbalancedBraces,
            offset,
            line,
            message: format!("{} brace(s) left open at end of input", counter.braces),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_covers(text: &str, lexed: &LexedSource) {
        let mut expected = 0;
        for span in &lexed.spans {
            assert_eq!(span.start, expected, "gap or overlap at {}", expected);
            assert!(span.end > span.start, "empty span at {}", span.start);
            expected = span.end;
        }
        assert_eq!(expected, text.len());
        assert_eq!(lexed.code.len(), text.len());
    }

    fn kinds(lexed: &LexedSource) -> Vec<SpanKind> {
        lexed.spans.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_empty_input() {
        let lexed = scan("");
        assert!(lexed.spans.is_empty());
        assert!(lexed.code.is_empty());
        assert!(lexed.diagnostics.is_empty());
        assert_eq!(lexed.line_count(), 1);
    }

    #[test]
    fn test_coverage_on_mixed_input() {
        let inputs = [
            "class A {}",
            "// only a comment",
            "/* block */ int x = 'a'; String s = \"s\";",
            "String t = \"\"\"\n  text { block\n  \"\"\";",
            "int a; /* unterminated",
            "char c = '\\'';",
            "é = \"ü\"; // ß",
        ];
        for input in inputs {
            let lexed = scan(input);
            assert_covers(input, &lexed);
        }
    }

    #[test]
    fn test_escaped_quote_does_not_close_string() {
        let text = r#"String s = "a\"b"; int x;"#;
        let lexed = scan(text);
        assert_covers(text, &lexed);
        let literal = lexed
            .spans
            .iter()
            .find(|s| s.kind == SpanKind::StringLiteral)
            .unwrap();
        assert_eq!(&text[literal.start..literal.end], r#""a\"b""#);
        assert!(lexed.code.contains("int x;"));
    }

    #[test]
    fn test_comment_marker_inside_string_is_not_a_comment() {
        let text = "String s = \"/* not a comment\"; int y; // tail";
        let lexed = scan(text);
        assert_eq!(
            kinds(&lexed),
            vec![
                SpanKind::Code,
                SpanKind::StringLiteral,
                SpanKind::Code,
                SpanKind::LineComment
            ]
        );
        assert!(lexed.diagnostics.is_empty());
    }

    #[test]
    fn test_quote_inside_block_comment_is_ignored() {
        let text = "/* it's \"quoted\" */ int z;";
        let lexed = scan(text);
        assert_eq!(kinds(&lexed), vec![SpanKind::BlockComment, SpanKind::Code]);
    }

    #[test]
    fn test_text_block() {
        let text = "String q = \"\"\"\n  { \"inner\" }\n  \"\"\"; int after;";
        let lexed = scan(text);
        assert_covers(text, &lexed);
        assert!(lexed.spans.iter().any(|s| s.kind == SpanKind::TextBlock));
        assert!(!lexed.code.contains('{'));
        assert!(lexed.code.contains("int after;"));
    }

    #[test]
    fn test_braces_in_literals_are_blanked() {
        let text = "void m() { String s = \"{ not real\"; char c = '}'; }";
        let lexed = scan(text);
        assert_eq!(lexed.code.matches('{').count(), 1);
        assert_eq!(lexed.code.matches('}').count(), 1);
        assert!(lexed.diagnostics.is_empty());
    }

    #[test]
    fn test_code_view_keeps_newlines() {
        let text = "/* a\n b */\nint x;";
        let lexed = scan(text);
        assert_eq!(lexed.code, "    \n     \nint x;");
        assert_eq!(lexed.line_of(lexed.code.find("int").unwrap()), 3);
    }

    #[test]
    fn test_unterminated_string_takes_rest_of_input() {
        let text = "int a;\nString s = \"oops;\nint b;\n";
        let lexed = scan(text);
        assert_covers(text, &lexed);
        let last = lexed.spans.last().unwrap();
        assert_eq!(last.kind, SpanKind::StringLiteral);
        assert_eq!(last.end, text.len());
        assert_eq!(lexed.diagnostics.len(), 1);
        assert_eq!(lexed.diagnostics[0].kind, DiagnosticKind::UnterminatedString);
        assert_eq!(lexed.diagnostics[0].line, 2);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let lexed = scan("class A { /* never closed");
        assert!(lexed
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnterminatedComment));
        assert!(lexed
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnbalancedBraces));
    }

    #[test]
    fn test_unmatched_closing_brace() {
        let lexed = scan("class A { } }");
        assert_eq!(lexed.diagnostics.len(), 1);
        assert_eq!(lexed.diagnostics[0].kind, DiagnosticKind::UnbalancedBraces);
        assert_eq!(lexed.diagnostics[0].offset, 12);
    }

    #[test]
    fn test_depth_counter() {
        let mut counter = DepthCounter::default();
        for byte in "{ foo( [1] ".bytes() {
            counter.feed(byte);
        }
        assert_eq!(counter.braces, 1);
        assert_eq!(counter.parens, 1);
        assert_eq!(counter.brackets, 0);
        assert!(!counter.is_flat());
    }
}
