//! Structural extraction of Java declarations.
//!
//! The extractor walks the lexer's code view with keyword and bracket-depth heuristics
//! instead of a grammar. It recognizes the package, imports and type declarations at depth
//! 0, then members inside each type body, recursing into nested types. Anything it does not
//! recognize is skipped up to the next `;` or balanced block, so unknown syntax is absorbed
//! rather than reported. Method bodies are kept as opaque spans: lambdas, anonymous classes
//! and local classes stay inside them.
//!
//! # Example
//!
//! ```
//! use spring_insight::{extractor, lexer};
//!
//! let text = "package a.b;\npublic class C { int x; void run() {} }";
//! let lexed = lexer::scan(text);
//! let model = extractor::extract(text, "C.java", &lexed);
//! assert_eq!(model.package.as_deref(), Some("a.b"));
//! assert_eq!(model.types[0].methods[0].name, "run");
//! ```

pub mod annotations;
mod declarations;

use crate::javadoc;
use crate::lexer::{LexedSource, SpanKind};
use crate::model::{AnnotationUsage, DocComment, Import, SourceModel, TextSpan, TypeDecl, TypeKind};
use annotations::{ident_end, read_annotation};
use log::debug;

/// Builds the [`SourceModel`] of one file from its text and lexer output.
pub fn extract(text: &str, file_path: &str, lexed: &LexedSource) -> SourceModel {
    let extractor = Extractor::new(text, lexed);
    let mut model = SourceModel {
        file_path: file_path.to_string(),
        package: None,
        imports: Vec::new(),
        types: Vec::new(),
        line_count: text.lines().count(),
        degraded: lexed.is_degraded(),
        diagnostics: lexed.diagnostics.clone(),
    };
    extractor.parse_compilation_unit(&mut model);

    debug!(
        "Extracted {} type(s) and {} import(s) from {}",
        model.type_count(),
        model.imports.len(),
        file_path
    );
    model
}

const MODIFIERS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "native",
    "synchronized",
    "transient",
    "volatile",
    "strictfp",
    "default",
    "sealed",
];

/// Annotations and modifiers collected ahead of a declaration.
#[derive(Debug, Default)]
struct Prelude {
    start: usize,
    /// Offset of the first token after the annotations and modifiers
    end: usize,
    annotations: Vec<AnnotationUsage>,
    modifiers: Vec<String>,
}

struct Extractor<'a> {
    text: &'a str,
    code: &'a [u8],
    lexed: &'a LexedSource,
}

impl<'a> Extractor<'a> {
    fn new(text: &'a str, lexed: &'a LexedSource) -> Self {
        Self {
            text,
            code: lexed.code.as_bytes(),
            lexed,
        }
    }

    fn parse_compilation_unit(&self, model: &mut SourceModel) {
        let limit = self.code.len();
        let mut pos = 0;
        while pos < limit {
            let (prelude, at) = self.read_prelude(pos, limit);
            if at >= limit {
                break;
            }

            if let Some(kind) = self.type_keyword_at(at, limit) {
                match self.parse_type(kind, prelude, at, limit) {
                    Some((decl, next)) => {
                        model.types.push(decl);
                        pos = next;
                    }
                    None => pos = self.skip_statement(at, limit),
                }
                continue;
            }

            match self.code[at] {
                b';' | b'}' => pos = at + 1,
                b'{' => pos = self.block_end(at, limit),
                _ => match self.word_at(at, limit) {
                    "package" => {
                        let end = self.statement_end(at, limit);
                        let name = self.compact(at + "package".len(), end);
                        if !name.is_empty() {
                            model.package = Some(name);
                        }
                        pos = end + 1;
                    }
                    "import" => {
                        let end = self.statement_end(at, limit);
                        model.imports.push(self.parse_import(at + "import".len(), end));
                        pos = end + 1;
                    }
                    _ => pos = self.skip_statement(at, limit),
                },
            }
        }
    }

    fn parse_import(&self, start: usize, end: usize) -> Import {
        let first = self.skip_ws(start, end);
        let is_static = self.word_at(first, end) == "static";
        let name_start = if is_static {
            first + "static".len()
        } else {
            first
        };
        let mut name = self.compact(name_start, end);
        let is_wildcard = name.ends_with(".*");
        if is_wildcard {
            name.truncate(name.len() - 2);
        }
        Import {
            name,
            is_static,
            is_wildcard,
        }
    }

    /// Parses a type declaration whose keyword starts at `at`.
    ///
    /// Returns the declaration and the offset just past its closing brace.
    fn parse_type(
        &self,
        kind: TypeKind,
        prelude: Prelude,
        at: usize,
        limit: usize,
    ) -> Option<(TypeDecl, usize)> {
        let keyword_end = match kind {
            TypeKind::Annotation => {
                let after_at = self.skip_ws(at + 1, limit);
                after_at + "interface".len()
            }
            _ => at + kind.keyword().len(),
        };
        let name_start = self.skip_ws(keyword_end, limit);
        let name_end = ident_end(self.code, name_start, limit);
        if name_end == name_start {
            return None;
        }

        let mut decl = TypeDecl::new(
            kind,
            self.text[name_start..name_end].to_string(),
            TextSpan::new(prelude.start, limit),
            self.lexed.line_of(name_start),
        );
        decl.doc = self.doc_of(&prelude);
        decl.modifiers = prelude.modifiers;
        decl.annotations = prelude.annotations;

        let mut pos = self.skip_ws(name_end, limit);
        if pos < limit && self.code[pos] == b'<' {
            if let Some(close) = self.angle_close(pos, limit) {
                decl.type_parameters = Some(declarations::normalize_type(&self.lexed.code[pos..=close]));
                pos = self.skip_ws(close + 1, limit);
            }
        }
        if kind == TypeKind::Record && pos < limit && self.code[pos] == b'(' {
            let close = self.close_of(pos, limit).unwrap_or(limit);
            decl.record_components = self.parse_parameters(pos + 1, close);
            pos = (close + 1).min(limit);
        }

        let open = self.find_body_open(pos, limit)?;
        self.parse_type_header(&mut decl, pos, open);

        let close = self.close_of(open, limit);
        let body_end = close.unwrap_or(limit);
        decl.span = TextSpan::new(prelude.start, close.map_or(limit, |c| c + 1));
        self.parse_members(&mut decl, open + 1, body_end);

        Some((decl, close.map_or(limit, |c| c + 1)))
    }

    /// `extends` / `implements` / `permits` clauses between the name and the body.
    fn parse_type_header(&self, decl: &mut TypeDecl, start: usize, end: usize) {
        let mut clause: Option<(&str, usize)> = None;
        let mut pos = start;
        let mut angle = 0i32;

        while pos < end {
            match self.code[pos] {
                b'<' => angle += 1,
                b'>' if angle > 0 => angle -= 1,
                _ => {}
            }
            let is_word_start = pos == start || !annotations::is_ident_byte(self.code[pos - 1]);
            if angle == 0 && is_word_start {
                let word = self.word_at(pos, end);
                if matches!(word, "extends" | "implements" | "permits") {
                    if let Some((keyword, from)) = clause {
                        self.apply_clause(decl, keyword, from, pos);
                    }
                    clause = Some((word, pos + word.len()));
                    pos += word.len();
                    continue;
                }
            }
            pos += 1;
        }
        if let Some((keyword, from)) = clause {
            self.apply_clause(decl, keyword, from, end);
        }
    }

    fn apply_clause(&self, decl: &mut TypeDecl, keyword: &str, from: usize, to: usize) {
        let names = declarations::split_type_list(&self.lexed.code, from, to);
        match (keyword, decl.kind) {
            ("extends", TypeKind::Class) => decl.superclass = names.into_iter().next(),
            ("extends", TypeKind::Interface) | ("implements", _) => decl.interfaces.extend(names),
            // sealed `permits` lists are not modeled
            _ => {}
        }
    }

    /// Collects annotations and modifiers starting at `pos`.
    ///
    /// Returns them with the offset of the first token that is neither.
    fn read_prelude(&self, pos: usize, limit: usize) -> (Prelude, usize) {
        let mut at = self.skip_ws(pos, limit);
        let mut prelude = Prelude {
            start: at,
            ..Prelude::default()
        };

        while at < limit {
            if self.code[at] == b'@' {
                if self.is_annotation_type_keyword(at, limit) {
                    break;
                }
                match read_annotation(self.code, self.text, at, limit) {
                    Some((usage, next)) => {
                        prelude.annotations.push(usage);
                        at = self.skip_ws(next, limit);
                        continue;
                    }
                    None => break,
                }
            }

            let word = self.word_at(at, limit);
            if MODIFIERS.contains(&word) {
                prelude.modifiers.push(word.to_string());
                at = self.skip_ws(at + word.len(), limit);
                continue;
            }
            if word == "non" && self.text[at..limit].starts_with("non-sealed") {
                prelude.modifiers.push("non-sealed".to_string());
                at = self.skip_ws(at + "non-sealed".len(), limit);
                continue;
            }
            break;
        }
        prelude.end = at;
        (prelude, at)
    }

    fn type_keyword_at(&self, at: usize, limit: usize) -> Option<TypeKind> {
        if self.code[at] == b'@' {
            return self
                .is_annotation_type_keyword(at, limit)
                .then_some(TypeKind::Annotation);
        }
        match self.word_at(at, limit) {
            "class" => Some(TypeKind::Class),
            "interface" => Some(TypeKind::Interface),
            "enum" => Some(TypeKind::Enum),
            "record" => {
                // contextual keyword: `record Name(` or `record Name<`
                let name_start = self.skip_ws(at + "record".len(), limit);
                let name_end = ident_end(self.code, name_start, limit);
                let after = self.skip_ws(name_end, limit);
                (name_end > name_start
                    && after < limit
                    && matches!(self.code[after], b'(' | b'<'))
                .then_some(TypeKind::Record)
            }
            _ => None,
        }
    }

    fn is_annotation_type_keyword(&self, at: usize, limit: usize) -> bool {
        let word_start = self.skip_ws(at + 1, limit);
        self.word_at(word_start, limit) == "interface"
    }

    /// Documentation of a declaration: the comment leading its prelude, or failing that the
    /// last `/** */` comment written between its annotations and its keyword.
    fn doc_of(&self, prelude: &Prelude) -> Option<DocComment> {
        if let Some(doc) = self.leading_comment(prelude.start) {
            return Some(doc);
        }
        let span = self
            .lexed
            .spans
            .iter()
            .rev()
            .filter(|s| s.start >= prelude.start && s.end <= prelude.end)
            .find(|s| s.kind == SpanKind::BlockComment && self.text[s.start..].starts_with("/**"))?;
        let raw = &self.text[span.start..span.end];
        Some(javadoc::parse_comment(raw, TextSpan::new(span.start, span.end)))
    }

    /// The comment immediately preceding `start`, separated only by whitespace.
    ///
    /// A run of line comments on consecutive lines is merged into one. A line comment that
    /// trails code on its own line belongs to that code and is not attached.
    fn leading_comment(&self, start: usize) -> Option<DocComment> {
        let spans = &self.lexed.spans;
        let mut idx = spans.partition_point(|s| s.end <= start);
        if let Some(span) = spans.get(idx) {
            if span.start < start && !self.text[span.start..start].trim().is_empty() {
                return None;
            }
        }

        // indices of the first and last comment span of the attached run
        let mut run: Option<(usize, usize)> = None;
        while idx > 0 {
            idx -= 1;
            let span = spans[idx];
            let gap = &self.text[span.start..span.end];
            match (span.kind, run) {
                (SpanKind::Code, None) if gap.trim().is_empty() => {}
                (SpanKind::Code, Some(_)) if gap.trim().is_empty() && gap.matches('\n').count() <= 1 => {}
                (SpanKind::BlockComment, None) => {
                    run = Some((idx, idx));
                    break;
                }
                (SpanKind::LineComment, _) if self.starts_line(span.start) => {
                    run = Some((idx, run.map_or(idx, |(_, last)| last)));
                }
                _ => break,
            }
        }

        let (first, last) = run?;
        let (first, last) = (spans[first], spans[last]);
        let raw = &self.text[first.start..last.end];
        Some(javadoc::parse_comment(raw, TextSpan::new(first.start, last.end)))
    }

    /// True when only whitespace precedes `offset` on its line
    fn starts_line(&self, offset: usize) -> bool {
        let line_start = self.text[..offset].rfind('\n').map_or(0, |p| p + 1);
        self.text[line_start..offset].trim().is_empty()
    }

    // ---- cursor helpers over the code view ----

    fn skip_ws(&self, mut pos: usize, limit: usize) -> usize {
        while pos < limit && self.code[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    }

    fn word_at(&self, pos: usize, limit: usize) -> &'a str {
        let end = ident_end(self.code, pos, limit);
        &self.lexed.code[pos..end]
    }

    /// Source text of `start..end` with all whitespace removed
    fn compact(&self, start: usize, end: usize) -> String {
        self.lexed.code[start..end]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    /// Offset of the `;` ending the statement at `pos` (or `limit`)
    fn statement_end(&self, pos: usize, limit: usize) -> usize {
        self.code[pos..limit]
            .iter()
            .position(|b| *b == b';')
            .map_or(limit, |p| pos + p)
    }

    /// Matching closer for the bracket at `open`, counting only brackets of the same kind.
    fn close_of(&self, open: usize, limit: usize) -> Option<usize> {
        let (opener, closer) = match self.code[open] {
            b'{' => (b'{', b'}'),
            b'(' => (b'(', b')'),
            b'[' => (b'[', b']'),
            _ => return None,
        };
        let mut depth = 0usize;
        for i in open..limit {
            if self.code[i] == opener {
                depth += 1;
            } else if self.code[i] == closer {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Matching `>` for generic brackets; gives up at anything that cannot be in a type.
    fn angle_close(&self, open: usize, limit: usize) -> Option<usize> {
        let mut depth = 0usize;
        for i in open..limit {
            match self.code[i] {
                b'<' => depth += 1,
                b'>' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                b';' | b'{' | b'}' | b'(' | b')' | b'=' => return None,
                _ => {}
            }
        }
        None
    }

    fn block_end(&self, open: usize, limit: usize) -> usize {
        self.close_of(open, limit).map_or(limit, |c| c + 1)
    }

    /// First `{` of a type body, unless a `;` ends the declaration first.
    fn find_body_open(&self, pos: usize, limit: usize) -> Option<usize> {
        for i in pos..limit {
            match self.code[i] {
                b'{' => return Some(i),
                b';' | b'}' => return None,
                _ => {}
            }
        }
        None
    }

    /// Skips an unrecognized construct: up to and including the next `;`, or past a balanced
    /// block that ends it. Stops before a `}` closing the enclosing body.
    fn skip_statement(&self, pos: usize, limit: usize) -> usize {
        let mut i = pos;
        while i < limit {
            match self.code[i] {
                b';' => return i + 1,
                b'{' => return self.block_end(i, limit),
                b'(' | b'[' => i = self.close_of(i, limit).map_or(limit, |c| c + 1),
                b'}' if i > pos => return i,
                _ => i += 1,
            }
        }
        limit
    }
}
