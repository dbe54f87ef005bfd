//! Comment and Javadoc text processing.
//!
//! Works on the comment spans produced by the lexer: strips comment markers, splits
//! Javadoc block tags (`@param`, `@return`, `@throws`) out of the description, and lists
//! every comment of a file for the comment-extraction tool.

use crate::lexer::{self, SpanKind};
use crate::model::{DocComment, DocTag, TextSpan};
use log::debug;
use serde::{Deserialize, Serialize};

/// Builds a [`DocComment`] from the raw text of one or more comment spans.
///
/// `raw` is the exact source text of the comment(s) covered by `span`.
pub fn parse_comment(raw: &str, span: TextSpan) -> DocComment {
    let is_javadoc = raw.starts_with("/**") && raw != "/**/";
    let lines = strip_markers(raw);

    let mut description = Vec::new();
    let mut params = Vec::new();
    let mut returns: Option<String> = None;
    let mut throws = Vec::new();
    let mut current = BlockTag::None;

    for line in lines {
        if let Some(rest) = line.strip_prefix('@') {
            let (tag, body) = split_word(rest);
            current = match tag {
                "param" => {
                    let (name, desc) = split_word(body);
                    params.push(DocTag {
                        name: name.to_string(),
                        description: desc.to_string(),
                    });
                    BlockTag::Param
                }
                "return" | "returns" => {
                    returns = Some(body.to_string());
                    BlockTag::Return
                }
                "throws" | "exception" => {
                    let (name, desc) = split_word(body);
                    throws.push(DocTag {
                        name: name.to_string(),
                        description: desc.to_string(),
                    });
                    BlockTag::Throws
                }
                _ => BlockTag::Other,
            };
            continue;
        }

        if line.is_empty() {
            continue;
        }
        match current {
            BlockTag::None => description.push(line),
            BlockTag::Param => append(params.last_mut().map(|t| &mut t.description), &line),
            BlockTag::Throws => append(throws.last_mut().map(|t| &mut t.description), &line),
            BlockTag::Return => append(returns.as_mut(), &line),
            BlockTag::Other => {}
        }
    }

    DocComment {
        is_javadoc,
        text: description.join(" "),
        params,
        returns,
        throws,
        span,
    }
}

#[derive(Clone, Copy)]
enum BlockTag {
    None,
    Param,
    Return,
    Throws,
    Other,
}

fn append(target: Option<&mut String>, line: &str) {
    if let Some(target) = target {
        if !target.is_empty() {
            target.push(' ');
        }
        target.push_str(line);
    }
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim()),
        None => (text, ""),
    }
}

/// Comment body lines with `//`, `/*`, `*/` and leading `*` removed, each trimmed.
pub fn strip_markers(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    for line in raw.lines() {
        let mut line = line.trim();
        if let Some(rest) = line.strip_prefix("//") {
            out.push(rest.trim().to_string());
            continue;
        }
        if let Some(rest) = line.strip_prefix("/**") {
            line = rest;
        } else if let Some(rest) = line.strip_prefix("/*") {
            line = rest;
        }
        if let Some(rest) = line.strip_suffix("*/") {
            line = rest;
        }
        let line = line.trim_start();
        let line = line.strip_prefix('*').unwrap_or(line);
        out.push(line.trim().to_string());
    }
    out
}

/// Every comment in a file, as reported by the comment-extraction tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentReport {
    pub total_lines: usize,
    pub line_comments: usize,
    pub block_comments: usize,
    pub javadoc_comments: usize,
    pub comments: Vec<CommentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentEntry {
    pub kind: CommentKind,
    pub line: usize,
    pub end_line: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub javadoc: Option<DocComment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentKind {
    Line,
    Block,
    Javadoc,
}

/// Lists the comments of `text` in source order.
///
/// Javadoc entries carry their parsed block tags when `include_javadoc` is set.
pub fn extract_comments(text: &str, include_javadoc: bool) -> CommentReport {
    let lexed = lexer::scan(text);
    let mut report = CommentReport {
        total_lines: lexed.line_count(),
        line_comments: 0,
        block_comments: 0,
        javadoc_comments: 0,
        comments: Vec::new(),
    };

    for span in lexed.comments() {
        let raw = &text[span.start..span.end];
        let doc = parse_comment(raw, span.span());
        let kind = match span.kind {
            SpanKind::LineComment => {
                report.line_comments += 1;
                CommentKind::Line
            }
            _ if doc.is_javadoc => {
                report.javadoc_comments += 1;
                CommentKind::Javadoc
            }
            _ => {
                report.block_comments += 1;
                CommentKind::Block
            }
        };

        let body = strip_markers(raw)
            .into_iter()
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        report.comments.push(CommentEntry {
            kind,
            line: lexed.line_of(span.start),
            end_line: lexed.line_of(span.end.saturating_sub(1).max(span.start)),
            text: body,
            javadoc: (include_javadoc && kind == CommentKind::Javadoc).then_some(doc),
        });
    }

    debug!("Extracted {} comments", report.comments.len());
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_javadoc_with_tags() {
        let raw = "/**\n * Finds a user.\n * Second line.\n * @param id the user id\n *        must be positive\n * @return the user\n * @throws NotFoundException when missing\n */";
        let doc = parse_comment(raw, TextSpan::new(0, raw.len()));

        assert!(doc.is_javadoc);
        assert_eq!(doc.text, "Finds a user. Second line.");
        assert_eq!(doc.params.len(), 1);
        assert_eq!(doc.params[0].name, "id");
        assert_eq!(doc.params[0].description, "the user id must be positive");
        assert_eq!(doc.returns.as_deref(), Some("the user"));
        assert_eq!(doc.throws[0].name, "NotFoundException");
        assert_eq!(doc.throws[0].description, "when missing");
    }

    #[test]
    fn test_single_line_javadoc() {
        let raw = "/** Greets. */";
        let doc = parse_comment(raw, TextSpan::new(0, raw.len()));
        assert!(doc.is_javadoc);
        assert_eq!(doc.text, "Greets.");
    }

    #[test]
    fn test_plain_comments() {
        let doc = parse_comment("// counter of things", TextSpan::new(0, 20));
        assert!(!doc.is_javadoc);
        assert_eq!(doc.text, "counter of things");

        let doc = parse_comment("/* block */", TextSpan::new(0, 11));
        assert!(!doc.is_javadoc);
        assert_eq!(doc.text, "block");
    }

    #[test]
    fn test_unknown_tags_are_dropped_from_text() {
        let raw = "/**\n * Body.\n * @since 1.2\n * @author someone\n */";
        let doc = parse_comment(raw, TextSpan::new(0, raw.len()));
        assert_eq!(doc.text, "Body.");
        assert!(doc.params.is_empty());
    }

    #[test]
    fn test_extract_comments_counts_kinds() {
        let text = "// header\n/** Doc. */\nclass A {\n  /* block\n  spans */ int x; // trailing\n  String s = \"// not a comment\";\n}\n";
        let report = extract_comments(text, true);

        assert_eq!(report.line_comments, 2);
        assert_eq!(report.javadoc_comments, 1);
        assert_eq!(report.block_comments, 1);
        assert_eq!(report.comments.len(), 4);
        assert_eq!(report.comments[0].line, 1);
        assert_eq!(report.comments[1].kind, CommentKind::Javadoc);
        assert!(report.comments[1].javadoc.is_some());
        assert_eq!(report.comments[2].line, 4);
        assert_eq!(report.comments[2].end_line, 5);
        assert_eq!(report.comments[2].text, "block spans");
    }

    #[test]
    fn test_extract_comments_without_javadoc_detail() {
        let report = extract_comments("/** Doc. */ class A {}", false);
        assert_eq!(report.javadoc_comments, 1);
        assert!(report.comments[0].javadoc.is_none());
    }
}
