//! GitHub-flavored Markdown output.

use super::{walk, DocRenderer, DocWriter};
use crate::doc_builder::Documentation;
use crate::error::Result;

pub struct MarkdownRenderer;

impl DocRenderer for MarkdownRenderer {
    fn render(&self, doc: &Documentation) -> Result<String> {
        Ok(walk(doc, MarkdownWriter::default()))
    }
}

#[derive(Default)]
struct MarkdownWriter {
    out: String,
}

impl MarkdownWriter {
    fn blank_line(&mut self) {
        self.out.push('\n');
    }
}

impl DocWriter for MarkdownWriter {
    fn begin(&mut self, title: &str) {
        self.heading(1, title);
    }

    fn heading(&mut self, level: usize, text: &str) {
        self.out.push_str(&"#".repeat(level.clamp(1, 6)));
        self.out.push(' ');
        self.out.push_str(&inline(text));
        self.out.push('\n');
        self.blank_line();
    }

    fn paragraph(&mut self, text: &str) {
        self.out.push_str(&inline(text));
        self.out.push('\n');
        self.blank_line();
    }

    fn code_line(&mut self, text: &str) {
        self.out.push_str(&code_span(text));
        self.out.push('\n');
        self.blank_line();
    }

    fn bullet_list(&mut self, items: &[String]) {
        for item in items {
            self.out.push_str("- ");
            self.out.push_str(&inline(item));
            self.out.push('\n');
        }
        self.blank_line();
    }

    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) {
        self.out.push_str("| ");
        self.out.push_str(&headers.join(" | "));
        self.out.push_str(" |\n|");
        for _ in headers {
            self.out.push_str(" --- |");
        }
        self.out.push('\n');
        for row in rows {
            let cells: Vec<String> = row.iter().map(|c| table_cell(c)).collect();
            self.out.push_str("| ");
            self.out.push_str(&cells.join(" | "));
            self.out.push_str(" |\n");
        }
        self.blank_line();
    }

    fn end(&mut self) {}

    fn finish(self) -> String {
        let mut out = self.out;
        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }
}

/// Escapes characters that Markdown would otherwise interpret in running text.
fn inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '*' | '`' | '|' | '[' | ']' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps source text in a code span with a fence longer than any backtick run inside.
fn code_span(text: &str) -> String {
    let longest_run = text
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run + 1);
    let pad = if text.starts_with('`') || text.ends_with('`') {
        " "
    } else {
        ""
    };
    format!("{fence}{pad}{text}{pad}{fence}")
}

fn table_cell(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    // paths and code-like cells are kept literal
    if text.starts_with('/') || text.contains(['<', '(', '@', '*', '`', '[', ']']) {
        code_span(text).replace('|', "\\|")
    } else {
        inline(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc_builder::DocumentationBuilder;
    use crate::parser::SourceParser;

    fn render(text: &str) -> String {
        let file = SourceParser::parse_source(text, "Api.java");
        let mut builder = DocumentationBuilder::new();
        builder.add_file(&file);
        MarkdownRenderer.render(&builder.build()).unwrap()
    }

    #[test]
    fn test_markdown_sections() {
        let md = render(
            "package a.b;\n/** The API. */\n@RestController\npublic class Api {\n  private Map<String, Long> counts;\n  @GetMapping(\"/ping\") public String ping() { return \"ok\"; }\n}",
        );
        assert!(md.starts_with("# Project Documentation\n\n## Api.java\n"));
        assert!(md.contains("Package: a.b"));
        assert!(md.contains("### Class Api"));
        assert!(md.contains("`public class Api`"));
        assert!(md.contains("Roles: controller"));
        assert!(md.contains("The API."));
        assert!(md.contains("| counts | `Map<String, Long>` | private |"));
        assert!(md.contains("| GET | `/ping` | Api.ping | Api.java |"));
        assert!(!md.ends_with("\n\n"));
    }

    #[test]
    fn test_wildcard_paths_stay_literal() {
        let md = render(
            "@Controller\nclass Files {\n  @GetMapping(\"/files/**\") void all() {}\n  @GetMapping(\"/a|b\") void odd() {}\n}",
        );
        assert!(md.contains("| GET | `/files/**` | Files.all | Api.java |"));
        assert!(md.contains("| GET | `/a\\|b` | Files.odd | Api.java |"));
        assert!(!md.contains("\\*"));
    }

    #[test]
    fn test_inline_escaping() {
        assert_eq!(inline("a|b *c*"), "a\\|b \\*c\\*");
        assert_eq!(inline("List<T>"), "List&lt;T&gt;");
    }

    #[test]
    fn test_code_span_fences_backticks() {
        assert_eq!(code_span("a`b"), "``a`b``");
        assert_eq!(code_span("plain"), "`plain`");
    }
}
