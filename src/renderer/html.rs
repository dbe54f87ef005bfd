//! Standalone HTML page output.

use super::{walk, DocRenderer, DocWriter};
use crate::doc_builder::Documentation;
use crate::error::Result;
use html_escape::encode_text;

const STYLE: &str = "body{font-family:sans-serif;margin:2em;max-width:70em}\
table{border-collapse:collapse;margin-bottom:1em}\
th,td{border:1px solid #ccc;padding:.3em .6em;text-align:left;vertical-align:top}\
code{background:#f4f4f4;padding:0 .2em}";

pub struct HtmlRenderer;

impl DocRenderer for HtmlRenderer {
    fn render(&self, doc: &Documentation) -> Result<String> {
        Ok(walk(doc, HtmlWriter::default()))
    }
}

#[derive(Default)]
struct HtmlWriter {
    out: String,
}

impl DocWriter for HtmlWriter {
    fn begin(&mut self, title: &str) {
        let title = encode_text(title);
        self.out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        self.out.push_str(&format!("<title>{}</title>\n", title));
        self.out.push_str(&format!("<style>{}</style>\n", STYLE));
        self.out.push_str("</head>\n<body>\n");
        self.out.push_str(&format!("<h1>{}</h1>\n", title));
    }

    fn heading(&mut self, level: usize, text: &str) {
        let level = level.clamp(1, 6);
        self.out
            .push_str(&format!("<h{level}>{}</h{level}>\n", encode_text(text)));
    }

    fn paragraph(&mut self, text: &str) {
        self.out.push_str(&format!("<p>{}</p>\n", encode_text(text)));
    }

    fn code_line(&mut self, text: &str) {
        self.out
            .push_str(&format!("<p><code>{}</code></p>\n", encode_text(text)));
    }

    fn bullet_list(&mut self, items: &[String]) {
        self.out.push_str("<ul>\n");
        for item in items {
            self.out.push_str(&format!("<li>{}</li>\n", encode_text(item)));
        }
        self.out.push_str("</ul>\n");
    }

    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) {
        self.out.push_str("<table>\n<tr>");
        for header in headers {
            self.out.push_str(&format!("<th>{}</th>", encode_text(header)));
        }
        self.out.push_str("</tr>\n");
        for row in rows {
            self.out.push_str("<tr>");
            for cell in row {
                self.out.push_str(&format!("<td>{}</td>", encode_text(cell)));
            }
            self.out.push_str("</tr>\n");
        }
        self.out.push_str("</table>\n");
    }

    fn end(&mut self) {
        self.out.push_str("</body>\n</html>\n");
    }

    fn finish(self) -> String {
        self.out
    }
}
