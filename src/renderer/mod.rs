//! Documentation rendering.
//!
//! One [`DocRenderer`] trait with three implementations. Markdown and HTML share the
//! [`walk`] traversal through the [`DocWriter`] hooks, so both emit sections in exactly the
//! same order (files, components by role, configuration, endpoints); JSON serializes the
//! same [`Documentation`] value directly.
//!
//! # Example
//!
//! ```
//! use spring_insight::doc_builder::DocumentationBuilder;
//! use spring_insight::renderer::{renderer_for, DocFormat};
//!
//! let doc = DocumentationBuilder::new().build();
//! let format: DocFormat = "markdown".parse().unwrap();
//! let text = renderer_for(format).render(&doc).unwrap();
//! assert!(text.starts_with("# Project Documentation"));
//! ```

pub mod html;
pub mod json;
pub mod markdown;

use crate::config::ConfigFile;
use crate::doc_builder::{Documentation, FileDoc, TypeDoc};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Output formats for rendered documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    Markdown,
    Html,
    Json,
}

impl FromStr for DocFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(DocFormat::Markdown),
            "html" => Ok(DocFormat::Html),
            "json" => Ok(DocFormat::Json),
            _ => Err(Error::UnsupportedFormat(value.to_string())),
        }
    }
}

impl fmt::Display for DocFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocFormat::Markdown => write!(f, "markdown"),
            DocFormat::Html => write!(f, "html"),
            DocFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for turning documentation into text in one output format.
pub trait DocRenderer {
    fn render(&self, doc: &Documentation) -> Result<String>;
}

/// Returns the renderer for `format`.
pub fn renderer_for(format: DocFormat) -> Box<dyn DocRenderer> {
    match format {
        DocFormat::Markdown => Box::new(markdown::MarkdownRenderer),
        DocFormat::Html => Box::new(html::HtmlRenderer),
        DocFormat::Json => Box::new(json::JsonRenderer),
    }
}

/// Output hooks called by [`walk`]. Implementations escape text for their format.
pub trait DocWriter {
    fn begin(&mut self, title: &str);
    fn heading(&mut self, level: usize, text: &str);
    fn paragraph(&mut self, text: &str);
    /// Source text such as a declaration or signature
    fn code_line(&mut self, text: &str);
    fn bullet_list(&mut self, items: &[String]);
    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]);
    fn end(&mut self);
    fn finish(self) -> String;
}

/// Single traversal order shared by the text renderers.
pub fn walk<W: DocWriter>(doc: &Documentation, mut out: W) -> String {
    out.begin(&doc.title);

    for file in &doc.files {
        walk_file(file, &mut out);
    }

    if !doc.components.is_empty() {
        out.heading(2, "Components");
        for group in &doc.components {
            out.heading(3, &group.title);
            let rows: Vec<Vec<String>> = group
                .components
                .iter()
                .map(|c| vec![c.name.clone(), c.file.clone(), c.summary.clone()])
                .collect();
            out.table(&["Name", "File", "Summary"], &rows);
        }
    }

    if !doc.configuration.is_empty() {
        out.heading(2, "Configuration");
        for file in &doc.configuration {
            walk_config(file, &mut out);
        }
    }

    out.heading(2, "Endpoints");
    if doc.endpoints.is_empty() {
        out.paragraph("No endpoints found.");
    } else {
        let rows: Vec<Vec<String>> = doc
            .endpoints
            .iter()
            .map(|e| vec![e.method.clone(), e.path.clone(), e.handler.clone(), e.file.clone()])
            .collect();
        out.table(&["Method", "Path", "Handler", "File"], &rows);
    }

    out.end();
    out.finish()
}

fn walk_file<W: DocWriter>(file: &FileDoc, out: &mut W) {
    out.heading(2, &file.path);
    if let Some(package) = &file.package {
        out.paragraph(&format!("Package: {}", package));
    }
    if file.degraded {
        out.paragraph("Warning: this file is malformed; its documentation is best-effort.");
    }
    out.paragraph(&format!(
        "Quality: {} ({:.1}), {} lines, average complexity {:.2}",
        grade_label(file),
        file.quality.score,
        file.quality.lines,
        file.quality.average_complexity
    ));
    if !file.imports.is_empty() {
        out.heading(3, "Imports");
        out.bullet_list(&file.imports);
    }

    for decl in &file.types {
        walk_type(decl, out);
    }
}

fn walk_config<W: DocWriter>(file: &ConfigFile, out: &mut W) {
    out.heading(3, &file.path);
    if let Some(profile) = &file.profile {
        out.paragraph(&format!("Profile: {}", profile));
    }
    if let Some(error) = &file.error {
        out.paragraph(&format!("Warning: could not be read completely: {}", error));
    }
    if !file.properties.is_empty() {
        let rows: Vec<Vec<String>> = file
            .properties
            .iter()
            .map(|p| {
                vec![
                    p.key.clone(),
                    p.value.clone(),
                    p.profile.clone().unwrap_or_default(),
                ]
            })
            .collect();
        out.table(&["Key", "Value", "Profile"], &rows);
    }
    if !file.beans.is_empty() {
        let rows: Vec<Vec<String>> = file
            .beans
            .iter()
            .map(|b| {
                vec![
                    b.id.clone().unwrap_or_default(),
                    b.class.clone().unwrap_or_default(),
                    b.scope.clone().unwrap_or_default(),
                ]
            })
            .collect();
        out.table(&["Bean", "Class", "Scope"], &rows);
    }
}

fn walk_type<W: DocWriter>(decl: &TypeDoc, out: &mut W) {
    out.heading(3, &format!("{} {}", kind_label(&decl.kind), decl.name));
    for annotation in &decl.annotations {
        out.code_line(annotation);
    }
    out.code_line(&decl.declaration());
    if !decl.roles.is_empty() {
        out.paragraph(&format!("Roles: {}", decl.roles.join(", ")));
    }
    if let Some(description) = &decl.description {
        out.paragraph(description);
    }
    if !decl.enum_constants.is_empty() {
        out.heading(4, "Constants");
        out.bullet_list(&decl.enum_constants);
    }

    if !decl.fields.is_empty() {
        out.heading(4, "Fields");
        let rows: Vec<Vec<String>> = decl
            .fields
            .iter()
            .map(|f| {
                vec![
                    f.name.clone(),
                    f.type_name.clone(),
                    join_words(&f.modifiers, &f.annotations),
                    f.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        out.table(&["Name", "Type", "Modifiers", "Description"], &rows);
    }

    if !decl.methods.is_empty() {
        out.heading(4, "Methods");
        let rows: Vec<Vec<String>> = decl
            .methods
            .iter()
            .map(|m| {
                vec![
                    m.name.clone(),
                    m.signature.clone(),
                    join_words(&m.modifiers, &m.annotations),
                    m.complexity.map(|c| c.to_string()).unwrap_or_default(),
                    m.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        out.table(
            &["Name", "Signature", "Modifiers", "Complexity", "Description"],
            &rows,
        );

        for method in decl.methods.iter().filter(|m| has_details(m)) {
            out.heading(5, &method.name);
            let mut items: Vec<String> = method
                .parameters
                .iter()
                .filter_map(|p| {
                    p.description
                        .as_ref()
                        .map(|d| format!("param {}: {}", p.name, d))
                })
                .collect();
            if let Some(returns) = &method.returns {
                items.push(format!("returns: {}", returns));
            }
            for thrown in &method.throws {
                items.push(format!("throws {}", thrown));
            }
            out.bullet_list(&items);
        }
    }
}

fn has_details(method: &crate::doc_builder::MethodDoc) -> bool {
    method.returns.is_some()
        || !method.throws.is_empty()
        || method.parameters.iter().any(|p| p.description.is_some())
}

fn grade_label(file: &FileDoc) -> String {
    format!("{:?}", file.quality.grade)
}

fn join_words(modifiers: &[String], annotations: &[String]) -> String {
    annotations
        .iter()
        .chain(modifiers.iter())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

fn kind_label(keyword: &str) -> String {
    if keyword == "@interface" {
        return "Annotation".to_string();
    }
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("markdown".parse::<DocFormat>().unwrap(), DocFormat::Markdown);
        assert_eq!("MD".parse::<DocFormat>().unwrap(), DocFormat::Markdown);
        assert_eq!("Html".parse::<DocFormat>().unwrap(), DocFormat::Html);
        assert_eq!("json".parse::<DocFormat>().unwrap(), DocFormat::Json);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let err = "pdf".parse::<DocFormat>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref v) if v == "pdf"));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(kind_label("@interface"), "Annotation");
        assert_eq!(kind_label("record"), "Record");
    }
}
