//! Source Model: the structural representation recovered from one Java file.
//!
//! Every value here is produced by a single analysis call and never mutated afterwards.
//! Nested types are an owned tree: a parent owns its children and lookups of the enclosing
//! type are traversals, so no node can become its own ancestor.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into the analyzed source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Root of one file's analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceModel {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
    pub line_count: usize,
    /// Set when the input was malformed and the model is best-effort
    pub degraded: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// A single `import` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Qualified name without the trailing `.*` for wildcard imports
    pub name: String,
    pub is_static: bool,
    pub is_wildcard: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

impl TypeKind {
    /// Java keyword that introduces the declaration
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Record => "record",
            TypeKind::Annotation => "@interface",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub kind: TypeKind,
    pub name: String,
    pub modifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_parameters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub annotations: Vec<AnnotationUsage>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub enum_constants: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub record_components: Vec<Parameter>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub nested: Vec<TypeDecl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocComment>,
    pub span: TextSpan,
    pub line: usize,
}

impl TypeDecl {
    pub fn new(kind: TypeKind, name: String, span: TextSpan, line: usize) -> Self {
        Self {
            kind,
            name,
            modifiers: Vec::new(),
            type_parameters: None,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            enum_constants: Vec::new(),
            record_components: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            doc: None,
            span,
            line,
        }
    }

    pub fn annotation(&self, simple_name: &str) -> Option<&AnnotationUsage> {
        self.annotations
            .iter()
            .find(|a| a.simple_name() == simple_name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of types in this subtree, including `self`
    pub fn type_count(&self) -> usize {
        1 + self.nested.iter().map(TypeDecl::type_count).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Vec<String>,
    /// `None` for constructors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_parameters: Option<String>,
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub throws: Vec<String>,
    pub annotations: Vec<AnnotationUsage>,
    /// Braces included; `None` for abstract and interface methods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<TextSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocComment>,
    pub is_constructor: bool,
    pub line: usize,
}

impl MethodDecl {
    pub fn annotation(&self, simple_name: &str) -> Option<&AnnotationUsage> {
        self.annotations
            .iter()
            .find(|a| a.simple_name() == simple_name)
    }

    /// `ReturnType name(Type a, Type b)` as it would appear in a declaration
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.type_name, p.name))
            .collect::<Vec<_>>()
            .join(", ");
        match &self.return_type {
            Some(ret) => format!("{} {}({})", ret, self.name, params),
            None => format!("{}({})", self.name, params),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub annotations: Vec<AnnotationUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<AnnotationUsage>,
    pub has_initializer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocComment>,
    pub line: usize,
}

/// One `@Name(...)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationUsage {
    pub name: String,
    /// Text between the parentheses, trimmed; empty when there are none
    pub arguments: String,
    /// Parsed `name=value` pairs; a lone positional value is stored as `value`
    pub values: Vec<AnnotationValue>,
}

impl AnnotationUsage {
    /// Last segment of a possibly qualified name
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == key)
            .map(|v| v.value.as_str())
    }

    /// `@Name(args)` as written
    pub fn display(&self) -> String {
        if self.arguments.is_empty() {
            format!("@{}", self.name)
        } else {
            format!("@{}({})", self.name, self.arguments)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationValue {
    pub name: String,
    pub value: String,
}

/// A comment attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocComment {
    pub is_javadoc: bool,
    /// Comment markers and leading `*` stripped, block tags removed
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub params: Vec<DocTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub throws: Vec<DocTag>,
    pub span: TextSpan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocTag {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    UnterminatedString,
    UnterminatedChar,
    UnterminatedTextBlock,
    UnterminatedComment,
    UnbalancedBraces,
}

/// Record of a malformation that forced best-effort analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub offset: usize,
    pub line: usize,
    pub message: String,
}

impl SourceModel {
    /// Total number of recognized type declarations, nested ones included
    pub fn type_count(&self) -> usize {
        self.types.iter().map(TypeDecl::type_count).sum()
    }

    /// Pre-order walk of every type, paired with its dotted name.
    pub fn all_types(&self) -> Vec<(String, &TypeDecl)> {
        fn walk<'a>(prefix: &str, decl: &'a TypeDecl, out: &mut Vec<(String, &'a TypeDecl)>) {
            let name = if prefix.is_empty() {
                decl.name.clone()
            } else {
                format!("{}.{}", prefix, decl.name)
            };
            out.push((name.clone(), decl));
            for nested in &decl.nested {
                walk(&name, nested, out);
            }
        }

        let mut out = Vec::new();
        for decl in &self.types {
            walk("", decl, &mut out);
        }
        out
    }

    /// Finds a type by simple or dotted name.
    pub fn find_type(&self, name: &str) -> Option<&TypeDecl> {
        self.all_types()
            .into_iter()
            .find(|(qualified, decl)| qualified == name || decl.name == name)
            .map(|(_, decl)| decl)
    }

    /// The type that directly encloses `name`, if `name` is nested.
    pub fn enclosing_type(&self, name: &str) -> Option<&TypeDecl> {
        fn search<'a>(parent: &'a TypeDecl, name: &str) -> Option<&'a TypeDecl> {
            if parent.nested.iter().any(|n| n.name == name) {
                return Some(parent);
            }
            parent.nested.iter().find_map(|n| search(n, name))
        }
        self.types.iter().find_map(|t| search(t, name))
    }

    /// Dotted names of every type in declaration order
    pub fn qualified_types(&self) -> Vec<String> {
        self.all_types().into_iter().map(|(name, _)| name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str) -> TypeDecl {
        TypeDecl::new(TypeKind::Class, name.to_string(), TextSpan::new(0, 0), 1)
    }

    fn model_with(types: Vec<TypeDecl>) -> SourceModel {
        SourceModel {
            file_path: "A.java".to_string(),
            package: None,
            imports: Vec::new(),
            types,
            line_count: 0,
            degraded: false,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_type_count_includes_nested() {
        let mut outer = decl("Outer");
        let mut inner = decl("Inner");
        inner.nested.push(decl("Deepest"));
        outer.nested.push(inner);
        let model = model_with(vec![outer, decl("Other")]);

        assert_eq!(model.type_count(), 4);
        assert_eq!(
            model.qualified_types(),
            vec!["Outer", "Outer.Inner", "Outer.Inner.Deepest", "Other"]
        );
    }

    #[test]
    fn test_enclosing_type_is_a_traversal() {
        let mut outer = decl("Outer");
        let mut inner = decl("Inner");
        inner.nested.push(decl("Deepest"));
        outer.nested.push(inner);
        let model = model_with(vec![outer]);

        assert_eq!(model.enclosing_type("Deepest").map(|t| t.name.as_str()), Some("Inner"));
        assert_eq!(model.enclosing_type("Inner").map(|t| t.name.as_str()), Some("Outer"));
        assert!(model.enclosing_type("Outer").is_none());
        assert!(model.find_type("Outer.Inner.Deepest").is_some());
    }

    #[test]
    fn test_annotation_simple_name() {
        let usage = AnnotationUsage {
            name: "org.springframework.stereotype.Service".to_string(),
            arguments: String::new(),
            values: Vec::new(),
        };
        assert_eq!(usage.simple_name(), "Service");
        assert_eq!(usage.display(), "@org.springframework.stereotype.Service");
    }

    #[test]
    fn test_span_contains() {
        let span = TextSpan::new(3, 6);
        assert!(span.contains(3));
        assert!(!span.contains(6));
        assert_eq!(span.len(), 3);
    }
}
