//! Documentation view model.
//!
//! [`DocumentationBuilder`] turns parsed files into a [`Documentation`] value that every
//! renderer walks in the same order: files in input order, types in pre-order (nested types
//! right after their parent, with dotted names), members in declaration order, then the
//! Spring components grouped by role, the configuration files, and one consolidated
//! endpoint table at the end.

use crate::classifier::{self, Classification, ComponentRole};
use crate::config::ConfigFile;
use crate::metrics;
use crate::model::{DocComment, FieldDecl, MethodDecl, TypeDecl};
use crate::parser::ParsedFile;
use log::debug;
use serde::{Deserialize, Serialize};

/// Complete documentation of a set of files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Documentation {
    pub title: String,
    pub files: Vec<FileDoc>,
    /// Non-empty role groups in [`ROLE_SECTIONS`] order
    pub components: Vec<ComponentGroup>,
    pub configuration: Vec<ConfigFile>,
    pub endpoints: Vec<EndpointDoc>,
}

/// Section titles of the role-grouped summary, in output order.
pub const ROLE_SECTIONS: &[(ComponentRole, &str)] = &[
    (ComponentRole::Application, "Applications"),
    (ComponentRole::Controller, "Controllers"),
    (ComponentRole::Service, "Services"),
    (ComponentRole::Repository, "Repositories"),
    (ComponentRole::Entity, "Entities"),
    (ComponentRole::Configuration, "Configuration Classes"),
    (ComponentRole::Component, "Components"),
];

/// Every type of one component role, across all files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentGroup {
    pub role: ComponentRole,
    pub title: String,
    pub components: Vec<ComponentDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDoc {
    /// Dotted type name
    pub name: String,
    pub file: String,
    /// Role-specific one-liner: endpoints of a controller, fields of an entity, ...
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDoc {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub imports: Vec<String>,
    /// Set when the file was malformed and its documentation is best-effort
    pub degraded: bool,
    pub quality: QualitySummary,
    pub types: Vec<TypeDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySummary {
    pub lines: usize,
    pub score: f64,
    pub grade: metrics::Grade,
    pub average_complexity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDoc {
    /// Dotted name, e.g. `Outer.Inner`
    pub name: String,
    pub kind: String,
    pub modifiers: Vec<String>,
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_parameters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub annotations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub enum_constants: Vec<String>,
    pub fields: Vec<FieldDoc>,
    pub methods: Vec<MethodDoc>,
}

impl TypeDoc {
    /// `public class Foo<T> extends Bar implements Baz`
    pub fn declaration(&self) -> String {
        let mut out = String::new();
        for modifier in &self.modifiers {
            out.push_str(modifier);
            out.push(' ');
        }
        out.push_str(&self.kind);
        out.push(' ');
        out.push_str(self.name.rsplit('.').next().unwrap_or(&self.name));
        if let Some(params) = &self.type_parameters {
            out.push_str(params);
        }
        if let Some(superclass) = &self.superclass {
            out.push_str(" extends ");
            out.push_str(superclass);
        }
        if !self.interfaces.is_empty() {
            out.push_str(if self.kind == "interface" {
                " extends "
            } else {
                " implements "
            });
            out.push_str(&self.interfaces.join(", "));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    pub type_name: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDoc {
    pub name: String,
    pub signature: String,
    pub modifiers: Vec<String>,
    pub annotations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Vec<ParamDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub throws: Vec<String>,
    /// `None` for methods without a body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDoc {
    pub name: String,
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One row of the consolidated endpoint table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDoc {
    /// Verb, or `ANY` for mappings that accept every verb
    pub method: String,
    /// Path, or `(unknown)` when it could not be read
    pub path: String,
    /// `Type.method`
    pub handler: String,
    pub file: String,
}

/// Documentation builder
pub struct DocumentationBuilder {
    title: String,
    files: Vec<FileDoc>,
    components: Vec<(ComponentRole, ComponentDoc)>,
    configuration: Vec<ConfigFile>,
    endpoints: Vec<EndpointDoc>,
}

impl DocumentationBuilder {
    pub fn new() -> Self {
        debug!("Initializing DocumentationBuilder");
        Self {
            title: "Project Documentation".to_string(),
            files: Vec::new(),
            components: Vec::new(),
            configuration: Vec::new(),
            endpoints: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Adds one parsed file, classifying it and computing its metrics.
    pub fn add_file(&mut self, file: &ParsedFile) {
        let model = &file.model;
        debug!("Documenting {}", model.file_path);

        let classification = classifier::classify(model);
        let quality = metrics::compute(model, &file.lexed, &file.source);

        let types = model
            .all_types()
            .into_iter()
            .map(|(name, decl)| type_doc(name, decl, &classification, &quality))
            .collect();

        for (name, decl) in model.all_types() {
            for role in classification.roles_of(&name) {
                let summary = component_summary(*role, &name, decl, &classification);
                self.components.push((
                    *role,
                    ComponentDoc {
                        name: name.clone(),
                        file: model.file_path.clone(),
                        summary,
                    },
                ));
            }
        }

        for endpoint in &classification.endpoints {
            self.endpoints.push(EndpointDoc {
                method: endpoint.method_label().to_string(),
                path: endpoint.path_label().to_string(),
                handler: format!("{}.{}", endpoint.type_name, endpoint.handler),
                file: model.file_path.clone(),
            });
        }

        self.files.push(FileDoc {
            path: model.file_path.clone(),
            package: model.package.clone(),
            imports: model
                .imports
                .iter()
                .map(|i| {
                    let mut name = i.name.clone();
                    if i.is_wildcard {
                        name.push_str(".*");
                    }
                    if i.is_static {
                        name.insert_str(0, "static ");
                    }
                    name
                })
                .collect(),
            degraded: model.degraded,
            quality: QualitySummary {
                lines: quality.line_count,
                score: quality.score,
                grade: quality.grade,
                average_complexity: quality.average_complexity,
            },
            types,
        });
    }

    /// Adds an analyzed configuration file to the configuration section.
    pub fn add_config(&mut self, file: ConfigFile) {
        debug!("Documenting configuration {}", file.path);
        self.configuration.push(file);
    }

    pub fn build(self) -> Documentation {
        debug!(
            "Building documentation for {} file(s), {} endpoint(s)",
            self.files.len(),
            self.endpoints.len()
        );
        let components = ROLE_SECTIONS
            .iter()
            .filter_map(|(role, title)| {
                let members: Vec<ComponentDoc> = self
                    .components
                    .iter()
                    .filter(|(r, _)| r == role)
                    .map(|(_, c)| c.clone())
                    .collect();
                (!members.is_empty()).then(|| ComponentGroup {
                    role: *role,
                    title: title.to_string(),
                    components: members,
                })
            })
            .collect();

        Documentation {
            title: self.title,
            files: self.files,
            components,
            configuration: self.configuration,
            endpoints: self.endpoints,
        }
    }
}

impl Default for DocumentationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn component_summary(
    role: ComponentRole,
    name: &str,
    decl: &TypeDecl,
    classification: &Classification,
) -> String {
    let plural = |n: usize, word: &str| format!("{} {}{}", n, word, if n == 1 { "" } else { "s" });
    let typed = classification.types.iter().find(|t| t.name == name);
    match role {
        ComponentRole::Controller => {
            let endpoints = classification
                .endpoints
                .iter()
                .filter(|e| e.type_name == name)
                .count();
            match typed.map(|t| t.base_paths.join(", ")).filter(|p| !p.is_empty()) {
                Some(base) => format!("{} under {}", plural(endpoints, "endpoint"), base),
                None => plural(endpoints, "endpoint"),
            }
        }
        ComponentRole::Repository if decl.superclass.is_some() || !decl.interfaces.is_empty() => {
            let parents: Vec<&str> = decl
                .superclass
                .iter()
                .chain(&decl.interfaces)
                .map(String::as_str)
                .collect();
            format!("extends {}", parents.join(", "))
        }
        ComponentRole::Entity => plural(decl.fields.len(), "field"),
        ComponentRole::Configuration => plural(typed.map_or(0, |t| t.beans.len()), "bean"),
        _ => {
            let public = decl
                .methods
                .iter()
                .filter(|m| !m.is_constructor && m.modifiers.iter().any(|x| x == "public"))
                .count();
            plural(public, "public method")
        }
    }
}

fn type_doc(
    name: String,
    decl: &TypeDecl,
    classification: &Classification,
    quality: &metrics::QualityMetrics,
) -> TypeDoc {
    let roles = classification
        .roles_of(&name)
        .iter()
        .map(|r| r.label().to_string())
        .collect();
    let methods = decl
        .methods
        .iter()
        .map(|m| {
            let complexity = quality
                .methods
                .iter()
                .find(|c| c.type_name == name && c.method == m.name && c.line == m.line)
                .map(|c| c.complexity);
            method_doc(m, complexity)
        })
        .collect();

    TypeDoc {
        kind: decl.kind.keyword().to_string(),
        modifiers: decl.modifiers.clone(),
        roles,
        type_parameters: decl.type_parameters.clone(),
        superclass: decl.superclass.clone(),
        interfaces: decl.interfaces.clone(),
        annotations: decl.annotations.iter().map(|a| a.display()).collect(),
        description: description(decl.doc.as_ref()),
        enum_constants: decl.enum_constants.clone(),
        fields: decl.fields.iter().map(field_doc).collect(),
        methods,
        name,
    }
}

fn field_doc(field: &FieldDecl) -> FieldDoc {
    FieldDoc {
        name: field.name.clone(),
        type_name: field.type_name.clone(),
        modifiers: field.modifiers.clone(),
        annotations: field.annotations.iter().map(|a| a.display()).collect(),
        description: description(field.doc.as_ref()),
    }
}

fn method_doc(method: &MethodDecl, complexity: Option<u32>) -> MethodDoc {
    let doc = method.doc.as_ref();
    let parameters = method
        .parameters
        .iter()
        .map(|p| ParamDoc {
            name: p.name.clone(),
            type_name: p.type_name.clone(),
            description: doc
                .and_then(|d| d.params.iter().find(|t| t.name == p.name))
                .map(|t| t.description.clone())
                .filter(|d| !d.is_empty()),
        })
        .collect();

    MethodDoc {
        name: method.name.clone(),
        signature: method.signature(),
        modifiers: method.modifiers.clone(),
        annotations: method.annotations.iter().map(|a| a.display()).collect(),
        description: description(doc),
        parameters,
        returns: doc.and_then(|d| d.returns.clone()).filter(|r| !r.is_empty()),
        throws: method.throws.clone(),
        complexity,
    }
}

fn description(doc: Option<&DocComment>) -> Option<String> {
    doc.map(|d| d.text.clone()).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SourceParser;
    use pretty_assertions::assert_eq;

    fn build(text: &str) -> Documentation {
        let file = SourceParser::parse_source(text, "src/Users.java");
        let mut builder = DocumentationBuilder::new().with_title("Users");
        builder.add_file(&file);
        builder.build()
    }

    #[test]
    fn test_builds_types_in_pre_order() {
        let doc = build(
            "package a;\n/** Users. */\n@RestController\npublic class Users extends Base implements Api {\n  static class Page {}\n  /** Finds.\n   * @param id the id\n   * @return the user */\n  @GetMapping(\"/u/{id}\") public User find(Long id) { return null; }\n}",
        );
        assert_eq!(doc.title, "Users");
        let file = &doc.files[0];
        assert_eq!(file.package.as_deref(), Some("a"));
        let names: Vec<_> = file.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Users", "Users.Page"]);

        let users = &file.types[0];
        assert_eq!(users.roles, vec!["controller"]);
        assert_eq!(users.description.as_deref(), Some("Users."));
        assert_eq!(
            users.declaration(),
            "public class Users extends Base implements Api"
        );
        let find = &users.methods[0];
        assert_eq!(find.signature, "User find(Long id)");
        assert_eq!(find.parameters[0].description.as_deref(), Some("the id"));
        assert_eq!(find.returns.as_deref(), Some("the user"));
        assert_eq!(find.complexity, Some(1));
    }

    #[test]
    fn test_consolidated_endpoint_table() {
        let doc = build(
            "@RequestMapping(\"/api\")\nclass Users {\n  @GetMapping(\"/users\") void list() {}\n  @RequestMapping(\"/raw\") void raw() {}\n  @PostMapping(BASE) void create() {}\n}",
        );
        let rows: Vec<_> = doc
            .endpoints
            .iter()
            .map(|e| (e.method.as_str(), e.path.as_str(), e.handler.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("GET", "/api/users", "Users.list"),
                ("ANY", "/api/raw", "Users.raw"),
                ("POST", "(unknown)", "Users.create"),
            ]
        );
        assert_eq!(doc.endpoints[0].file, "src/Users.java");
    }

    #[test]
    fn test_static_and_wildcard_imports_are_spelled_out() {
        let doc = build("import static a.B.c;\nimport java.util.*;\nclass X {}");
        assert_eq!(doc.files[0].imports, vec!["static a.B.c", "java.util.*"]);
    }

    #[test]
    fn test_components_grouped_by_role() {
        let users = SourceParser::parse_source(
            "@RestController\n@RequestMapping(\"/users\")\nclass UserApi {\n  @GetMapping void list() {}\n  @PostMapping void add() {}\n}\n@Service\nclass UserService {\n  public void a() {}\n  void b() {}\n}",
            "web/Users.java",
        );
        let data = SourceParser::parse_source(
            "@Repository\ninterface UserRepo extends JpaRepository<User, Long> {}\n@Entity\nclass User { Long id; String name; }\n@Configuration\nclass Beans { @Bean Clock clock() { return null; } }",
            "data/Data.java",
        );
        let mut builder = DocumentationBuilder::new();
        builder.add_file(&users);
        builder.add_file(&data);
        let doc = builder.build();

        let groups: Vec<(&str, Vec<(&str, &str)>)> = doc
            .components
            .iter()
            .map(|g| {
                (
                    g.title.as_str(),
                    g.components
                        .iter()
                        .map(|c| (c.name.as_str(), c.summary.as_str()))
                        .collect(),
                )
            })
            .collect();
        assert_eq!(
            groups,
            vec![
                ("Controllers", vec![("UserApi", "2 endpoints under /users")]),
                ("Services", vec![("UserService", "1 public method")]),
                ("Repositories", vec![("UserRepo", "extends JpaRepository<User, Long>")]),
                ("Entities", vec![("User", "2 fields")]),
                ("Configuration Classes", vec![("Beans", "1 bean")]),
            ]
        );
        assert_eq!(doc.components[3].components[0].file, "data/Data.java");
    }

    #[test]
    fn test_configuration_section_keeps_added_order() {
        use crate::config::analyze_config;

        let mut builder = DocumentationBuilder::new();
        builder.add_config(analyze_config("application.yml", "server:\n  port: 8080").unwrap());
        builder.add_config(analyze_config("application-dev.properties", "debug=true").unwrap());
        let doc = builder.build();

        assert_eq!(doc.configuration.len(), 2);
        assert_eq!(doc.configuration[0].get("server.port"), Some("8080"));
        assert_eq!(doc.configuration[1].profile.as_deref(), Some("dev"));
        assert!(doc.components.is_empty());
    }
}
