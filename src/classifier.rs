//! Spring semantics derived from annotation usages.
//!
//! A fixed vocabulary of simple annotation names maps to semantic roles: component stereotypes,
//! endpoint mappings, dependency injection markers, bean factories and request bindings.
//! Endpoint annotations are further parsed into HTTP verb and path pairs. Annotations outside
//! the vocabulary are kept verbatim as [`UnclassifiedAnnotation`]s.
//!
//! # Example
//!
//! ```
//! use spring_insight::{classifier, extractor, lexer};
//!
//! let text = "@RestController @RequestMapping(\"/api\")\nclass C { @GetMapping(\"/ping\") String ping() { return \"ok\"; } }";
//! let model = extractor::extract(text, "C.java", &lexer::scan(text));
//! let classification = classifier::classify(&model);
//! assert_eq!(classification.endpoints[0].path.as_deref(), Some("/api/ping"));
//! ```

use crate::extractor::annotations::{enum_values, string_values};
use crate::model::{AnnotationUsage, MethodDecl, SourceModel, TypeDecl};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple names of annotations counted as Spring markers.
///
/// Shared with the technology detector, which searches Java sources for them.
pub const SPRING_ANNOTATIONS: &[&str] = &[
    "RestController",
    "Controller",
    "Service",
    "Repository",
    "Component",
    "Configuration",
    "SpringBootApplication",
    "EnableAutoConfiguration",
    "Autowired",
    "Value",
    "Bean",
    "Profile",
    "RequestMapping",
    "GetMapping",
    "PostMapping",
    "PutMapping",
    "DeleteMapping",
    "PatchMapping",
    "RequestBody",
    "ResponseBody",
    "PathVariable",
    "RequestParam",
    "RequestHeader",
];

pub fn is_spring_annotation(simple_name: &str) -> bool {
    SPRING_ANNOTATIONS.contains(&simple_name)
}

/// HTTP methods an endpoint mapping can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    /// Parses a verb name as found in `RequestMethod.GET`, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component stereotype of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentRole {
    /// `@Controller` and `@RestController`
    Controller,
    Service,
    Repository,
    Component,
    Configuration,
    /// `@SpringBootApplication`
    Application,
    /// JPA `@Entity`
    Entity,
}

impl ComponentRole {
    pub fn label(&self) -> &'static str {
        match self {
            ComponentRole::Controller => "controller",
            ComponentRole::Service => "service",
            ComponentRole::Repository => "repository",
            ComponentRole::Component => "component",
            ComponentRole::Configuration => "configuration",
            ComponentRole::Application => "application",
            ComponentRole::Entity => "entity",
        }
    }
}

/// Where a request binding takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

/// Semantic role of one annotation name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationRole {
    Component(ComponentRole),
    /// Endpoint mapping; `None` for the generic `@RequestMapping`
    Endpoint(Option<HttpMethod>),
    Injection,
    BeanFactory,
    Binding(ParameterLocation),
    Unclassified,
}

/// Maps an annotation to its role by simple name.
pub fn annotation_role(usage: &AnnotationUsage) -> AnnotationRole {
    match usage.simple_name() {
        "Controller" | "RestController" => AnnotationRole::Component(ComponentRole::Controller),
        "Service" => AnnotationRole::Component(ComponentRole::Service),
        "Repository" => AnnotationRole::Component(ComponentRole::Repository),
        "Component" => AnnotationRole::Component(ComponentRole::Component),
        "Configuration" => AnnotationRole::Component(ComponentRole::Configuration),
        "SpringBootApplication" => AnnotationRole::Component(ComponentRole::Application),
        "Entity" => AnnotationRole::Component(ComponentRole::Entity),
        "RequestMapping" => AnnotationRole::Endpoint(None),
        "GetMapping" => AnnotationRole::Endpoint(Some(HttpMethod::Get)),
        "PostMapping" => AnnotationRole::Endpoint(Some(HttpMethod::Post)),
        "PutMapping" => AnnotationRole::Endpoint(Some(HttpMethod::Put)),
        "DeleteMapping" => AnnotationRole::Endpoint(Some(HttpMethod::Delete)),
        "PatchMapping" => AnnotationRole::Endpoint(Some(HttpMethod::Patch)),
        "Autowired" | "Inject" | "Resource" | "Value" => AnnotationRole::Injection,
        "Bean" => AnnotationRole::BeanFactory,
        "PathVariable" => AnnotationRole::Binding(ParameterLocation::Path),
        "RequestParam" => AnnotationRole::Binding(ParameterLocation::Query),
        "RequestHeader" => AnnotationRole::Binding(ParameterLocation::Header),
        "RequestBody" => AnnotationRole::Binding(ParameterLocation::Body),
        _ => AnnotationRole::Unclassified,
    }
}

/// Everything the classifier derived from one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub types: Vec<TypeClassification>,
    pub endpoints: Vec<Endpoint>,
    pub unclassified: Vec<UnclassifiedAnnotation>,
}

impl Classification {
    /// Roles of the type with the given dotted name
    pub fn roles_of(&self, type_name: &str) -> &[ComponentRole] {
        self.types
            .iter()
            .find(|t| t.name == type_name)
            .map_or(&[][..], |t| t.roles.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeClassification {
    /// Dotted name, e.g. `Outer.Inner`
    pub name: String,
    pub roles: Vec<ComponentRole>,
    /// Literal class-level `@RequestMapping` paths
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub base_paths: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub injections: Vec<Injection>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub beans: Vec<BeanDefinition>,
}

/// One REST operation. `method: None` accepts any verb; `path: None` could not be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub method: Option<HttpMethod>,
    pub path: Option<String>,
    /// Dotted name of the declaring type
    pub type_name: String,
    pub handler: String,
    pub parameters: Vec<EndpointParameter>,
    pub line: usize,
}

impl Endpoint {
    pub fn method_label(&self) -> &'static str {
        self.method.map_or("ANY", |m| m.as_str())
    }

    pub fn path_label(&self) -> &str {
        self.path.as_deref().unwrap_or("(unknown)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointParameter {
    pub name: String,
    pub location: ParameterLocation,
    pub type_name: String,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionKind {
    Field,
    Constructor,
    Method,
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Injection {
    /// Field, parameter or method name receiving the dependency
    pub target: String,
    pub kind: InjectionKind,
    pub annotation: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeanDefinition {
    pub method: String,
    pub type_name: String,
}

/// An annotation outside the vocabulary, kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnclassifiedAnnotation {
    pub name: String,
    pub arguments: String,
    /// `Type`, `Type.member` or `Type.method(param)`
    pub target: String,
}

/// Path values of an endpoint annotation.
#[derive(Debug, Clone, PartialEq)]
enum PathSpec {
    /// No path element given
    Absent,
    Literal(Vec<String>),
    /// Present but not made of string literals
    Unknown,
}

fn path_spec(usage: &AnnotationUsage) -> PathSpec {
    if usage.arguments.is_empty() {
        return PathSpec::Absent;
    }
    if usage.values.is_empty() {
        // arguments exist but could not be split into pairs
        return PathSpec::Unknown;
    }
    match usage.value("value").or_else(|| usage.value("path")) {
        None => PathSpec::Absent,
        Some(raw) => match string_values(raw) {
            Some(paths) if paths.is_empty() => PathSpec::Absent,
            Some(paths) => PathSpec::Literal(paths),
            None => PathSpec::Unknown,
        },
    }
}

/// Verbs of an endpoint annotation; `[None]` when any verb is accepted.
fn verbs(usage: &AnnotationUsage, implied: Option<HttpMethod>) -> Vec<Option<HttpMethod>> {
    if implied.is_some() {
        return vec![implied];
    }
    let parsed: Vec<Option<HttpMethod>> = usage
        .value("method")
        .map(enum_values)
        .unwrap_or_default()
        .iter()
        .filter_map(|name| HttpMethod::parse(name))
        .map(Some)
        .collect();
    if parsed.is_empty() {
        vec![None]
    } else {
        parsed
    }
}

/// Verb and path pairs of an endpoint annotation, fanned out over array values.
///
/// `prefix` is the enclosing class mapping. Returns `None` for annotations that are not
/// endpoint mappings.
pub fn endpoint_mappings(
    usage: &AnnotationUsage,
    prefix: &PathPrefix,
) -> Option<Vec<(Option<HttpMethod>, Option<String>)>> {
    let AnnotationRole::Endpoint(implied) = annotation_role(usage) else {
        return None;
    };

    let paths: Vec<Option<String>> = match (prefix, path_spec(usage)) {
        (PathPrefix::Unknown, _) | (_, PathSpec::Unknown) => vec![None],
        (PathPrefix::None, PathSpec::Absent) => vec![None],
        (PathPrefix::None, PathSpec::Literal(paths)) => {
            paths.iter().map(|p| Some(mapping_path("", p))).collect()
        }
        (PathPrefix::Literal(prefixes), PathSpec::Absent) => {
            prefixes.iter().map(|p| Some(mapping_path(p, ""))).collect()
        }
        (PathPrefix::Literal(prefixes), PathSpec::Literal(paths)) => prefixes
            .iter()
            .flat_map(|prefix| {
                paths
                    .iter()
                    .map(move |path| Some(mapping_path(prefix, path)))
            })
            .collect(),
    };

    let verbs = verbs(usage, implied);
    Some(
        paths
            .iter()
            .flat_map(|path| verbs.iter().map(move |verb| (*verb, path.clone())))
            .collect(),
    )
}

/// Class-level mapping applied to every endpoint of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum PathPrefix {
    None,
    Literal(Vec<String>),
    Unknown,
}

impl PathPrefix {
    fn of(decl: &TypeDecl) -> Self {
        let Some(mapping) = decl.annotation("RequestMapping") else {
            return PathPrefix::None;
        };
        match path_spec(mapping) {
            PathSpec::Absent => PathPrefix::None,
            PathSpec::Literal(paths) => PathPrefix::Literal(paths),
            PathSpec::Unknown => PathPrefix::Unknown,
        }
    }
}

/// Path a handler is registered under, from its class-level and method-level mappings.
///
/// Each non-empty side gets a leading `/`, the class side loses trailing slashes so the
/// join never doubles them, and a method path keeps its own trailing slash. No path on
/// either side maps to `/`.
pub fn mapping_path(class_path: &str, method_path: &str) -> String {
    let class_path = class_path.trim().trim_end_matches('/');
    let method_path = method_path.trim();

    let mut out = String::new();
    for part in [class_path, method_path] {
        if part.is_empty() {
            continue;
        }
        if !part.starts_with('/') {
            out.push('/');
        }
        out.push_str(part);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Classifies every type, member and parameter annotation of `model`.
pub fn classify(model: &SourceModel) -> Classification {
    let mut classification = Classification {
        types: Vec::new(),
        endpoints: Vec::new(),
        unclassified: Vec::new(),
    };

    for (name, decl) in model.all_types() {
        let prefix = PathPrefix::of(decl);
        let mut type_info = TypeClassification {
            name: name.clone(),
            roles: Vec::new(),
            base_paths: match &prefix {
                PathPrefix::Literal(paths) => paths.clone(),
                _ => Vec::new(),
            },
            injections: Vec::new(),
            beans: Vec::new(),
        };

        for usage in &decl.annotations {
            match annotation_role(usage) {
                AnnotationRole::Component(role) if !type_info.roles.contains(&role) => {
                    type_info.roles.push(role)
                }
                AnnotationRole::Unclassified => {
                    classification.unclassified.push(unclassified(usage, name.clone()))
                }
                _ => {}
            }
        }

        for field in &decl.fields {
            for usage in &field.annotations {
                match annotation_role(usage) {
                    AnnotationRole::Injection => type_info.injections.push(Injection {
                        target: field.name.clone(),
                        kind: InjectionKind::Field,
                        annotation: usage.simple_name().to_string(),
                        type_name: field.type_name.clone(),
                    }),
                    AnnotationRole::Unclassified => classification
                        .unclassified
                        .push(unclassified(usage, format!("{}.{}", name, field.name))),
                    _ => {}
                }
            }
        }

        for method in &decl.methods {
            classify_method(&name, method, &prefix, &mut type_info, &mut classification);
        }

        classification.types.push(type_info);
    }

    classification
}

fn classify_method(
    type_name: &str,
    method: &MethodDecl,
    prefix: &PathPrefix,
    type_info: &mut TypeClassification,
    classification: &mut Classification,
) {
    let target = format!("{}.{}", type_name, method.name);

    for usage in &method.annotations {
        if let Some(mappings) = endpoint_mappings(usage, prefix) {
            let parameters = endpoint_parameters(method);
            for (verb, path) in mappings {
                classification.endpoints.push(Endpoint {
                    method: verb,
                    path,
                    type_name: type_name.to_string(),
                    handler: method.name.clone(),
                    parameters: parameters.clone(),
                    line: method.line,
                });
            }
            continue;
        }

        match annotation_role(usage) {
            AnnotationRole::Injection => {
                let kind = if method.is_constructor {
                    InjectionKind::Constructor
                } else {
                    InjectionKind::Method
                };
                for param in &method.parameters {
                    type_info.injections.push(Injection {
                        target: param.name.clone(),
                        kind,
                        annotation: usage.simple_name().to_string(),
                        type_name: param.type_name.clone(),
                    });
                }
            }
            AnnotationRole::BeanFactory => type_info.beans.push(BeanDefinition {
                method: method.name.clone(),
                type_name: method.return_type.clone().unwrap_or_default(),
            }),
            AnnotationRole::Unclassified => classification
                .unclassified
                .push(unclassified(usage, target.clone())),
            _ => {}
        }
    }

    for param in &method.parameters {
        for usage in &param.annotations {
            match annotation_role(usage) {
                AnnotationRole::Injection => type_info.injections.push(Injection {
                    target: param.name.clone(),
                    kind: InjectionKind::Parameter,
                    annotation: usage.simple_name().to_string(),
                    type_name: param.type_name.clone(),
                }),
                AnnotationRole::Unclassified => classification
                    .unclassified
                    .push(unclassified(usage, format!("{}({})", target, param.name))),
                _ => {}
            }
        }
    }
}

/// Request bindings of a handler's parameters.
fn endpoint_parameters(method: &MethodDecl) -> Vec<EndpointParameter> {
    let mut out = Vec::new();
    for param in &method.parameters {
        for usage in &param.annotations {
            let AnnotationRole::Binding(location) = annotation_role(usage) else {
                continue;
            };
            let name = usage
                .value("value")
                .or_else(|| usage.value("name"))
                .and_then(string_values)
                .and_then(|names| names.into_iter().next())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| param.name.clone());
            let required = usage.value("required").map_or(true, |v| v.trim() != "false")
                && usage.value("defaultValue").is_none();
            out.push(EndpointParameter {
                name,
                location,
                type_name: param.type_name.clone(),
                required,
            });
        }
    }
    out
}

fn unclassified(usage: &AnnotationUsage, target: String) -> UnclassifiedAnnotation {
    UnclassifiedAnnotation {
        name: usage.name.clone(),
        arguments: usage.arguments.clone(),
        target,
    }
}
