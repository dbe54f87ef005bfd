//! Spring Insight - structure, Spring semantics and quality metrics from Java source text.
//!
//! The analysis is heuristic: no grammar and no compiler, just a lexical state machine and
//! keyword/depth rules over its output. Malformed input never fails; it produces a
//! best-effort model flagged as degraded.
//!
//! # Architecture
//!
//! 1. [`lexer`] - Classifies every byte as code, comment or literal and builds a code view
//! 2. [`extractor`] - Recovers package, imports, types and members into a [`model::SourceModel`]
//! 3. [`javadoc`] - Parses doc comments and lists every comment of a file
//! 4. [`classifier`] - Maps Spring annotations to component roles, endpoints and injections
//! 5. [`metrics`] - Line counts, approximate cyclomatic complexity and a quality score
//! 6. [`doc_builder`] and [`renderer`] - Markdown, HTML and JSON documentation
//! 7. [`detector`] - Build system and frameworks from Maven/Gradle manifests
//! 8. [`config`] - Spring properties, YAML and XML bean definitions
//! 9. [`analyzer`] - The host-facing entry points
//!
//! [`scanner`], [`parser`] and [`serializer`] are the file-system and output adapters used
//! by the [`cli`].
//!
//! # Example Usage
//!
//! ```
//! use spring_insight::{analyze_source, AnalysisMode};
//!
//! let text = "package a.b;\n@RestController\npublic class C {\n  @GetMapping(\"/ping\") public String ping() { return \"ok\"; }\n}";
//! let report = analyze_source(text, "C.java", AnalysisMode::Structure);
//!
//! let classification = report.classification.unwrap();
//! assert_eq!(classification.endpoints[0].path.as_deref(), Some("/ping"));
//! ```

pub mod analyzer;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod detector;
pub mod doc_builder;
pub mod error;
pub mod extractor;
pub mod javadoc;
pub mod lexer;
pub mod metrics;
pub mod model;
pub mod parser;
pub mod renderer;
pub mod scanner;
pub mod serializer;

pub use analyzer::{
    analyze_configuration, analyze_project, analyze_source, detect_technologies,
    extract_comments, render_docs, AnalysisMode, AnalysisReport, ProjectReport,
};
pub use renderer::DocFormat;
