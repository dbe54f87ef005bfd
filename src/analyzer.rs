//! Host-facing entry points.
//!
//! Every call here is independent: the inputs are plain text or already-parsed files, nothing
//! is cached between calls, and nothing touches the file system.

use crate::classifier::{self, Classification};
use crate::config::{self, ConfigFile};
use crate::detector::{TechnologyDetector, TechnologyReport};
use crate::doc_builder::DocumentationBuilder;
use crate::error::{Error, Result};
use crate::javadoc::{self, CommentReport};
use crate::metrics::{self, ProjectQuality, QualityMetrics};
use crate::model::{Import, SourceModel};
use crate::parser::{ParsedFile, SourceParser};
use crate::renderer::{renderer_for, DocFormat};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// What `analyze_source` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Source model and Spring classification
    Structure,
    /// Structure plus quality metrics
    Quality,
    /// Imports only, grouped by origin
    Dependencies,
}

impl FromStr for AnalysisMode {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "structure" => Ok(AnalysisMode::Structure),
            "quality" => Ok(AnalysisMode::Quality),
            "dependencies" => Ok(AnalysisMode::Dependencies),
            _ => Err(Error::UnsupportedMode(value.to_string())),
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisMode::Structure => "structure",
            AnalysisMode::Quality => "quality",
            AnalysisMode::Dependencies => "dependencies",
        };
        f.write_str(name)
    }
}

/// Result of one `analyze_source` call. Sections not requested by the mode are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub file_path: String,
    pub mode: AnalysisMode,
    /// Set when the input was malformed and the report is best-effort
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<SourceModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<QualityMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyReport>,
}

/// Result of analyzing several files together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub mode: AnalysisMode,
    pub files: Vec<AnalysisReport>,
    /// Aggregate over all files; quality mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<ProjectQuality>,
}

/// Imports of one file grouped by where they come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub imports: Vec<Import>,
    /// `org.springframework.*`
    pub spring: Vec<String>,
    /// `java.*`, `javax.*`, `jdk.*`
    pub java_platform: Vec<String>,
    /// Same top two package segments as the file itself
    pub internal: Vec<String>,
    pub external: Vec<String>,
}

impl DependencyReport {
    fn of(model: &SourceModel) -> Self {
        let own_prefix = model.package.as_deref().map(|p| {
            p.split('.').take(2).collect::<Vec<_>>().join(".")
        });

        let mut report = DependencyReport {
            imports: model.imports.clone(),
            spring: Vec::new(),
            java_platform: Vec::new(),
            internal: Vec::new(),
            external: Vec::new(),
        };
        for import in &model.imports {
            let name = import.name.clone();
            let is_internal = own_prefix.as_deref().map_or(false, |prefix| {
                name == prefix || name.starts_with(&format!("{}.", prefix))
            });
            if name.starts_with("org.springframework.") {
                report.spring.push(name);
            } else if ["java.", "javax.", "jdk."].iter().any(|p| name.starts_with(p)) {
                report.java_platform.push(name);
            } else if is_internal {
                report.internal.push(name);
            } else {
                report.external.push(name);
            }
        }
        report
    }
}

/// Analyzes one source text. `file_path` is recorded in the report, never opened.
///
/// Malformed input never fails: the report carries `degraded: true` and the model's
/// diagnostics.
///
/// # Example
///
/// ```
/// use spring_insight::analyzer::{analyze_source, AnalysisMode};
///
/// let report = analyze_source("package a; class B {}", "B.java", AnalysisMode::Structure);
/// assert_eq!(report.model.unwrap().types[0].name, "B");
/// ```
pub fn analyze_source(text: &str, file_path: &str, mode: AnalysisMode) -> AnalysisReport {
    debug!("Analyzing {} in {} mode", file_path, mode);
    let parsed = SourceParser::parse_source(text, file_path);
    analyze_parsed(&parsed, mode)
}

/// Same as [`analyze_source`] for a file that was already read and parsed.
pub fn analyze_parsed(parsed: &ParsedFile, mode: AnalysisMode) -> AnalysisReport {
    let model = &parsed.model;
    let mut report = AnalysisReport {
        file_path: model.file_path.clone(),
        mode,
        degraded: model.degraded,
        model: None,
        classification: None,
        metrics: None,
        dependencies: None,
    };

    match mode {
        AnalysisMode::Dependencies => {
            report.dependencies = Some(DependencyReport::of(model));
        }
        AnalysisMode::Structure | AnalysisMode::Quality => {
            report.classification = Some(classifier::classify(model));
            if mode == AnalysisMode::Quality {
                report.metrics = Some(metrics::compute(model, &parsed.lexed, &parsed.source));
            }
            report.model = Some(model.clone());
        }
    }
    report
}

/// Analyzes every file and, in quality mode, aggregates their metrics.
pub fn analyze_project(files: &[ParsedFile], mode: AnalysisMode) -> ProjectReport {
    let reports: Vec<AnalysisReport> = files.iter().map(|p| analyze_parsed(p, mode)).collect();
    let quality = (mode == AnalysisMode::Quality).then(|| {
        ProjectQuality::aggregate(
            reports
                .iter()
                .filter_map(|r| r.metrics.as_ref().map(|m| (r.file_path.as_str(), m))),
        )
    });
    ProjectReport {
        mode,
        files: reports,
        quality,
    }
}

/// Renders documentation for the given files with the default title.
///
/// # Errors
///
/// Only fails when the renderer cannot serialize its output.
pub fn render_docs(files: &[ParsedFile], format: DocFormat) -> Result<String> {
    debug!("Rendering {} file(s) as {}", files.len(), format);
    let mut builder = DocumentationBuilder::new();
    for file in files {
        builder.add_file(file);
    }
    renderer_for(format).render(&builder.build())
}

/// Detects build system and frameworks from a name-to-content listing.
pub fn detect_technologies(files: &BTreeMap<String, String>) -> TechnologyReport {
    TechnologyDetector::detect(files)
}

/// Reads the Spring configuration files of a name-to-content listing.
pub fn analyze_configuration(files: &BTreeMap<String, String>) -> Vec<ConfigFile> {
    config::analyze_listing(files)
}

/// Lists every comment in `text`, with javadoc tags parsed.
pub fn extract_comments(text: &str) -> CommentReport {
    javadoc::extract_comments(text, true)
}
