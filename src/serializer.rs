//! Serialization of reports to YAML or JSON, and writing output to files.
//!
//! Every report type in the crate derives `Serialize`, so these helpers are generic.

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes a report to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use spring_insight::analyzer::{analyze_source, AnalysisMode};
/// use spring_insight::serializer::serialize_yaml;
///
/// let report = analyze_source("class A {}", "A.java", AnalysisMode::Structure);
/// let yaml = serialize_yaml(&report).unwrap();
/// assert!(yaml.contains("name: A"));
/// ```
pub fn serialize_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing report to YAML");
    serde_yaml::to_string(value).context("Failed to serialize report to YAML")
}

/// Serializes a report to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing report to JSON");
    serde_json::to_string_pretty(value).context("Failed to serialize report to JSON")
}

/// Writes string content to a file, creating parent directories as needed and overwriting
/// any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
