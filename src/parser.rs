use crate::extractor;
use crate::lexer::{self, LexedSource};
use crate::model::SourceModel;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Reads Java source files and runs the lexer and structural extractor over them.
///
/// Parsing never fails on malformed Java: the resulting model is flagged as degraded
/// instead. Only I/O problems are errors.
///
/// # Example
///
/// ```no_run
/// use spring_insight::parser::SourceParser;
/// use std::path::Path;
///
/// let parsed = SourceParser::parse_file(Path::new("src/main/java/App.java")).unwrap();
/// println!("Found {} types", parsed.model.type_count());
/// ```
pub struct SourceParser;

/// A Java file together with everything recovered from it.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The original text
    pub source: String,
    /// Span classification and code view
    pub lexed: LexedSource,
    /// The structural model
    pub model: SourceModel,
}

impl SourceParser {
    /// Analyzes in-memory source text. `file_path` is only recorded, never opened.
    pub fn parse_source(text: &str, file_path: &str) -> ParsedFile {
        let lexed = lexer::scan(text);
        let model = extractor::extract(text, file_path, &lexed);
        if model.degraded {
            warn!(
                "{} is malformed ({} diagnostic(s)); analysis is best-effort",
                file_path,
                model.diagnostics.len()
            );
        }
        ParsedFile {
            path: PathBuf::from(file_path),
            source: text.to_string(),
            lexed,
            model,
        }
    }

    /// Reads and analyzes a single Java source file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid UTF-8.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let parsed = Self::parse_source(&content, &path.to_string_lossy());
        debug!("Successfully parsed file: {}", path.display());
        Ok(parsed)
    }

    /// Parses multiple files, continuing past the ones that cannot be read.
    ///
    /// Returns one result per input path, in order.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", paths.len());

        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        let degraded_count = results
            .iter()
            .filter(|r| r.as_ref().map_or(false, |p| p.model.degraded))
            .count();
        debug!(
            "Parsing complete: {} succeeded ({} degraded), {} failed",
            success_count,
            degraded_count,
            results.len() - success_count
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    #[test]
    fn test_parse_valid_java_file() {
        let temp_dir = TempDir::new().unwrap();
        let code = r#"
            package com.example;

            import java.util.List;

            public class User {
                private Long id;
                public Long getId() { return id; }
            }
        "#;

        let file_path = create_temp_file(&temp_dir, "User.java", code);
        let parsed = SourceParser::parse_file(&file_path).unwrap();

        assert_eq!(parsed.path, file_path);
        assert_eq!(parsed.model.package.as_deref(), Some("com.example"));
        assert_eq!(parsed.model.types[0].name, "User");
        assert!(!parsed.model.degraded);
        assert_eq!(parsed.source, code);
    }

    #[test]
    fn test_malformed_java_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let code = "public class Broken {\n  String s = \"never closed;\n}\n";

        let file_path = create_temp_file(&temp_dir, "Broken.java", code);
        let parsed = SourceParser::parse_file(&file_path).unwrap();

        assert!(parsed.model.degraded);
        assert_eq!(parsed.model.types[0].name, "Broken");
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = SourceParser::parse_file(Path::new("/nonexistent/File.java"));

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read file"));
    }

    #[test]
    fn test_parse_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = create_temp_file(&temp_dir, "Empty.java", "");
        let parsed = SourceParser::parse_file(&file_path).unwrap();

        assert!(parsed.model.types.is_empty());
        assert_eq!(parsed.model.line_count, 0);
    }

    #[test]
    fn test_parse_files_batch() {
        let temp_dir = TempDir::new().unwrap();
        let first = create_temp_file(&temp_dir, "A.java", "class A {}");
        let second = create_temp_file(&temp_dir, "B.java", "interface B {}");
        let missing = temp_dir.path().join("Missing.java");

        let results = SourceParser::parse_files(&[first, missing, second]);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().model.types[0].name, "B");
    }
}
