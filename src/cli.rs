use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Spring Insight - Recover structure, Spring semantics and quality metrics from Java sources
#[derive(Parser, Debug)]
#[command(name = "spring-insight")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Report format (yaml or json); documentation uses --format instead
    #[arg(short = 'f', long = "report-format", value_enum, default_value = "yaml", global = true)]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE", global = true)]
    pub output_path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a Java file, or every Java file under a directory
    Analyze {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Analysis mode: structure, quality or dependencies
        #[arg(short = 'm', long = "mode", default_value = "structure")]
        mode: String,

        /// Fail instead of returning a best-effort report for malformed input
        #[arg(long = "strict")]
        strict: bool,
    },
    /// Render documentation for a Java file or directory
    Docs {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Documentation format: markdown, html or json
        #[arg(long = "format", default_value = "markdown")]
        format: String,

        /// Document title
        #[arg(long = "title")]
        title: Option<String>,
    },
    /// Detect build system, frameworks and Java version of a project
    Detect {
        #[arg(value_name = "PROJECT_PATH")]
        project_path: PathBuf,
    },
    /// List the comments of a Java file
    Comments {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Command {
    fn input_path(&self) -> &Path {
        match self {
            Command::Analyze { path, .. } | Command::Docs { path, .. } => path,
            Command::Detect { project_path } => project_path,
            Command::Comments { file } => file,
        }
    }
}

/// Report output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments.
///
/// Mode and format values are checked here so that an unsupported value is rejected
/// before any file is read.
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    use crate::analyzer::AnalysisMode;
    use crate::renderer::DocFormat;

    debug!("Parsed arguments: {:?}", args);

    let input = args.command.input_path();
    if !input.exists() {
        anyhow::bail!("Path does not exist: {}", input.display());
    }

    match &args.command {
        Command::Analyze { mode, .. } => {
            let mode: AnalysisMode = mode.parse()?;
            info!("Analysis mode: {}", mode);
        }
        Command::Docs { format, .. } => {
            let format: DocFormat = format.parse()?;
            info!("Documentation format: {}", format);
        }
        Command::Detect { project_path } => {
            if !project_path.is_dir() {
                anyhow::bail!(
                    "Project path is not a directory: {}",
                    project_path.display()
                );
            }
        }
        Command::Comments { file } => {
            if !file.is_file() {
                anyhow::bail!("Not a file: {}", file.display());
            }
        }
    }

    info!("Input path: {}", input.display());
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Run the selected command and write its output
pub fn run(args: CliArgs) -> Result<()> {
    use crate::serializer::write_to_file;

    let content = match &args.command {
        Command::Analyze { path, mode, strict } => {
            run_analyze(path, mode, *strict, args.output_format)?
        }
        Command::Docs {
            path,
            format,
            title,
        } => run_docs(path, format, title.as_deref())?,
        Command::Detect { project_path } => run_detect(project_path, args.output_format)?,
        Command::Comments { file } => run_comments(file, args.output_format)?,
    };

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote {}", output_path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}

fn serialize<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    use crate::serializer::{serialize_json, serialize_yaml};

    match format {
        OutputFormat::Yaml => serialize_yaml(value),
        OutputFormat::Json => serialize_json(value),
    }
}

/// Java files to work on: the path itself, or everything the scanner finds under it.
fn java_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    use crate::scanner::FileScanner;

    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    info!("Scanning {}...", path.display());
    let scan_result = FileScanner::new(path.to_path_buf()).scan()?;
    for warning in &scan_result.warnings {
        warn!("{}", warning);
    }
    if scan_result.java_files.is_empty() {
        anyhow::bail!("No Java files found in {}", path.display());
    }
    info!("Found {} Java files", scan_result.java_files.len());
    Ok(scan_result.java_files)
}

fn parse_inputs(path: &Path) -> Result<Vec<crate::parser::ParsedFile>> {
    use crate::parser::SourceParser;

    let inputs = java_inputs(path)?;
    let parsed: Vec<_> = SourceParser::parse_files(&inputs)
        .into_iter()
        .filter_map(|r| match r {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("Skipping file: {}", e);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        anyhow::bail!("No files could be read successfully");
    }
    Ok(parsed)
}

fn run_analyze(path: &Path, mode: &str, strict: bool, format: OutputFormat) -> Result<String> {
    use crate::analyzer::{analyze_parsed, analyze_project, AnalysisMode};
    use crate::error::Error;

    let mode: AnalysisMode = mode.parse()?;
    let parsed = parse_inputs(path)?;

    if strict {
        if let Some(bad) = parsed.iter().find(|p| p.model.degraded) {
            return Err(Error::UnparseableInput {
                file: bad.path.clone(),
                diagnostics: bad.model.diagnostics.len(),
            }
            .into());
        }
    }

    // A single file reports as an object, a directory as a project report.
    if path.is_file() {
        return serialize(&analyze_parsed(&parsed[0], mode), format);
    }

    let report = analyze_project(&parsed, mode);
    let degraded = report.files.iter().filter(|r| r.degraded).count();
    info!(
        "Analyzed {} file(s), {} degraded",
        report.files.len(),
        degraded
    );
    if let Some(quality) = &report.quality {
        info!(
            "Average score {:.1} ({:?}), max complexity {}",
            quality.average_score, quality.grade, quality.max_complexity
        );
    }
    serialize(&report, format)
}

/// Spring configuration files under a directory; none for a single file.
fn config_inputs(path: &Path) -> Result<Vec<crate::config::ConfigFile>> {
    use crate::config::analyze_config;
    use crate::scanner::FileScanner;

    if !path.is_dir() {
        return Ok(Vec::new());
    }
    let scan_result = FileScanner::new(path.to_path_buf()).scan()?;
    let mut configs = Vec::new();
    for file in &scan_result.config_files {
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping {}: {}", file.display(), e);
                continue;
            }
        };
        let relative = file.strip_prefix(path).unwrap_or(file);
        let key = relative.to_string_lossy().replace('\\', "/");
        if let Some(config) = analyze_config(&key, &text) {
            configs.push(config);
        }
    }
    Ok(configs)
}

fn run_docs(path: &Path, format: &str, title: Option<&str>) -> Result<String> {
    use crate::doc_builder::DocumentationBuilder;
    use crate::renderer::{renderer_for, DocFormat};

    let format: DocFormat = format.parse()?;
    let parsed = parse_inputs(path)?;

    let mut builder = DocumentationBuilder::new();
    if let Some(title) = title {
        builder = builder.with_title(title);
    }
    for file in &parsed {
        builder.add_file(file);
    }
    for config in config_inputs(path)? {
        builder.add_config(config);
    }
    let doc = builder.build();
    info!(
        "Documented {} file(s), {} endpoint(s), {} configuration file(s)",
        doc.files.len(),
        doc.endpoints.len(),
        doc.configuration.len()
    );
    Ok(renderer_for(format).render(&doc)?)
}

fn run_detect(project_path: &Path, format: OutputFormat) -> Result<String> {
    use crate::analyzer::detect_technologies;
    use crate::scanner::FileScanner;

    let listing = FileScanner::new(project_path.to_path_buf()).listing()?;
    let report = detect_technologies(&listing);
    info!(
        "Build system: {:?}, frameworks: {:?}",
        report.build_system, report.frameworks
    );
    serialize(&report, format)
}

fn run_comments(file: &Path, format: OutputFormat) -> Result<String> {
    use crate::analyzer::extract_comments;
    use anyhow::Context;

    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let report = extract_comments(&text);
    info!("Found {} comment(s)", report.comments.len());
    serialize(&report, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_analyze_defaults() {
        let parsed = args(&["spring-insight", "analyze", "src"]);
        match parsed.command {
            Command::Analyze { mode, strict, .. } => {
                assert_eq!(mode, "structure");
                assert!(!strict);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(matches!(parsed.output_format, OutputFormat::Yaml));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let parsed = args(&["spring-insight", "detect", ".", "-v", "-f", "json", "-o", "out.json"]);
        assert!(parsed.verbose);
        assert!(matches!(parsed.output_format, OutputFormat::Json));
        assert_eq!(parsed.output_path, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_unsupported_format_rejected_before_reading() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_string_lossy().to_string();
        let path = path.as_str();
        let parsed = args(&["spring-insight", "docs", path, "--format", "pdf"]);

        let err = parse_args_from_parsed(parsed).unwrap_err();
        assert!(err.to_string().contains("unsupported documentation format 'pdf'"));
    }

    #[test]
    fn test_unsupported_mode_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().to_string_lossy().to_string();
        let path = path.as_str();
        let parsed = args(&["spring-insight", "analyze", path, "--mode", "deep"]);

        let err = parse_args_from_parsed(parsed).unwrap_err();
        assert!(err.to_string().contains("unsupported analysis mode 'deep'"));
    }

    #[test]
    fn test_missing_path_rejected() {
        let parsed = args(&["spring-insight", "comments", "/nonexistent/A.java"]);
        let err = parse_args_from_parsed(parsed).unwrap_err();
        assert!(err.to_string().contains("Path does not exist"));
    }

    #[test]
    fn test_run_analyze_writes_report() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Api.java");
        fs::write(
            &source,
            "@RestController class Api { @GetMapping(\"/ping\") String ping() { return \"\"; } }",
        )
        .unwrap();
        let output = temp_dir.path().join("report.json");
        let source_arg = source.to_string_lossy().to_string();
        let output_arg = output.to_string_lossy().to_string();

        let parsed = args(&[
            "spring-insight",
            "analyze",
            source_arg.as_str(),
            "-f",
            "json",
            "-o",
            output_arg.as_str(),
        ]);
        run(parse_args_from_parsed(parsed).unwrap()).unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(report["classification"]["endpoints"][0]["path"], "/ping");
    }

    #[test]
    fn test_strict_mode_fails_on_degraded_input() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Broken.java");
        fs::write(&source, "class Broken { String s = \"open; }").unwrap();
        let source_arg = source.to_string_lossy().to_string();

        let parsed = args(&[
            "spring-insight",
            "analyze",
            source_arg.as_str(),
            "--strict",
        ]);
        let err = run(parse_args_from_parsed(parsed).unwrap()).unwrap_err();
        assert!(err.to_string().contains("unparseable input"));
    }
}
