use clap::Parser;
use spring_insight::{
    cli::{self, CliArgs},
    detect_technologies,
    detector::BuildSystem,
    parser::SourceParser,
    scanner::FileScanner,
};
use std::fs;
use tempfile::TempDir;

/// Helper function to create a temporary test project
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn shop_project() -> TempDir {
    create_test_project(vec![
        ("pom.xml", include_str!("fixtures/pom.xml")),
        (
            "src/main/java/com/example/shop/web/UserController.java",
            include_str!("fixtures/UserController.java"),
        ),
        (
            "src/main/java/com/example/shop/inventory/Inventory.java",
            include_str!("fixtures/Inventory.java"),
        ),
        (
            "src/main/resources/application.yml",
            "server:\n  port: 8081\nspring:\n  application:\n    name: shop\n  datasource:\n    password: hunter2\n",
        ),
        ("target/classes/Stale.java", "class Stale {}"),
    ])
}

#[test]
fn test_scan_and_parse_project() {
    let project = shop_project();

    let scan_result = FileScanner::new(project.path().to_path_buf())
        .scan()
        .expect("Failed to scan directory");
    assert_eq!(scan_result.java_files.len(), 2, "target/ must be skipped");
    assert_eq!(scan_result.manifests.len(), 1);

    let parsed: Vec<_> = SourceParser::parse_files(&scan_result.java_files)
        .into_iter()
        .filter_map(Result::ok)
        .collect();
    let total_types: usize = parsed.iter().map(|p| p.model.type_count()).sum();
    assert_eq!(total_types, 7);
}

#[test]
fn test_detect_project_technologies() {
    let project = shop_project();
    let listing = FileScanner::new(project.path().to_path_buf())
        .listing()
        .unwrap();

    let report = detect_technologies(&listing);

    assert_eq!(report.build_system, BuildSystem::Maven);
    assert_eq!(report.manifests, vec!["pom.xml"]);
    assert_eq!(
        report.language_version.as_ref().map(|v| v.version.as_str()),
        Some("17")
    );
    assert!(report.spring_boot.detected);
    assert_eq!(report.spring_boot.version.as_deref(), Some("3.2.1"));
    assert!(report.spring_boot.actuator);
    assert_eq!(report.spring_boot.starters, vec!["web", "actuator"]);
    assert_eq!(report.database.technologies, vec!["MySQL"]);
    assert_eq!(report.testing_frameworks, vec!["JUnit"]);
    assert!(report
        .spring_annotations
        .iter()
        .any(|a| a == "RestController"));
    assert_eq!(report.frameworks[0], "Spring Boot");
    assert_eq!(report.configuration.len(), 1);
    assert_eq!(report.configuration[0].get("server.port"), Some("8081"));
}

#[test]
fn test_cli_docs_to_html_file() {
    let project = shop_project();
    let output = project.path().join("out/docs.html");
    let root = project.path().to_string_lossy().to_string();
    let output_arg = output.to_string_lossy().to_string();

    let args = CliArgs::try_parse_from([
        "spring-insight",
        "docs",
        root.as_str(),
        "--format",
        "html",
        "--title",
        "Shop",
        "-o",
        output_arg.as_str(),
    ])
    .unwrap();
    cli::run(cli::parse_args_from_parsed(args).unwrap()).unwrap();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("<title>Shop</title>"));
    assert!(html.contains("Class UserController"));
    assert!(html.contains("/api/users/{id}/profile"));
    assert!(!html.contains("Stale"));
    assert!(html.contains("<h2>Components</h2>"));
    assert!(html.contains("<h3>Controllers</h3>"));
    assert!(html.contains("<h2>Configuration</h2>"));
    assert!(html.contains("<td>server.port</td><td>8081</td>"));
    assert!(!html.contains("hunter2"));
}

#[test]
fn test_cli_directory_quality_summary() {
    let project = shop_project();
    let output = project.path().join("quality.json");
    let root = project.path().to_string_lossy().to_string();
    let output_arg = output.to_string_lossy().to_string();

    let args = CliArgs::try_parse_from([
        "spring-insight",
        "analyze",
        root.as_str(),
        "--mode",
        "quality",
        "-f",
        "json",
        "-o",
        output_arg.as_str(),
    ])
    .unwrap();
    cli::run(cli::parse_args_from_parsed(args).unwrap()).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let files = value["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);

    let quality = &value["quality"];
    assert_eq!(quality["file_count"], 2);
    assert_eq!(quality["type_count"], 7);
    let total_lines: u64 = files
        .iter()
        .map(|f| f["metrics"]["line_count"].as_u64().unwrap())
        .sum();
    assert_eq!(quality["total_lines"].as_u64(), Some(total_lines));
    let mean_score = files
        .iter()
        .map(|f| f["metrics"]["score"].as_f64().unwrap())
        .sum::<f64>()
        / 2.0;
    let average = quality["average_score"].as_f64().unwrap();
    assert!((average - mean_score).abs() < 0.01);
    assert_eq!(quality["worst_files"].as_array().unwrap().len(), 2);
    // Inventory.of has the highest complexity in the fixtures
    assert_eq!(quality["max_complexity"], 4);
}

#[test]
fn test_cli_directory_structure_has_no_quality_summary() {
    let project = shop_project();
    let output = project.path().join("structure.yaml");
    let root = project.path().to_string_lossy().to_string();
    let output_arg = output.to_string_lossy().to_string();

    let args = CliArgs::try_parse_from([
        "spring-insight",
        "analyze",
        root.as_str(),
        "-o",
        output_arg.as_str(),
    ])
    .unwrap();
    cli::run(cli::parse_args_from_parsed(args).unwrap()).unwrap();

    let yaml = fs::read_to_string(&output).unwrap();
    assert!(yaml.starts_with("mode: structure"));
    assert!(!yaml.contains("quality:"));
}

#[test]
fn test_cli_detect_json_report() {
    let project = shop_project();
    let output = project.path().join("tech.json");
    let root = project.path().to_string_lossy().to_string();
    let output_arg = output.to_string_lossy().to_string();

    let args = CliArgs::try_parse_from([
        "spring-insight",
        "detect",
        root.as_str(),
        "-f",
        "json",
        "-o",
        output_arg.as_str(),
    ])
    .unwrap();
    cli::run(cli::parse_args_from_parsed(args).unwrap()).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(value["build_system"], "maven");
    assert_eq!(value["spring_boot"]["version"], "3.2.1");
}
