use crate::config::is_config_file;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Build manifests the technology detector understands.
pub const MANIFEST_NAMES: &[&str] = &[
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "settings.gradle.kts",
];

/// Directories never descended into, besides hidden ones.
const SKIPPED_DIRS: &[&str] = &["target", "build", "node_modules", "out"];

/// File scanner for traversing Java project directories.
///
/// The `FileScanner` recursively walks through a project directory to find all Java source
/// files, build manifests and Spring configuration files. It skips build output (`target`, `build`, `out`),
/// `node_modules` and hidden directories (those starting with `.`).
///
/// # Example
///
/// ```no_run
/// use spring_insight::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Java files", result.java_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
#[derive(Debug)]
pub struct ScanResult {
    /// All discovered `.java` files, sorted by path
    pub java_files: Vec<PathBuf>,
    /// All discovered build manifests, sorted by path
    pub manifests: Vec<PathBuf>,
    /// `application*.properties`, `application*.yml` and XML files, sorted by path
    pub config_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects Java sources and manifests.
    ///
    /// If any directories or files cannot be accessed, warnings are logged and added to
    /// the result, but scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.exists() {
            anyhow::bail!("Directory not found: {}", self.root_path.display());
        }

        let mut java_files = Vec::new();
        let mut manifests = Vec::new();
        let mut config_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }
                if !e.file_type().is_dir() {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && !SKIPPED_DIRS.contains(&file_name.as_ref())
            })
        {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let path = entry.path();
                    let name = entry.file_name().to_string_lossy();
                    if path.extension().and_then(|s| s.to_str()) == Some("java") {
                        java_files.push(path.to_path_buf());
                    } else if MANIFEST_NAMES.contains(&name.as_ref()) {
                        manifests.push(path.to_path_buf());
                    } else if is_config_file(&name) {
                        config_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        debug!(
            "Scan of {} found {} Java file(s), {} manifest(s), {} configuration file(s)",
            self.root_path.display(),
            java_files.len(),
            manifests.len(),
            config_files.len()
        );

        Ok(ScanResult {
            java_files,
            manifests,
            config_files,
            warnings,
        })
    }

    /// Reads manifests, configuration files and Java sources into the name-to-content
    /// listing the technology detector consumes. Keys are paths relative to the root, `/`-separated.
    ///
    /// # Errors
    ///
    /// Fails if the scan fails or a manifest cannot be read. Unreadable Java sources and
    /// configuration files only produce a warning.
    pub fn listing(&self) -> Result<BTreeMap<String, String>> {
        let scan = self.scan()?;
        let mut files = BTreeMap::new();

        for path in &scan.manifests {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
            files.insert(self.relative_key(path), content);
        }
        for path in scan.config_files.iter().chain(&scan.java_files) {
            match fs::read_to_string(path) {
                Ok(content) => {
                    files.insert(self.relative_key(path), content);
                }
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }
        Ok(files)
    }

    fn relative_key(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root_path).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_normal_directory() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("App.java"), "class App {}").unwrap();
        fs::write(root.join("Util.java"), "class Util {}").unwrap();
        fs::write(root.join("pom.xml"), "<project/>").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(names(&result.java_files), vec!["App.java", "Util.java"]);
        assert_eq!(names(&result.manifests), vec!["pom.xml"]);
        assert!(result.config_files.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_collects_configuration_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src/main/resources")).unwrap();
        for name in ["application.properties", "application-dev.yml", "context.xml", "messages.properties"] {
            fs::write(root.join("src/main/resources").join(name), "").unwrap();
        }
        fs::write(root.join("pom.xml"), "<project/>").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(
            names(&result.config_files),
            vec!["application-dev.yml", "application.properties", "context.xml"]
        );
        assert_eq!(names(&result.manifests), vec!["pom.xml"]);
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let scanner = FileScanner::new(temp_dir.path().to_path_buf());
        let result = scanner.scan().unwrap();

        assert!(result.java_files.is_empty());
        assert!(result.manifests.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_missing_directory() {
        let scanner = FileScanner::new(PathBuf::from("/nonexistent/project"));
        let err = scanner.scan().unwrap_err();
        assert!(err.to_string().contains("Directory not found"));
    }

    #[test]
    fn test_scan_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src/main/java/com/example")).unwrap();
        fs::create_dir_all(root.join("src/test/java/com/example")).unwrap();
        fs::write(root.join("build.gradle.kts"), "plugins {}").unwrap();
        fs::write(root.join("settings.gradle"), "").unwrap();
        fs::write(
            root.join("src/main/java/com/example/App.java"),
            "class App {}",
        )
        .unwrap();
        fs::write(
            root.join("src/test/java/com/example/AppTest.java"),
            "class AppTest {}",
        )
        .unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(result.java_files.len(), 2);
        assert_eq!(
            names(&result.manifests),
            vec!["build.gradle.kts", "settings.gradle"]
        );
    }

    #[test]
    fn test_scan_skips_build_output_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for dir in ["target", "build", "node_modules", ".git"] {
            fs::create_dir(root.join(dir)).unwrap();
            fs::write(root.join(dir).join("Generated.java"), "class Generated {}").unwrap();
        }
        fs::write(root.join("target/pom.xml"), "<project/>").unwrap();
        fs::write(root.join("Main.java"), "class Main {}").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(names(&result.java_files), vec!["Main.java"]);
        assert!(result.manifests.is_empty());
    }

    #[test]
    fn test_listing_uses_relative_keys() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src/main/java")).unwrap();
        fs::create_dir_all(root.join("src/main/resources")).unwrap();
        fs::write(root.join("pom.xml"), "<project/>").unwrap();
        fs::write(root.join("src/main/java/App.java"), "class App {}").unwrap();
        fs::write(root.join("src/main/resources/application.yml"), "server:\n  port: 1").unwrap();
        fs::write(root.join("src/main/resources/banner.txt"), "hi").unwrap();

        let listing = FileScanner::new(root.to_path_buf()).listing().unwrap();

        let keys: Vec<_> = listing.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "pom.xml",
                "src/main/java/App.java",
                "src/main/resources/application.yml",
            ]
        );
        assert_eq!(listing["pom.xml"], "<project/>");
    }
}
