use crate::classifier::is_spring_annotation;
use crate::config::{self, ConfigFile};
use crate::lexer;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Technology detector for Maven and Gradle projects.
///
/// The `TechnologyDetector` works on a listing of file name to file content supplied by the
/// caller; it never touches the file system. Manifests are searched as text (no XML or
/// Gradle DSL evaluation), and Java sources in the listing are searched for Spring marker
/// annotations.
///
/// Recognized manifests:
/// - `pom.xml` (Maven)
/// - `build.gradle`, `build.gradle.kts` (Gradle)
/// - `settings.gradle`, `settings.gradle.kts` (consulted, contributes nothing but its name)
pub struct TechnologyDetector;

/// Build tool identified from the manifest names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSystem {
    Maven,
    Gradle,
    Unknown,
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub artifact_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Maven scope or Gradle configuration (`test`, `testImplementation`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Manifest the dependency was declared in
    pub manifest: String,
}

impl Dependency {
    /// `group:artifact`, lowercased, used for the substring tables.
    fn coordinate(&self) -> String {
        match &self.group_id {
            Some(group) => format!("{}:{}", group, self.artifact_id).to_lowercase(),
            None => self.artifact_id.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageVersion {
    pub version: String,
    /// Manifest the version was read from
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpringBootInfo {
    pub detected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Starter suffixes, e.g. `web` for `spring-boot-starter-web`
    pub starters: Vec<String>,
    pub actuator: bool,
    pub security: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub detected: bool,
    pub technologies: Vec<String>,
    pub jpa: bool,
    pub jdbc: bool,
    pub nosql: Vec<String>,
}

/// Everything the detector learned about a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyReport {
    pub build_system: BuildSystem,
    /// Frameworks in order of first detection, without duplicates
    pub frameworks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_version: Option<LanguageVersion>,
    /// Recognized manifest names, in listing order
    pub manifests: Vec<String>,
    pub dependencies: Vec<Dependency>,
    pub spring_boot: SpringBootInfo,
    pub database: DatabaseInfo,
    pub testing_frameworks: Vec<String>,
    pub plugins: Vec<String>,
    pub profiles: Vec<String>,
    /// Spring annotations found in the Java sources of the listing
    pub spring_annotations: Vec<String>,
    /// Spring configuration files of the listing
    pub configuration: Vec<ConfigFile>,
}

/// Dependency-coordinate substring to framework name. Checked in order; one dependency may
/// contribute several frameworks.
const FRAMEWORKS: &[(&str, &str)] = &[
    ("spring-boot", "Spring Boot"),
    ("org.springframework", "Spring Framework"),
    ("spring-cloud", "Spring Cloud"),
    ("spring-security", "Spring Security"),
    ("starter-security", "Spring Security"),
    ("spring-data", "Spring Data"),
    ("starter-data-", "Spring Data"),
    ("hibernate", "Hibernate"),
    ("lombok", "Lombok"),
    ("mapstruct", "MapStruct"),
    ("springdoc", "Swagger/OpenAPI"),
    ("swagger", "Swagger/OpenAPI"),
    ("openapi", "Swagger/OpenAPI"),
    ("jackson", "Jackson"),
    ("slf4j", "Logging (SLF4J/Logback)"),
    ("logback", "Logging (SLF4J/Logback)"),
    ("kafka", "Apache Kafka"),
    ("flyway", "Flyway"),
    ("liquibase", "Liquibase"),
];

const TESTING: &[(&str, &str)] = &[
    ("junit", "JUnit"),
    ("testng", "TestNG"),
    ("mockito", "Mockito"),
    ("spring-boot-starter-test", "Spring Test"),
    ("spring-test", "Spring Test"),
    ("testcontainers", "TestContainers"),
    ("assertj", "AssertJ"),
];

const RELATIONAL: &[(&str, &str)] = &[
    ("mysql", "MySQL"),
    ("postgresql", "PostgreSQL"),
    ("ojdbc", "Oracle"),
    ("oracle", "Oracle"),
    ("mssql", "SQL Server"),
    ("sqlserver", "SQL Server"),
    ("mariadb", "MariaDB"),
    ("com.h2database", "H2"),
];

const NOSQL: &[(&str, &str)] = &[
    ("mongodb", "MongoDB"),
    ("redis", "Redis"),
    ("cassandra", "Cassandra"),
    ("neo4j", "Neo4j"),
    ("elasticsearch", "Elasticsearch"),
];

static MAVEN_DEPENDENCY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dependency>(.*?)</dependency>").unwrap());
static MAVEN_PLUGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<plugin>(.*?)</plugin>").unwrap());
static MAVEN_PARENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<parent>(.*?)</parent>").unwrap());
static MAVEN_PROFILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<profile>.*?<id>\s*([^<]+?)\s*</id>").unwrap());
static MAVEN_JAVA_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"<(java\.version|maven\.compiler\.release|maven\.compiler\.source|maven\.compiler\.target)>\s*([^<\s]+)\s*</",
    )
    .unwrap()
});
static GRADLE_DEPENDENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\b(implementation|api|compileOnly|runtimeOnly|testImplementation|testRuntimeOnly|testCompileOnly|annotationProcessor|developmentOnly|compile|runtime|testCompile)\s*\(?\s*["']([^"']+)["']"#,
    )
    .unwrap()
});
static GRADLE_APPLY_PLUGIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"apply\s+plugin\s*:\s*["']([^"']+)["']"#).unwrap());
static GRADLE_PLUGINS_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\bplugins\s*\{([^}]*)\}").unwrap());
static GRADLE_PLUGIN_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bid\s*\(?\s*["']([^"']+)["']"#).unwrap());
static GRADLE_BOOT_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"id\s*\(?\s*["']org\.springframework\.boot["']\s*\)?\s*version\s*\(?\s*["']([^"']+)["']"#)
        .unwrap()
});
static GRADLE_COMPATIBILITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:sourceCompatibility|targetCompatibility)\s*=\s*(?:JavaVersion\.VERSION_)?["']?([0-9][0-9._]*)"#)
        .unwrap()
});
static GRADLE_TOOLCHAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"languageVersion\s*(?:=|\.set\()\s*JavaLanguageVersion\.of\(\s*(\d+)\s*\)").unwrap()
});
static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@\s*([A-Za-z_][A-Za-z0-9_]*)").unwrap());

fn tag(content: &str, name: &str) -> Option<String> {
    let open = format!("<{}>", name);
    let close = format!("</{}>", name);
    let start = content.find(&open)? + open.len();
    let end = content[start..].find(&close)? + start;
    let value = content[start..end].trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn file_name(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

impl TechnologyDetector {
    /// Detects build system, frameworks and versions from a file listing.
    ///
    /// Keys are file names or relative paths; only the final path component decides whether
    /// an entry is a manifest. A listing without any recognized manifest yields
    /// [`BuildSystem::Unknown`] rather than an error.
    ///
    /// # Example
    ///
    /// ```
    /// use spring_insight::detector::{BuildSystem, TechnologyDetector};
    /// use std::collections::BTreeMap;
    ///
    /// let mut files = BTreeMap::new();
    /// files.insert("build.gradle".to_string(), "plugins { id 'java' }".to_string());
    /// let report = TechnologyDetector::detect(&files);
    /// assert_eq!(report.build_system, BuildSystem::Gradle);
    /// ```
    pub fn detect(files: &BTreeMap<String, String>) -> TechnologyReport {
        debug!("Detecting technologies in {} listed files", files.len());

        let mut report = TechnologyReport {
            build_system: BuildSystem::Unknown,
            frameworks: Vec::new(),
            language_version: None,
            manifests: Vec::new(),
            dependencies: Vec::new(),
            spring_boot: SpringBootInfo::default(),
            database: DatabaseInfo::default(),
            testing_frameworks: Vec::new(),
            plugins: Vec::new(),
            profiles: Vec::new(),
            spring_annotations: Vec::new(),
            configuration: config::analyze_listing(files),
        };
        let mut has_maven = false;
        let mut has_gradle = false;

        for (path, content) in files {
            match file_name(path) {
                "pom.xml" => {
                    has_maven = true;
                    report.manifests.push(path.clone());
                    Self::read_pom(path, content, &mut report);
                }
                "build.gradle" | "build.gradle.kts" => {
                    has_gradle = true;
                    report.manifests.push(path.clone());
                    Self::read_gradle(path, content, &mut report);
                }
                "settings.gradle" | "settings.gradle.kts" => {
                    report.manifests.push(path.clone());
                }
                name if name.ends_with(".java") => {
                    Self::scan_java(content, &mut report);
                }
                _ => {}
            }
        }

        // Gradle wins when both manifests are present, as in a migration in progress.
        report.build_system = if has_gradle {
            BuildSystem::Gradle
        } else if has_maven {
            BuildSystem::Maven
        } else {
            BuildSystem::Unknown
        };

        Self::classify_dependencies(&mut report);
        Self::read_datasources(&mut report);

        debug!(
            "Detected build system {:?}, frameworks: {:?}",
            report.build_system, report.frameworks
        );
        report
    }

    fn read_pom(path: &str, content: &str, report: &mut TechnologyReport) {
        for caps in MAVEN_DEPENDENCY.captures_iter(content) {
            let body = &caps[1];
            if let Some(artifact_id) = tag(body, "artifactId") {
                report.dependencies.push(Dependency {
                    group_id: tag(body, "groupId"),
                    artifact_id,
                    version: tag(body, "version"),
                    scope: tag(body, "scope"),
                    manifest: path.to_string(),
                });
            }
        }

        for caps in MAVEN_PLUGIN.captures_iter(content) {
            let body = &caps[1];
            if let Some(artifact_id) = tag(body, "artifactId") {
                if artifact_id == "spring-boot-maven-plugin" && report.spring_boot.version.is_none()
                {
                    report.spring_boot.version = tag(body, "version");
                }
                push_unique(&mut report.plugins, &artifact_id);
            }
        }

        if let Some(caps) = MAVEN_PARENT.captures(content) {
            let body = &caps[1];
            if tag(body, "artifactId").as_deref() == Some("spring-boot-starter-parent") {
                report.spring_boot.detected = true;
                if let Some(version) = tag(body, "version") {
                    report.spring_boot.version = Some(version);
                }
            }
        }

        for caps in MAVEN_PROFILE.captures_iter(content) {
            push_unique(&mut report.profiles, &caps[1]);
        }

        if report.language_version.is_none() {
            // Properties are ranked by name, not by position in the file.
            let mut found: Vec<(usize, String)> = MAVEN_JAVA_VERSION
                .captures_iter(content)
                .map(|caps| {
                    let rank = match &caps[1] {
                        "java.version" => 0,
                        "maven.compiler.release" => 1,
                        "maven.compiler.source" => 2,
                        _ => 3,
                    };
                    (rank, caps[2].to_string())
                })
                .collect();
            found.sort_by_key(|(rank, _)| *rank);
            report.language_version = found.into_iter().next().map(|(_, version)| {
                LanguageVersion {
                    version,
                    source: path.to_string(),
                }
            });
        }
    }

    fn read_gradle(path: &str, content: &str, report: &mut TechnologyReport) {
        for caps in GRADLE_DEPENDENCY.captures_iter(content) {
            let mut parts = caps[2].split(':');
            let first = parts.next().unwrap_or_default().to_string();
            let dependency = match parts.next() {
                Some(artifact) => Dependency {
                    group_id: Some(first),
                    artifact_id: artifact.to_string(),
                    version: parts.next().map(str::to_string),
                    scope: Some(caps[1].to_string()),
                    manifest: path.to_string(),
                },
                // Not a coordinate, e.g. `implementation 'some-project'`
                None => Dependency {
                    group_id: None,
                    artifact_id: first,
                    version: None,
                    scope: Some(caps[1].to_string()),
                    manifest: path.to_string(),
                },
            };
            report.dependencies.push(dependency);
        }

        for caps in GRADLE_APPLY_PLUGIN.captures_iter(content) {
            push_unique(&mut report.plugins, &caps[1]);
        }
        for block in GRADLE_PLUGINS_BLOCK.captures_iter(content) {
            for caps in GRADLE_PLUGIN_ID.captures_iter(&block[1]) {
                push_unique(&mut report.plugins, &caps[1]);
            }
        }

        if let Some(caps) = GRADLE_BOOT_VERSION.captures(content) {
            report.spring_boot.detected = true;
            report.spring_boot.version = Some(caps[1].to_string());
        } else if report.plugins.iter().any(|p| p == "org.springframework.boot") {
            report.spring_boot.detected = true;
        }

        if report.language_version.is_none() {
            let version = GRADLE_TOOLCHAIN
                .captures(content)
                .map(|caps| caps[1].to_string())
                .or_else(|| {
                    GRADLE_COMPATIBILITY
                        .captures(content)
                        .map(|caps| caps[1].replace('_', "."))
                });
            report.language_version = version.map(|version| LanguageVersion {
                version,
                source: path.to_string(),
            });
        }
    }

    /// Looks for Spring markers in code only, so commented-out annotations do not count.
    fn scan_java(content: &str, report: &mut TechnologyReport) {
        let lexed = lexer::scan(content);
        for caps in ANNOTATION.captures_iter(&lexed.code) {
            let name = &caps[1];
            if is_spring_annotation(name) {
                push_unique(&mut report.spring_annotations, name);
                if name == "SpringBootApplication" {
                    report.spring_boot.detected = true;
                }
            }
        }
    }

    /// Databases named by connection URLs in the configuration files, e.g.
    /// `spring.datasource.url=jdbc:postgresql://...`.
    fn read_datasources(report: &mut TechnologyReport) {
        let urls: Vec<String> = report
            .configuration
            .iter()
            .flat_map(|file| file.properties.iter())
            .filter(|p| p.key.starts_with("spring.datasource") || p.key.starts_with("spring.data."))
            .filter(|p| p.key.ends_with(".url") || p.key.ends_with(".uri"))
            .map(|p| p.value.to_lowercase())
            .collect();

        let db = &mut report.database;
        for url in &urls {
            for (needle, name) in RELATIONAL {
                if url.starts_with("jdbc:") && url.contains(needle) {
                    db.jdbc = true;
                    db.detected = true;
                    push_unique(&mut db.technologies, name);
                }
            }
            for (needle, name) in NOSQL {
                if url.starts_with(needle) || url.contains(&format!("{}:", needle)) {
                    db.detected = true;
                    push_unique(&mut db.nosql, name);
                }
            }
        }
    }

    fn classify_dependencies(report: &mut TechnologyReport) {
        let coordinates: Vec<(String, Option<String>)> = report
            .dependencies
            .iter()
            .map(|d| (d.coordinate(), d.version.clone()))
            .collect();

        for (coordinate, version) in &coordinates {
            for (needle, framework) in FRAMEWORKS {
                if coordinate.contains(needle) {
                    push_unique(&mut report.frameworks, framework);
                }
            }
            for (needle, framework) in TESTING {
                if coordinate.contains(needle) {
                    push_unique(&mut report.testing_frameworks, framework);
                }
            }

            let artifact = coordinate.rsplit(':').next().unwrap_or(coordinate);
            if artifact.contains("spring-boot") {
                let boot = &mut report.spring_boot;
                boot.detected = true;
                if let Some(starter) = artifact.strip_prefix("spring-boot-starter-") {
                    push_unique(&mut boot.starters, starter);
                    boot.actuator |= starter == "actuator";
                    boot.security |= starter == "security";
                }
                if boot.version.is_none() {
                    boot.version = version.clone();
                }
            }
            if coordinate.contains("spring-security") {
                report.spring_boot.security = true;
            }

            let db = &mut report.database;
            if ["hibernate", "jpa", "persistence"]
                .iter()
                .any(|t| coordinate.contains(t))
            {
                db.jpa = true;
                db.detected = true;
            }
            for (needle, name) in RELATIONAL {
                if coordinate.contains(needle) {
                    db.jdbc = true;
                    db.detected = true;
                    push_unique(&mut db.technologies, name);
                }
            }
            if coordinate.contains("jdbc") {
                db.jdbc = true;
                db.detected = true;
            }
            for (needle, name) in NOSQL {
                if coordinate.contains(needle) {
                    db.detected = true;
                    push_unique(&mut db.nosql, name);
                }
            }
        }

        if report.spring_boot.detected {
            push_unique(&mut report.frameworks, "Spring Boot");
        }
        if !report.spring_annotations.is_empty() {
            push_unique(&mut report.frameworks, "Spring Framework");
        }
    }
}
