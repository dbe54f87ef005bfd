//! Quality metrics of one analyzed file, and their aggregation over a project.
//!
//! Everything here is a pure function of the [`SourceModel`] and the lexer's code view.
//! Cyclomatic complexity is a textual approximation: 1 plus the number of decision points
//! (`if`, `for`, `while`, `case`, `catch`, `&&`, `||` and the ternary `?`) found in the code
//! characters of a method body. Comments and literals never count.
//!
//! # Score (policy version 1)
//!
//! ```text
//! size       = min(1, code_lines / 1000)
//! complexity = min(1, (average_complexity - 1) / 19)
//! comments   = min(1, comment_ratio / 0.25)
//! score      = clamp(100 - 20*size - 50*complexity - 30*(1 - comments), 0, 100)
//! ```
//!
//! The score never rises when complexity rises and never falls when comment density rises.

use crate::classifier::is_spring_annotation;
use crate::lexer::{LexedSource, SpanKind};
use crate::model::{AnnotationUsage, SourceModel, TypeDecl};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Version of the scoring weights below; bumped whenever they change.
pub const POLICY_VERSION: &str = "1";

const SIZE_WEIGHT: f64 = 20.0;
const COMPLEXITY_WEIGHT: f64 = 50.0;
const COMMENT_WEIGHT: f64 = 30.0;
const SIZE_CEILING_LINES: f64 = 1000.0;
const COMPLEXITY_CEILING: f64 = 20.0;
const TARGET_COMMENT_RATIO: f64 = 0.25;

/// Lines longer than this are reported as long
pub const LONG_LINE_THRESHOLD: usize = 120;

static DECISION_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:if|for|while|case|catch)\b").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub policy_version: String,
    pub line_count: usize,
    pub non_empty_lines: usize,
    pub blank_lines: usize,
    pub comment_lines: usize,
    pub code_lines: usize,
    pub max_line_length: usize,
    pub long_lines: usize,
    pub type_count: usize,
    pub method_count: usize,
    pub field_count: usize,
    pub annotation_count: usize,
    pub spring_annotation_count: usize,
    pub complexity_sum: u32,
    pub average_complexity: f64,
    pub max_complexity: u32,
    pub methods: Vec<MethodComplexity>,
    /// Size of every type, nested ones included, in pre-order
    pub types: Vec<TypeMetrics>,
    /// Comment lines per code line
    pub comment_ratio: f64,
    pub score: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodComplexity {
    /// Dotted name of the declaring type
    pub type_name: String,
    pub method: String,
    pub line: usize,
    pub complexity: u32,
}

/// Size metrics of one type declaration. Members of nested types are not counted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMetrics {
    /// Dotted name, e.g. `Outer.Inner`
    pub name: String,
    pub line: usize,
    /// Physical lines from the first annotation to the closing brace
    pub lines: usize,
    pub methods: usize,
    pub fields: usize,
    pub max_complexity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Grade::A,
            s if s >= 80.0 => Grade::B,
            s if s >= 70.0 => Grade::C,
            s if s >= 60.0 => Grade::D,
            _ => Grade::F,
        }
    }
}

/// Computes the metrics of one file.
pub fn compute(model: &SourceModel, lexed: &LexedSource, text: &str) -> QualityMetrics {
    let lines = LineCounts::of(text, lexed);

    let mut methods = Vec::new();
    let mut types = Vec::new();
    let mut method_count = 0;
    let mut field_count = 0;
    let mut annotations: Vec<&AnnotationUsage> = Vec::new();

    for (type_name, decl) in model.all_types() {
        method_count += decl.methods.len();
        field_count += decl.fields.len();
        collect_annotations(decl, &mut annotations);

        let first_method = methods.len();
        for method in &decl.methods {
            let Some(body) = method.body else {
                continue;
            };
            methods.push(MethodComplexity {
                type_name: type_name.clone(),
                method: method.name.clone(),
                line: method.line,
                complexity: cyclomatic_complexity(lexed.code_in(body)),
            });
        }

        let first_line = lexed.line_of(decl.span.start);
        let last_line = lexed.line_of(decl.span.end.saturating_sub(1).max(decl.span.start));
        types.push(TypeMetrics {
            name: type_name,
            line: decl.line,
            lines: last_line.saturating_sub(first_line) + 1,
            methods: decl.methods.len(),
            fields: decl.fields.len(),
            max_complexity: methods[first_method..]
                .iter()
                .map(|m| m.complexity)
                .max()
                .unwrap_or(0),
        });
    }

    let complexity_sum: u32 = methods.iter().map(|m| m.complexity).sum();
    let max_complexity = methods.iter().map(|m| m.complexity).max().unwrap_or(0);
    let average_complexity = if methods.is_empty() {
        1.0
    } else {
        f64::from(complexity_sum) / methods.len() as f64
    };
    let comment_ratio = if lines.code == 0 {
        0.0
    } else {
        lines.comment as f64 / lines.code as f64
    };
    let score = quality_score(lines.code, average_complexity, comment_ratio);

    QualityMetrics {
        policy_version: POLICY_VERSION.to_string(),
        line_count: model.line_count,
        non_empty_lines: lines.code + lines.comment,
        blank_lines: lines.blank,
        comment_lines: lines.comment,
        code_lines: lines.code,
        max_line_length: lines.max_length,
        long_lines: lines.long,
        type_count: model.type_count(),
        method_count,
        field_count,
        annotation_count: annotations.len(),
        spring_annotation_count: annotations
            .iter()
            .filter(|a| is_spring_annotation(a.simple_name()))
            .count(),
        complexity_sum,
        average_complexity: round2(average_complexity),
        max_complexity,
        methods,
        types,
        comment_ratio: round2(comment_ratio),
        score,
        grade: Grade::from_score(score),
    }
}

/// How many of the lowest-scoring files a [`ProjectQuality`] lists.
pub const WORST_FILES: usize = 5;

/// Quality of a set of files, aggregated from their per-file metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectQuality {
    pub policy_version: String,
    pub file_count: usize,
    pub total_lines: usize,
    pub code_lines: usize,
    pub comment_lines: usize,
    pub type_count: usize,
    pub method_count: usize,
    pub field_count: usize,
    pub spring_annotation_count: usize,
    pub average_lines_per_file: f64,
    /// Mean of the file scores
    pub average_score: f64,
    /// Complexity sum over all methods divided by their count
    pub average_complexity: f64,
    pub max_complexity: u32,
    pub grade: Grade,
    /// Lowest scores first; ties keep input order
    pub worst_files: Vec<FileScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileScore {
    pub file: String,
    pub score: f64,
    pub grade: Grade,
}

impl ProjectQuality {
    /// Aggregates `(file path, metrics)` pairs. An empty input yields zero totals and a
    /// perfect score.
    pub fn aggregate<'a, I>(files: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a QualityMetrics)>,
    {
        let files: Vec<(&str, &QualityMetrics)> = files.into_iter().collect();
        let file_count = files.len();
        let sum = |f: fn(&QualityMetrics) -> usize| files.iter().map(|(_, m)| f(m)).sum::<usize>();

        let total_lines = sum(|m| m.line_count);
        let complexity_sum: u32 = files.iter().map(|(_, m)| m.complexity_sum).sum();
        let measured_methods: usize = files.iter().map(|(_, m)| m.methods.len()).sum();
        let average_score = if file_count == 0 {
            100.0
        } else {
            files.iter().map(|(_, m)| m.score).sum::<f64>() / file_count as f64
        };

        let mut worst_files: Vec<FileScore> = files
            .iter()
            .map(|(path, m)| FileScore {
                file: path.to_string(),
                score: m.score,
                grade: m.grade,
            })
            .collect();
        worst_files.sort_by(|a, b| a.score.total_cmp(&b.score));
        worst_files.truncate(WORST_FILES);

        let average_score = round2(average_score);
        ProjectQuality {
            policy_version: POLICY_VERSION.to_string(),
            file_count,
            total_lines,
            code_lines: sum(|m| m.code_lines),
            comment_lines: sum(|m| m.comment_lines),
            type_count: sum(|m| m.type_count),
            method_count: sum(|m| m.method_count),
            field_count: sum(|m| m.field_count),
            spring_annotation_count: sum(|m| m.spring_annotation_count),
            average_lines_per_file: if file_count == 0 {
                0.0
            } else {
                round2(total_lines as f64 / file_count as f64)
            },
            average_score,
            average_complexity: if measured_methods == 0 {
                1.0
            } else {
                round2(f64::from(complexity_sum) / measured_methods as f64)
            },
            max_complexity: files.iter().map(|(_, m)| m.max_complexity).max().unwrap_or(0),
            grade: Grade::from_score(average_score),
            worst_files,
        }
    }
}

/// Composite score in `0..=100`, rounded to one decimal.
pub fn quality_score(code_lines: usize, average_complexity: f64, comment_ratio: f64) -> f64 {
    let size = (code_lines as f64 / SIZE_CEILING_LINES).min(1.0);
    let complexity = ((average_complexity - 1.0) / (COMPLEXITY_CEILING - 1.0)).clamp(0.0, 1.0);
    let comments = (comment_ratio / TARGET_COMMENT_RATIO).clamp(0.0, 1.0);

    let raw = 100.0
        - SIZE_WEIGHT * size
        - COMPLEXITY_WEIGHT * complexity
        - COMMENT_WEIGHT * (1.0 - comments);
    (raw.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

/// Decision points in a code view fragment, plus one.
pub fn cyclomatic_complexity(code: &str) -> u32 {
    let keywords = DECISION_KEYWORD.find_iter(code).count();
    let logical = code.matches("&&").count() + code.matches("||").count();
    let ternaries = count_ternaries(code.as_bytes());
    1 + (keywords + logical + ternaries) as u32
}

/// `?` that is not a generic wildcard such as `List<?>` or `<? extends T>`.
fn count_ternaries(code: &[u8]) -> usize {
    let prev_non_ws = |i: usize| code[..i].iter().rev().find(|b| !b.is_ascii_whitespace());
    let next_non_ws = |i: usize| code[i + 1..].iter().find(|b| !b.is_ascii_whitespace());

    code.iter()
        .enumerate()
        .filter(|(_, b)| **b == b'?')
        .filter(|(i, _)| {
            let after = &code[i + 1..];
            let follows_word = |word: &[u8]| {
                let skip = after.iter().take_while(|b| b.is_ascii_whitespace()).count();
                let trimmed = &after[skip..];
                trimmed.starts_with(word)
                    && !trimmed
                        .get(word.len())
                        .map_or(false, |b| b.is_ascii_alphanumeric() || *b == b'_')
            };
            let wildcard = matches!(prev_non_ws(*i), Some(b'<') | Some(b','))
                && (matches!(next_non_ws(*i), Some(b'>') | Some(b','))
                    || follows_word(b"extends")
                    || follows_word(b"super"));
            !wildcard
        })
        .count()
}

fn collect_annotations<'a>(decl: &'a TypeDecl, out: &mut Vec<&'a AnnotationUsage>) {
    out.extend(decl.annotations.iter());
    for field in &decl.fields {
        out.extend(field.annotations.iter());
    }
    for method in &decl.methods {
        out.extend(method.annotations.iter());
        for param in &method.parameters {
            out.extend(param.annotations.iter());
        }
    }
    for component in &decl.record_components {
        out.extend(component.annotations.iter());
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Physical line classification.
///
/// A line is code when any code character is on it, comment when it holds only comment
/// text, blank otherwise. Lines inside a text block count as code.
#[derive(Debug, Default)]
struct LineCounts {
    code: usize,
    comment: usize,
    blank: usize,
    max_length: usize,
    long: usize,
}

impl LineCounts {
    fn of(text: &str, lexed: &LexedSource) -> Self {
        let mut counts = LineCounts::default();
        let mut offset = 0;
        for line in text.split_inclusive('\n') {
            let content = line.trim_end_matches(['\n', '\r']);
            let length = content.chars().count();
            counts.max_length = counts.max_length.max(length);
            if length > LONG_LINE_THRESHOLD {
                counts.long += 1;
            }

            let code_view = &lexed.code[offset..offset + content.len()];
            if !code_view.trim().is_empty() {
                counts.code += 1;
            } else if let Some(first) = content.find(|c: char| !c.is_whitespace()) {
                match span_kind_at(lexed, offset + first) {
                    Some(SpanKind::LineComment) | Some(SpanKind::BlockComment) => {
                        counts.comment += 1
                    }
                    _ => counts.code += 1,
                }
            } else {
                counts.blank += 1;
            }
            offset += line.len();
        }
        counts
    }
}

fn span_kind_at(lexed: &LexedSource, offset: usize) -> Option<SpanKind> {
    let idx = lexed.spans.partition_point(|s| s.end <= offset);
    lexed.spans.get(idx).map(|s| s.kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;
    use crate::lexer;

    fn metrics_of(text: &str) -> QualityMetrics {
        let lexed = lexer::scan(text);
        let model = extract(text, "Test.java", &lexed);
        compute(&model, &lexed, text)
    }

    #[test]
    fn test_complexity_counts_decision_points() {
        let code = "{ if (a && b) { for (;;) {} } else if (c || d) { x = e ? 1 : 2; } switch (k) { case 1: case 2: break; default: } try {} catch (E e) {} while (z) {} }";
        // 1 + if, &&, for, if, ||, ?, case, case, catch, while
        assert_eq!(cyclomatic_complexity(code), 11);
    }

    #[test]
    fn test_generic_wildcards_are_not_ternaries() {
        assert_eq!(cyclomatic_complexity("{ List<?> a; Map<?, ? extends T> b; List<? super X> c; }"), 1);
        assert_eq!(cyclomatic_complexity("{ return ok ? a : b; }"), 2);
    }

    #[test]
    fn test_keywords_in_strings_and_comments_do_not_count() {
        let text = "class A {\n  void m() {\n    // if for while\n    String s = \"if (a && b)\";\n  }\n}";
        let metrics = metrics_of(text);
        assert_eq!(metrics.methods[0].complexity, 1);
    }

    #[test]
    fn test_identifiers_containing_keywords_do_not_count() {
        assert_eq!(cyclomatic_complexity("{ format(); iffy = cases; forEach(x); }"), 1);
    }

    #[test]
    fn test_line_classification() {
        let text = "/**\n * Doc.\n */\nclass A {\n\n  int x; // trailing\n  String t = \"\"\"\n    body\n    \"\"\";\n}\n";
        let metrics = metrics_of(text);
        assert_eq!(metrics.line_count, 10);
        assert_eq!(metrics.comment_lines, 3);
        assert_eq!(metrics.blank_lines, 1);
        assert_eq!(metrics.code_lines, 6);
        assert_eq!(metrics.non_empty_lines, 9);
    }

    #[test]
    fn test_counts_and_annotations() {
        let text = "@Service\nclass A {\n  @Autowired Repo repo;\n  int a, b;\n  @Override public String toString() { return \"\"; }\n  abstract void run(@Valid Form f);\n  static class B { void n() {} }\n}";
        let metrics = metrics_of(text);
        assert_eq!(metrics.type_count, 2);
        assert_eq!(metrics.field_count, 3);
        assert_eq!(metrics.method_count, 3);
        assert_eq!(metrics.methods.len(), 2);
        assert_eq!(metrics.methods[1].type_name, "A.B");
        assert_eq!(metrics.annotation_count, 4);
        assert_eq!(metrics.spring_annotation_count, 2);
    }

    #[test]
    fn test_score_is_monotonic() {
        // more complexity never raises the score
        let mut last = f64::MAX;
        for avg in [1.0, 2.0, 5.0, 10.0, 19.0, 20.0, 40.0] {
            let score = quality_score(200, avg, 0.1);
            assert!(score <= last, "score rose at complexity {}", avg);
            last = score;
        }
        // more comments never lower it
        let mut last = f64::MIN;
        for ratio in [0.0, 0.05, 0.1, 0.25, 0.5, 2.0] {
            let score = quality_score(200, 3.0, ratio);
            assert!(score >= last, "score fell at ratio {}", ratio);
            last = score;
        }
    }

    #[test]
    fn test_score_bounds_and_grades() {
        assert_eq!(quality_score(0, 1.0, 0.25), 100.0);
        assert_eq!(quality_score(5000, 50.0, 0.0), 0.0);
        assert_eq!(Grade::from_score(95.0), Grade::A);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(12.5), Grade::F);
    }

    #[test]
    fn test_metrics_are_deterministic() {
        let text = "class A { int f(int x) { return x > 0 ? x : -x; } }";
        assert_eq!(metrics_of(text), metrics_of(text));
    }

    #[test]
    fn test_type_metrics_per_declaration() {
        let text = "@Service\nclass A {\n  int a, b;\n  void run() { if (a > b) {} }\n  static class Inner { String s; }\n}\n\nclass B {\n  void x() {}\n  void y() {}\n}\n";
        let metrics = metrics_of(text);
        let rows: Vec<(&str, usize, usize, usize, u32)> = metrics
            .types
            .iter()
            .map(|t| (t.name.as_str(), t.lines, t.methods, t.fields, t.max_complexity))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("A", 6, 1, 2, 2),
                ("A.Inner", 1, 0, 1, 0),
                ("B", 4, 2, 0, 1),
            ]
        );
        assert_eq!(metrics.types[2].line, 8);
    }

    #[test]
    fn test_project_quality_aggregates_files() {
        let simple = metrics_of("class A { int f() { return 1; } }");
        let branchy = metrics_of(
            "class B {\n  int g(int x) { if (x > 0 && x < 9) { return 1; } while (x > 2) { x--; } return x > 5 ? 1 : 0; }\n  int h() { return 0; }\n}",
        );
        let project = ProjectQuality::aggregate(vec![
            ("A.java", &simple),
            ("B.java", &branchy),
        ]);

        assert_eq!(project.file_count, 2);
        assert_eq!(project.total_lines, simple.line_count + branchy.line_count);
        assert_eq!(project.method_count, 3);
        assert_eq!(project.type_count, 2);
        // (1 + 5 + 1) / 3
        assert_eq!(project.average_complexity, 2.33);
        assert_eq!(project.max_complexity, 5);
        assert_eq!(project.average_score, round2((simple.score + branchy.score) / 2.0));
        assert_eq!(project.worst_files.len(), 2);
        assert!(project.worst_files[0].score <= project.worst_files[1].score);
        assert_eq!(project.worst_files[0].file, "B.java");
    }

    #[test]
    fn test_project_quality_of_nothing() {
        let project = ProjectQuality::aggregate(Vec::new());
        assert_eq!(project.file_count, 0);
        assert_eq!(project.average_score, 100.0);
        assert_eq!(project.grade, Grade::A);
        assert!(project.worst_files.is_empty());
    }
}
