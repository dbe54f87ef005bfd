//! Member declarations inside a type body: fields, methods, constructors, enum constants.

use super::annotations::{find_assignment, ident_end, is_ident_byte, split_top_level};
use super::{Extractor, Prelude};
use crate::model::{FieldDecl, MethodDecl, Parameter, TextSpan, TypeDecl, TypeKind};

impl Extractor<'_> {
    /// Fills `decl` with the members found in `start..end` (the body without its braces).
    pub(super) fn parse_members(&self, decl: &mut TypeDecl, start: usize, end: usize) {
        let mut pos = start;
        if decl.kind == TypeKind::Enum {
            pos = self.parse_enum_constants(decl, start, end);
        }

        while pos < end {
            let (prelude, at) = self.read_prelude(pos, end);
            if at >= end {
                break;
            }

            if let Some(kind) = self.type_keyword_at(at, end) {
                match self.parse_type(kind, prelude, at, end) {
                    Some((nested, next)) => {
                        decl.nested.push(nested);
                        pos = next;
                    }
                    None => pos = self.skip_statement(at, end),
                }
                continue;
            }

            pos = match self.code[at] {
                b';' | b'}' => at + 1,
                // initializer block, `static` already taken as a modifier
                b'{' => self.block_end(at, end),
                _ => self.parse_member(decl, prelude, at, end).max(at + 1),
            };
        }
    }

    /// Enum constants up to the `;` that opens the member section (or the end of the body).
    fn parse_enum_constants(&self, decl: &mut TypeDecl, start: usize, end: usize) -> usize {
        let mut pos = start;
        loop {
            let (_, at) = self.read_prelude(pos, end);
            if at >= end {
                return end;
            }
            if self.code[at] == b';' {
                return at + 1;
            }
            let name_end = ident_end(self.code, at, end);
            if name_end == at {
                return at;
            }
            decl.enum_constants.push(self.text[at..name_end].to_string());

            pos = self.skip_ws(name_end, end);
            if pos < end && self.code[pos] == b'(' {
                pos = self.close_of(pos, end).map_or(end, |c| c + 1);
                pos = self.skip_ws(pos, end);
            }
            if pos < end && self.code[pos] == b'{' {
                pos = self.skip_ws(self.block_end(pos, end), end);
            }
            match self.code.get(pos) {
                Some(b',') if pos < end => pos += 1,
                Some(b';') if pos < end => return pos + 1,
                _ => return pos,
            }
        }
    }

    /// Parses one field, method or constructor declaration starting at `at`, after its
    /// prelude. Returns the offset just past it.
    fn parse_member(&self, decl: &mut TypeDecl, prelude: Prelude, at: usize, end: usize) -> usize {
        let mut cur = at;
        let mut type_parameters = None;
        if self.code[cur] == b'<' {
            if let Some(close) = self.angle_close(cur, end) {
                type_parameters = Some(normalize_type(&self.lexed.code[cur..=close]));
                cur = self.skip_ws(close + 1, end);
            }
        }

        let stop = self.header_stop(cur, end);
        match self.code.get(stop).filter(|_| stop < end) {
            Some(b'(') => self.parse_method(decl, prelude, type_parameters, cur, stop, end),
            Some(b'=' | b';' | b',') => self.parse_fields(decl, prelude, cur, end),
            Some(b'{') => {
                let header = self.lexed.code[cur..stop].trim();
                let body_end = self.block_end(stop, end);
                if decl.kind == TypeKind::Record && header == decl.name {
                    let doc = self.doc_of(&prelude);
                    decl.methods.push(MethodDecl {
                        name: decl.name.clone(),
                        modifiers: prelude.modifiers,
                        return_type: None,
                        type_parameters,
                        parameters: decl.record_components.clone(),
                        throws: Vec::new(),
                        annotations: prelude.annotations,
                        body: Some(TextSpan::new(stop, body_end)),
                        doc,
                        is_constructor: true,
                        line: self.lexed.line_of(cur),
                    });
                }
                body_end
            }
            _ => stop,
        }
    }

    /// First of `(`, `=`, `,` at generic depth 0, or `;`, `{`, `}` at any depth.
    fn header_stop(&self, start: usize, end: usize) -> usize {
        let mut angle = 0i32;
        for i in start..end {
            match self.code[i] {
                b'<' => angle += 1,
                b'>' if angle > 0 => angle -= 1,
                b'(' | b'=' | b',' if angle == 0 => return i,
                b';' | b'{' | b'}' => return i,
                _ => {}
            }
        }
        end
    }

    fn parse_method(
        &self,
        decl: &mut TypeDecl,
        prelude: Prelude,
        type_parameters: Option<String>,
        header_start: usize,
        open: usize,
        end: usize,
    ) -> usize {
        let Some((return_type, name_start, name_end)) = self.split_declarator(header_start, open)
        else {
            return self.skip_statement(open, end);
        };
        let name = self.text[name_start..name_end].to_string();
        let doc = self.doc_of(&prelude);
        let is_constructor = return_type.is_empty();
        if is_constructor && name != decl.name {
            return self.skip_statement(open, end);
        }

        let Some(close) = self.close_of(open, end) else {
            // parameter list never closes; keep what can be read
            decl.methods.push(MethodDecl {
                name,
                modifiers: prelude.modifiers,
                return_type: (!is_constructor).then_some(return_type),
                type_parameters,
                parameters: self.parse_parameters(open + 1, end),
                throws: Vec::new(),
                annotations: prelude.annotations,
                body: None,
                doc,
                is_constructor,
                line: self.lexed.line_of(name_start),
            });
            return end;
        };

        let mut pos = self.skip_ws(close + 1, end);
        // legacy `int values()[]` array return type
        let mut return_type = return_type;
        while pos + 1 < end && self.code[pos] == b'[' {
            let Some(bracket) = self.close_of(pos, end) else {
                break;
            };
            return_type.push_str("[]");
            pos = self.skip_ws(bracket + 1, end);
        }

        let mut throws = Vec::new();
        if self.word_at(pos, end) == "throws" {
            let clause_start = pos + "throws".len();
            let clause_end = (clause_start..end)
                .find(|&i| matches!(self.code[i], b'{' | b';' | b'}'))
                .unwrap_or(end);
            throws = split_type_list(&self.lexed.code, clause_start, clause_end);
            pos = clause_end;
        }

        let (body, next) = if self.word_at(pos, end) == "default" {
            // annotation element default value
            let semi = self.flat_statement_end(pos, end);
            (None, (semi + 1).min(end))
        } else {
            match self.code.get(pos).filter(|_| pos < end) {
                Some(b'{') => {
                    let body_end = self.block_end(pos, end);
                    (Some(TextSpan::new(pos, body_end)), body_end)
                }
                Some(b';') => (None, pos + 1),
                _ => (None, pos),
            }
        };

        decl.methods.push(MethodDecl {
            name,
            modifiers: prelude.modifiers,
            return_type: (!is_constructor).then_some(return_type),
            type_parameters,
            parameters: self.parse_parameters(open + 1, close),
            throws,
            annotations: prelude.annotations,
            body,
            doc,
            is_constructor,
            line: self.lexed.line_of(name_start),
        });
        next
    }

    /// One field statement, possibly declaring several variables (`int a, b = 2, c[];`).
    fn parse_fields(&self, decl: &mut TypeDecl, prelude: Prelude, start: usize, end: usize) -> usize {
        let semi = self.flat_statement_end(start, end);
        let doc = self.doc_of(&prelude);
        let mut base_type: Option<String> = None;

        for (part_start, part_end) in split_top_level(self.code, start, semi) {
            let assignment = find_assignment(self.code, part_start, part_end);
            let lhs_end = assignment.unwrap_or(part_end);
            let Some((type_text, name_start, name_end)) = self.split_declarator(part_start, lhs_end)
            else {
                continue;
            };
            let declared = match &base_type {
                None => {
                    base_type = Some(type_text.clone());
                    type_text
                }
                // later declarators only add array dimensions to the shared type
                Some(base) => format!("{}{}", base, type_text),
            };
            if declared.is_empty() {
                continue;
            }

            decl.fields.push(FieldDecl {
                name: self.text[name_start..name_end].to_string(),
                type_name: declared,
                modifiers: prelude.modifiers.clone(),
                annotations: prelude.annotations.clone(),
                has_initializer: assignment.is_some(),
                doc: doc.clone(),
                line: self.lexed.line_of(name_start),
            });
        }
        (semi + 1).min(end)
    }

    /// Formal parameters in `start..end` (the text between the parentheses).
    pub(super) fn parse_parameters(&self, start: usize, end: usize) -> Vec<Parameter> {
        split_top_level(self.code, start, end)
            .into_iter()
            .filter_map(|(part_start, part_end)| {
                // annotations and `final`
                let (prelude, at) = self.read_prelude(part_start, part_end);
                let (type_name, name_start, name_end) = self.split_declarator(at, part_end)?;
                (!type_name.is_empty()).then(|| Parameter {
                    name: self.text[name_start..name_end].to_string(),
                    type_name,
                    annotations: prelude.annotations,
                })
            })
            .collect()
    }

    /// Splits `Type name[]` into the normalized type text and the span of the name.
    ///
    /// Array dimensions written after the name move onto the type. The type is empty when
    /// only a name is present.
    fn split_declarator(&self, start: usize, end: usize) -> Option<(String, usize, usize)> {
        let mut tail = end;
        let mut dims = 0;
        loop {
            while tail > start && self.code[tail - 1].is_ascii_whitespace() {
                tail -= 1;
            }
            if tail >= start + 2 && self.code[tail - 1] == b']' {
                let mut open = tail - 1;
                while open > start && self.code[open - 1].is_ascii_whitespace() {
                    open -= 1;
                }
                if open > start && self.code[open - 1] == b'[' {
                    dims += 1;
                    tail = open - 1;
                    continue;
                }
            }
            break;
        }

        let mut name_start = tail;
        while name_start > start && is_ident_byte(self.code[name_start - 1]) {
            name_start -= 1;
        }
        if ident_end(self.code, name_start, tail) != tail || name_start == tail {
            return None;
        }

        let mut type_text = normalize_type(&self.lexed.code[start..name_start]);
        for _ in 0..dims {
            type_text.push_str("[]");
        }
        Some((type_text, name_start, tail))
    }

    /// Offset of the `;` ending the statement at `pos`, skipping over bracketed
    /// initializers; `end` when there is none.
    fn flat_statement_end(&self, pos: usize, end: usize) -> usize {
        let mut depth = crate::lexer::DepthCounter::default();
        for i in pos..end {
            let byte = self.code[i];
            depth.feed(byte);
            if depth.braces < 0 {
                // ran into the closing brace of the enclosing body
                return i;
            }
            if byte == b';' && depth.is_flat() {
                return i;
            }
        }
        end
    }
}

/// Comma-separated type names in `code[from..to]`, normalized.
pub(super) fn split_type_list(code: &str, from: usize, to: usize) -> Vec<String> {
    split_top_level(code.as_bytes(), from, to)
        .into_iter()
        .map(|(s, e)| normalize_type(&code[s..e]))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Collapses whitespace in type text: `Map< String ,List <X> >` becomes
/// `Map<String, List<X>>`.
pub(super) fn normalize_type(raw: &str) -> String {
    const TIGHT_BEFORE: &[char] = &['<', '>', ',', '[', ']', '.'];
    const TIGHT_AFTER: &[char] = &['<', '[', '.', '@'];

    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for c in raw.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space && !TIGHT_BEFORE.contains(&c) && !out.ends_with(TIGHT_AFTER) {
            out.push(' ');
        }
        pending_space = c == ',';
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::extract;
    use crate::lexer;
    use crate::model::SourceModel;
    use pretty_assertions::assert_eq;

    fn model_of(text: &str) -> SourceModel {
        let lexed = lexer::scan(text);
        extract(text, "Test.java", &lexed)
    }

    #[test]
    fn test_normalize_type() {
        assert_eq!(normalize_type(" Map< String ,List <X> > "), "Map<String, List<X>>");
        assert_eq!(normalize_type("List<? extends Number>"), "List<? extends Number>");
        assert_eq!(normalize_type("String ..."), "String...");
        assert_eq!(normalize_type("java . util . List"), "java.util.List");
        assert_eq!(normalize_type("int [ ]"), "int[]");
    }

    #[test]
    fn test_methods_and_constructors() {
        let text = "class Svc {\n  private final Repo repo;\n  public Svc(Repo repo) { this.repo = repo; }\n  public <T> List<T> find(@PathVariable(\"id\") final Long id, String... tags) throws IOException, SQLException {\n    return null;\n  }\n  abstract int count();\n}";
        let model = model_of(text);
        let decl = &model.types[0];

        let ctor = &decl.methods[0];
        assert!(ctor.is_constructor);
        assert!(ctor.return_type.is_none());
        assert_eq!(ctor.parameters[0].type_name, "Repo");

        let find = decl.method("find").unwrap();
        assert_eq!(find.type_parameters.as_deref(), Some("<T>"));
        assert_eq!(find.return_type.as_deref(), Some("List<T>"));
        assert_eq!(find.parameters.len(), 2);
        assert_eq!(find.parameters[0].name, "id");
        assert_eq!(find.parameters[0].type_name, "Long");
        assert_eq!(find.parameters[0].annotations[0].name, "PathVariable");
        assert_eq!(find.parameters[1].type_name, "String...");
        assert_eq!(find.throws, vec!["IOException", "SQLException"]);
        assert_eq!(find.line, 4);
        assert!(find.body.is_some());

        let count = decl.method("count").unwrap();
        assert!(count.body.is_none());
        assert_eq!(count.modifiers, vec!["abstract"]);
    }

    #[test]
    fn test_field_declarators() {
        let text = "class A {\n  @Autowired private Map<String, Integer> counts = new HashMap<>(), other;\n  int a, b[] = {1, 2}, c;\n  static final String NAME = \"x;y\";\n}";
        let model = model_of(text);
        let fields = &model.types[0].fields;
        let summary: Vec<(&str, &str, bool)> = fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_name.as_str(), f.has_initializer))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("counts", "Map<String, Integer>", true),
                ("other", "Map<String, Integer>", false),
                ("a", "int", false),
                ("b", "int[]", true),
                ("c", "int", false),
                ("NAME", "String", true),
            ]
        );
        assert_eq!(fields[0].annotations[0].name, "Autowired");
        assert_eq!(fields[1].modifiers, vec!["private"]);
        assert_eq!(fields[5].modifiers, vec!["static", "final"]);
    }

    #[test]
    fn test_comparison_in_initializer_keeps_later_declarators() {
        let model = model_of("class A { boolean lt = a < b, other; int x; }");
        let names: Vec<&str> = model.types[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["lt", "other", "x"]);
        assert_eq!(model.types[0].fields[1].type_name, "boolean");

        let model = model_of("class B { Map<K, V> m = Map.<K, V>of(), n = x > 1 ? a : b, o; }");
        let names: Vec<&str> = model.types[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["m", "n", "o"]);
        assert_eq!(model.types[0].fields[2].type_name, "Map<K, V>");
    }

    #[test]
    fn test_enum_with_bodies_and_members() {
        let text = "enum Op {\n  PLUS(\"+\") { int apply(int a, int b) { return a + b; } },\n  @Deprecated MINUS(\"-\");\n  private final String symbol;\n  Op(String symbol) { this.symbol = symbol; }\n}";
        let model = model_of(text);
        let decl = &model.types[0];
        assert_eq!(decl.enum_constants, vec!["PLUS", "MINUS"]);
        assert_eq!(decl.fields.len(), 1);
        assert_eq!(decl.methods.len(), 1);
        assert!(decl.methods[0].is_constructor);
    }

    #[test]
    fn test_record_compact_constructor() {
        let text = "public record Point(int x, @Min(0) int y) implements Shape {\n  public Point {\n    if (x < 0) throw new IllegalArgumentException();\n  }\n  double norm() { return Math.sqrt(x * x + y * y); }\n}";
        let model = model_of(text);
        let decl = &model.types[0];
        assert_eq!(decl.record_components.len(), 2);
        assert_eq!(decl.record_components[1].annotations[0].name, "Min");
        assert_eq!(decl.interfaces, vec!["Shape"]);
        assert_eq!(decl.methods.len(), 2);
        assert!(decl.methods[0].is_constructor);
        assert_eq!(decl.methods[0].parameters.len(), 2);
        assert_eq!(decl.methods[1].name, "norm");
    }

    #[test]
    fn test_annotation_type_elements() {
        let text = "public @interface Audit {\n  String value() default \"\";\n  String[] tags() default {};\n  int level();\n}";
        let model = model_of(text);
        let decl = &model.types[0];
        let names: Vec<_> = decl.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["value", "tags", "level"]);
        assert_eq!(decl.methods[1].return_type.as_deref(), Some("String[]"));
    }

    #[test]
    fn test_initializer_blocks_are_skipped() {
        let text = "class A {\n  static { init(); }\n  { count = 1; }\n  int count;\n}";
        let model = model_of(text);
        let decl = &model.types[0];
        assert!(decl.methods.is_empty());
        assert_eq!(decl.fields.len(), 1);
        assert_eq!(decl.fields[0].name, "count");
    }

    #[test]
    fn test_interface_default_method() {
        let text = "interface Greeter {\n  String name();\n  default String greet() { return \"hi \" + name(); }\n}";
        let model = model_of(text);
        let greet = model.types[0].method("greet").unwrap();
        assert_eq!(greet.modifiers, vec!["default"]);
        assert!(greet.body.is_some());
    }
}
