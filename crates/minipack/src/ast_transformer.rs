//! Rewrites ES module syntax into the `require` / `exports` idiom
//!
//! The rewrite works on source spans: every module-level `import` and `export`
//! statement is removed or trimmed in place and all other text is copied
//! through untouched. What those statements did moves into a prologue that
//! runs before the module body, in two parts:
//!
//! 1. every exported local binding is defined on `exports` as an enumerable
//!    getter, so importers always observe the binding's current value;
//! 2. every module request (`import`, `export … from`) is issued in source
//!    order, binding the imported names.
//!
//! Imported names are plain `var` copies taken when the request completes,
//! not live bindings.

use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, Declaration, ExportAllDeclaration,
    ExportDefaultDeclaration, ExportDefaultDeclarationKind, ExportNamedDeclaration,
    ImportDeclaration, ImportDeclarationSpecifier, Program, Statement,
};
use oxc_span::GetSpan;

/// Prefix of the temporaries holding a required module's `exports`
const IMPORT_TEMP_PREFIX: &str = "__minipack_import_";

/// Convert a parsed ES module into plain code for the runtime loader
pub fn esm_to_commonjs(program: &Program<'_>, source: &str) -> String {
    let mut rewriter = ModuleRewriter::default();

    if let Some(hashbang) = &program.hashbang {
        rewriter.edits.remove(hashbang.span.start, hashbang.span.end);
    }

    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => rewriter.rewrite_import(decl),
            Statement::ExportNamedDeclaration(decl) => rewriter.rewrite_export_named(decl),
            Statement::ExportDefaultDeclaration(decl) => rewriter.rewrite_export_default(decl),
            Statement::ExportAllDeclaration(decl) => rewriter.rewrite_export_all(decl),
            _ => {}
        }
    }

    let mut prologue = String::from("\"use strict\";\n");
    for line in rewriter.exports.iter().chain(&rewriter.requires) {
        prologue.push_str(line);
        prologue.push('\n');
    }
    rewriter.edits.apply(source, &prologue)
}

#[derive(Debug, Default)]
struct ModuleRewriter {
    edits: SourceEdits,
    /// Getter definitions for exported bindings
    exports: Vec<String>,
    /// Module requests, in source order
    requires: Vec<String>,
    next_temp: usize,
}

impl ModuleRewriter {
    fn temp_name(&mut self) -> String {
        let name = format!("{IMPORT_TEMP_PREFIX}{}", self.next_temp);
        self.next_temp += 1;
        name
    }

    fn rewrite_import(&mut self, decl: &ImportDeclaration<'_>) {
        let require = require_call(decl.source.value.as_str());
        let specifiers = decl.specifiers.as_ref().filter(|s| !s.is_empty());

        let request = match specifiers {
            None => format!("{require};"),
            Some(specifiers) => {
                let temp = self.temp_name();
                let mut text = format!("var {temp} = {require};");
                for specifier in specifiers {
                    let (local, value) = match specifier {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => {
                            (s.local.name.as_str(), member(&temp, s.imported.name().as_str()))
                        }
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                            (s.local.name.as_str(), member(&temp, "default"))
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                            (s.local.name.as_str(), temp.clone())
                        }
                    };
                    text.push_str(&format!(" var {local} = {value};"));
                }
                text
            }
        };

        self.requires.push(request);
        self.edits.remove(decl.span.start, decl.span.end);
    }

    fn rewrite_export_named(&mut self, decl: &ExportNamedDeclaration<'_>) {
        if let Some(declaration) = &decl.declaration {
            // Keep the declaration itself, drop the `export` keyword
            self.edits
                .remove(decl.span.start, declaration.span().start);

            match declaration {
                Declaration::FunctionDeclaration(function) => {
                    if let Some(id) = &function.id {
                        self.export_binding(&id.name, &id.name);
                    }
                }
                Declaration::ClassDeclaration(class) => {
                    if let Some(id) = &class.id {
                        self.export_binding(&id.name, &id.name);
                    }
                }
                Declaration::VariableDeclaration(variables) => {
                    let mut names = Vec::new();
                    for declarator in &variables.declarations {
                        collect_bound_names(&declarator.id, &mut names);
                    }
                    for name in &names {
                        self.export_binding(name, name);
                    }
                }
                _ => {}
            }
            return;
        }

        let object = decl.source.as_ref().map(|source| {
            let temp = self.temp_name();
            self.requires.push(format!(
                "var {temp} = {};",
                require_call(source.value.as_str())
            ));
            temp
        });

        for specifier in &decl.specifiers {
            let local = specifier.local.name();
            let value = match &object {
                Some(temp) => member(temp, local.as_str()),
                None => local.to_string(),
            };
            self.export_binding(specifier.exported.name().as_str(), &value);
        }

        self.edits.remove(decl.span.start, decl.span.end);
    }

    fn rewrite_export_default(&mut self, decl: &ExportDefaultDeclaration<'_>) {
        match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(function) => match &function.id {
                Some(id) => {
                    self.edits.remove(decl.span.start, function.span.start);
                    self.export_binding("default", &id.name);
                }
                None => self.assign_expression(decl, function.span.start, function.span.end),
            },
            ExportDefaultDeclarationKind::ClassDeclaration(class) => match &class.id {
                Some(id) => {
                    self.edits.remove(decl.span.start, class.span.start);
                    self.export_binding("default", &id.name);
                }
                None => self.assign_expression(decl, class.span.start, class.span.end),
            },
            expression => {
                let span = expression.span();
                self.edits.replace(
                    decl.span.start,
                    span.start,
                    format!("{} = ", member("exports", "default")),
                );
            }
        }
    }

    /// `export default <anonymous function or class>` becomes an assignment
    fn assign_expression(&mut self, decl: &ExportDefaultDeclaration<'_>, start: u32, end: u32) {
        self.edits.replace(
            decl.span.start,
            start,
            format!("{} = ", member("exports", "default")),
        );
        self.edits.insert(end, ";".to_owned());
    }

    fn rewrite_export_all(&mut self, decl: &ExportAllDeclaration<'_>) {
        let require = require_call(decl.source.value.as_str());
        let request = match &decl.exported {
            Some(exported) => format!("{} = {require};", member("exports", exported.name().as_str())),
            None => {
                let temp = self.temp_name();
                format!(
                    "var {temp} = {require}; Object.keys({temp}).forEach(function (key) {{ if \
                     (key === \"default\" || Object.prototype.hasOwnProperty.call(exports, key)) \
                     return; Object.defineProperty(exports, key, {{ enumerable: true, get: \
                     function () {{ return {temp}[key]; }} }}); }});"
                )
            }
        };
        self.requires.push(request);
        self.edits.remove(decl.span.start, decl.span.end);
    }

    /// Expose `value` as the export `exported` through a getter
    fn export_binding(&mut self, exported: &str, value: &str) {
        self.exports.push(format!(
            "Object.defineProperty(exports, {}, {{ enumerable: true, get: function () {{ return \
             {value}; }} }});",
            string_literal(exported)
        ));
    }
}

/// Names bound by a declaration pattern, in source order
fn collect_bound_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => names.push(ident.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for property in &object.properties {
                collect_bound_names(&property.value, names);
            }
            if let Some(rest) = &object.rest {
                collect_bound_names(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                collect_bound_names(element, names);
            }
            if let Some(rest) = &array.rest {
                collect_bound_names(&rest.argument, names);
            }
        }
        BindingPatternKind::AssignmentPattern(assignment) => {
            collect_bound_names(&assignment.left, names);
        }
    }
}

fn require_call(specifier: &str) -> String {
    format!("require({})", string_literal(specifier))
}

/// Property access that stays valid for names which are not identifiers
fn member(object: &str, property: &str) -> String {
    if is_identifier_name(property) {
        format!("{object}.{property}")
    } else {
        format!("{object}[{}]", string_literal(property))
    }
}

fn string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Pending replacements over the original source text
#[derive(Debug, Default)]
struct SourceEdits {
    edits: Vec<Edit>,
}

#[derive(Debug)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

impl SourceEdits {
    fn replace(&mut self, start: u32, end: u32, text: String) {
        self.edits.push(Edit {
            start: start as usize,
            end: end as usize,
            text,
        });
    }

    fn remove(&mut self, start: u32, end: u32) {
        self.replace(start, end, String::new());
    }

    fn insert(&mut self, at: u32, text: String) {
        self.replace(at, at, text);
    }

    /// Apply all edits; ranges never overlap because each edit belongs to its
    /// own top-level statement
    fn apply(mut self, source: &str, prologue: &str) -> String {
        self.edits.sort_by_key(|edit| (edit.start, edit.end));

        let mut output = String::with_capacity(prologue.len() + source.len());
        output.push_str(prologue);

        let mut cursor = 0;
        for edit in &self.edits {
            output.push_str(&source[cursor..edit.start]);
            output.push_str(&edit.text);
            cursor = edit.end;
        }
        output.push_str(&source[cursor..]);
        output
    }
}

#[cfg(test)]
mod tests {
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;
    use pretty_assertions::assert_eq;

    use super::*;

    fn transform(source: &str) -> String {
        let allocator = Allocator::default();
        let source_type = SourceType::default().with_module(true);
        let parsed = Parser::new(&allocator, source, source_type).parse();
        assert!(parsed.errors.is_empty(), "test source should parse");
        esm_to_commonjs(&parsed.program, source)
    }

    fn getter(exported: &str, value: &str) -> String {
        format!(
            "Object.defineProperty(exports, \"{exported}\", {{ enumerable: true, get: function () \
             {{ return {value}; }} }});"
        )
    }

    #[test]
    fn test_default_expression() {
        assert_eq!(
            transform("export default 1 + 1;\n"),
            "\"use strict\";\nexports.default = 1 + 1;\n"
        );
    }

    #[test]
    fn test_import_forms() {
        let source = r#"import "./setup.js";
import greet, { name as who, "odd-name" as odd } from "./greet.js";
import * as utils from "./utils.js";
greet(who, odd, utils);
"#;
        assert_eq!(
            transform(source),
            r#""use strict";
require("./setup.js");
var __minipack_import_0 = require("./greet.js"); var greet = __minipack_import_0.default; var who = __minipack_import_0.name; var odd = __minipack_import_0["odd-name"];
var __minipack_import_1 = require("./utils.js"); var utils = __minipack_import_1;



greet(who, odd, utils);
"#
        );
    }

    #[test]
    fn test_imports_run_before_code_above_them() {
        let source = "export const v = dep;\nimport dep from './dep.js';\n";
        assert_eq!(
            transform(source),
            format!(
                "\"use strict\";\n{}\nvar __minipack_import_0 = require(\"./dep.js\"); var dep = \
                 __minipack_import_0.default;\nconst v = dep;\n\n",
                getter("v", "v")
            )
        );
    }

    #[test]
    fn test_exported_declarations() {
        let source = r#"export const a = 1, { b, c: [d] } = obj;
export function helper() {}
export class Widget {}
"#;
        assert_eq!(
            transform(source),
            format!(
                "\"use strict\";\n{}\n{}\n{}\n{}\n{}\nconst a = 1, {{ b, c: [d] }} = obj;\nfunction \
                 helper() {{}}\nclass Widget {{}}\n",
                getter("a", "a"),
                getter("b", "b"),
                getter("d", "d"),
                getter("helper", "helper"),
                getter("Widget", "Widget"),
            )
        );
    }

    #[test]
    fn test_export_list_before_declaration() {
        assert_eq!(
            transform("export { x };\nlet x = 5;\n"),
            format!("\"use strict\";\n{}\n\nlet x = 5;\n", getter("x", "x"))
        );
    }

    #[test]
    fn test_reassigned_export_stays_behind_getter() {
        assert_eq!(
            transform("export let a = 1;\na = 2;\n"),
            format!("\"use strict\";\n{}\nlet a = 1;\na = 2;\n", getter("a", "a"))
        );
    }

    #[test]
    fn test_export_lists_and_reexports() {
        let source = r#"const x = 1;
export { x, x as "y-z" };
export { default as Thing, other } from "./thing.js";
export * as all from "./all.js";
"#;
        assert_eq!(
            transform(source),
            format!(
                "\"use strict\";\n{}\n{}\n{}\n{}\nvar __minipack_import_0 = \
                 require(\"./thing.js\");\nexports.all = require(\"./all.js\");\nconst x = 1;\n\n\n\n",
                getter("x", "x"),
                getter("y-z", "x"),
                getter("Thing", "__minipack_import_0.default"),
                getter("other", "__minipack_import_0.other"),
            )
        );
    }

    #[test]
    fn test_export_star() {
        assert_eq!(
            transform("export * from './shapes.js';\n"),
            "\"use strict\";\nvar __minipack_import_0 = require(\"./shapes.js\"); \
             Object.keys(__minipack_import_0).forEach(function (key) { if (key === \"default\" \
             || Object.prototype.hasOwnProperty.call(exports, key)) return; \
             Object.defineProperty(exports, key, { enumerable: true, get: function () { return \
             __minipack_import_0[key]; } }); });\n\n"
        );
    }

    #[test]
    fn test_default_declarations() {
        assert_eq!(
            transform("export default function main() { return 1; }\n"),
            format!(
                "\"use strict\";\n{}\nfunction main() {{ return 1; }}\n",
                getter("default", "main")
            )
        );
        assert_eq!(
            transform("export default function () {}\n"),
            "\"use strict\";\nexports.default = function () {};\n"
        );
        assert_eq!(
            transform("export default class Shape {}\n"),
            format!("\"use strict\";\n{}\nclass Shape {{}}\n", getter("default", "Shape"))
        );
        assert_eq!(
            transform("export default class {}\n"),
            "\"use strict\";\nexports.default = class {};\n"
        );
    }

    #[test]
    fn test_plain_script_untouched() {
        let source = "const answer = 42;\nconsole.log(answer);\n";
        assert_eq!(transform(source), format!("\"use strict\";\n{source}"));
    }

    #[test]
    fn test_hashbang_removed() {
        assert_eq!(
            transform("#!/usr/bin/env node\nexport default 1;\n"),
            "\"use strict\";\n\nexports.default = 1;\n"
        );
    }

    #[test]
    fn test_identifier_names() {
        assert!(is_identifier_name("default"));
        assert!(is_identifier_name("$el"));
        assert!(is_identifier_name("_private1"));
        assert!(!is_identifier_name("odd-name"));
        assert!(!is_identifier_name("1st"));
        assert!(!is_identifier_name(""));
    }
}
