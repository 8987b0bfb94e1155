//! Import discovery for a parsed ES module
//!
//! Only module-level syntax can import in an ES module, so the walk stays on
//! the top-level statement list: `import` declarations plus the two re-export
//! forms that carry a source, `export { .. } from` and `export * from`.

use oxc_ast::ast::{Program, Statement, StringLiteral};
use oxc_span::GetSpan;

use crate::{types::ImportSite, util::line_column};

/// The source literal of a statement that imports another module
pub(crate) fn import_source<'s, 'a>(stmt: &'s Statement<'a>) -> Option<&'s StringLiteral<'a>> {
    match stmt {
        Statement::ImportDeclaration(decl) => Some(&decl.source),
        Statement::ExportNamedDeclaration(decl) => decl.source.as_ref(),
        Statement::ExportAllDeclaration(decl) => Some(&decl.source),
        _ => None,
    }
}

/// Every import site of `program`, in source order
///
/// A specifier imported more than once is reported once per statement; callers
/// that need a mapping deduplicate.
pub fn discover_imports(program: &Program<'_>, source: &str) -> Vec<ImportSite> {
    program
        .body
        .iter()
        .filter_map(|stmt| {
            let literal = import_source(stmt)?;
            let (line, column) = line_column(source, stmt.span().start as usize);
            Some(ImportSite {
                specifier: literal.value.to_string(),
                line,
                column,
            })
        })
        .collect()
}
