//! The parser/transformer seam used by the graph builder
//!
//! The graph builder never touches syntax directly. It hands each module's
//! source to a [`ModuleTransformer`] and gets back the import sites to resolve
//! and the plain code to embed in the bundle.

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::{
    ast_transformer::esm_to_commonjs,
    error::{BundleError, Result},
    types::{ImportSite, ModuleIdentity},
    util::line_column,
    visitors::discover_imports,
};

/// What the graph builder needs to know about one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedModule {
    /// Import sites in source order
    pub imports: Vec<ImportSite>,
    /// Code where module syntax has been replaced by `require` and `exports`
    pub code: String,
}

/// Parses a module, lists its imports and lowers it to runtime-loader code
pub trait ModuleTransformer {
    /// Fails with [`BundleError::ParseFailure`] when `source` is not valid syntax
    fn transform(&self, module: &ModuleIdentity, source: &str) -> Result<TransformedModule>;
}

/// [`ModuleTransformer`] backed by the oxc parser
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcTransformer;

impl ModuleTransformer for OxcTransformer {
    fn transform(&self, module: &ModuleIdentity, source: &str) -> Result<TransformedModule> {
        let allocator = Allocator::default();
        let source_type = SourceType::default().with_module(true);
        let parsed = Parser::new(&allocator, source, source_type).parse();

        if let Some(error) = parsed.errors.first() {
            let offset = error
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map_or(0, |label| label.offset());
            let (line, column) = line_column(source, offset);
            return Err(BundleError::ParseFailure {
                module: module.clone(),
                message: error.to_string(),
                line,
                column,
            });
        }
        if parsed.panicked {
            return Err(BundleError::ParseFailure {
                module: module.clone(),
                message: "parser aborted".to_owned(),
                line: 1,
                column: 1,
            });
        }

        Ok(TransformedModule {
            imports: discover_imports(&parsed.program, source),
            code: esm_to_commonjs(&parsed.program, source),
        })
    }
}

impl<T: ModuleTransformer + ?Sized> ModuleTransformer for &T {
    fn transform(&self, module: &ModuleIdentity, source: &str) -> Result<TransformedModule> {
        (**self).transform(module, source)
    }
}
