//! Code generation for the final bundle
//!
//! The dependency graph is embedded as a JSON object literal keyed by module
//! identity. Each value carries the module's `importMap` and its transformed
//! `code` as a JSON string, so arbitrary module text survives embedding. The
//! bootstrap loader from [`runtime`] wraps the literal and starts at the entry.

pub mod runtime;

use log::debug;

use crate::{
    config::RuntimeConfig,
    error::{BundleError, Result},
    module_graph::DependencyGraph,
    types::ModuleIdentity,
};

/// Loader behavior baked into the emitted script
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Evaluate each module at most once and share its exports between
    /// importers. Off by default, where every `require` re-runs the module.
    pub cache_modules: bool,
}

impl From<&RuntimeConfig> for RuntimeOptions {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            cache_modules: config.cache_modules,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    options: RuntimeOptions,
}

impl CodeGenerator {
    pub fn new(options: RuntimeOptions) -> Self {
        Self { options }
    }

    /// Render `graph` as a single script whose evaluation runs `entry`
    ///
    /// Fails with [`BundleError::GenerationFailure`] when `entry` is not in the
    /// graph or when some import map points outside of it. Those are builder
    /// bugs rather than user errors, but emitting such a bundle would only move
    /// the failure to load time.
    pub fn generate(&self, graph: &DependencyGraph, entry: &ModuleIdentity) -> Result<String> {
        if graph.is_empty() {
            return Err(BundleError::generation("the dependency graph is empty"));
        }
        if !graph.contains(entry.as_str()) {
            return Err(BundleError::generation(format!(
                "entry module {entry} is not part of the dependency graph"
            )));
        }
        if let Some(dangling) = graph.dangling_references().into_iter().next() {
            return Err(BundleError::generation(format!(
                "{} maps '{}' to {}, which is not part of the dependency graph",
                dangling.importer, dangling.specifier, dangling.target
            )));
        }

        let graph_literal = serde_json::to_string(graph).map_err(|err| {
            BundleError::generation(format!("cannot serialize dependency graph: {err}"))
        })?;
        let entry_literal = serde_json::to_string(entry).map_err(|err| {
            BundleError::generation(format!("cannot serialize entry identity: {err}"))
        })?;

        debug!(
            "Emitting bundle for {} modules (module cache {})",
            graph.len(),
            if self.options.cache_modules { "on" } else { "off" }
        );
        Ok(runtime::render(&graph_literal, &entry_literal, self.options))
    }
}

/// [`CodeGenerator::generate`] with default runtime options
pub fn generate(graph: &DependencyGraph, entry: &ModuleIdentity) -> Result<String> {
    CodeGenerator::default().generate(graph, entry)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{error::BundleErrorKind, module_graph::ModuleRecord};

    fn record(identity: &str, imports: &[(&str, &str)], code: &str) -> ModuleRecord {
        ModuleRecord {
            identity: ModuleIdentity::new(identity),
            import_map: imports
                .iter()
                .map(|(specifier, target)| ((*specifier).to_owned(), ModuleIdentity::new(*target)))
                .collect::<IndexMap<_, _>>(),
            code: code.to_owned(),
        }
    }

    fn two_module_graph() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        graph.insert(record(
            "src/index.js",
            &[("./message.js", "src/message.js")],
            "var m = require(\"./message.js\");\nexports.default = m.default;\n",
        ));
        graph.insert(record(
            "src/message.js",
            &[],
            "exports.default = \"hello </script> \\u2028\";\n",
        ));
        graph
    }

    #[test]
    fn test_generate_exact_output() -> Result<()> {
        let graph = two_module_graph();
        let bundle = generate(&graph, &ModuleIdentity::new("src/index.js"))?;
        let expected = concat!(
            "(function (graph) {\n",
            "  function run(moduleIdentity) {\n",
            "    var exports = {};\n",
            "    function localRequire(specifier) {\n",
            "      var importMap = graph[moduleIdentity].importMap;\n",
            "      if (!Object.prototype.hasOwnProperty.call(importMap, specifier)) {\n",
            "        throw new Error(\"Cannot find module '\" + specifier + \"' from '\" + \
             moduleIdentity + \"'\");\n",
            "      }\n",
            "      return run(importMap[specifier]);\n",
            "    }\n",
            "    var factory = new Function(\"require\", \"exports\", \
             graph[moduleIdentity].code);\n",
            "    factory(localRequire, exports);\n",
            "    return exports;\n",
            "  }\n",
            "  return run(\"src/index.js\");\n",
            "})({\"src/index.js\":{\"importMap\":{\"./message.js\":\"src/message.js\"},\
             \"code\":\"var m = require(\\\"./message.js\\\");\\nexports.default = \
             m.default;\\n\"},\"src/message.js\":{\"importMap\":{},\"code\":\"exports.default \
             = \\\"hello </script> \\\\u2028\\\";\\n\"}});\n",
        );
        assert_eq!(bundle, expected);
        Ok(())
    }

    #[test]
    fn test_generate_is_deterministic() -> Result<()> {
        let graph = two_module_graph();
        let entry = ModuleIdentity::new("src/index.js");
        let generator = CodeGenerator::new(RuntimeOptions {
            cache_modules: true,
        });
        assert_eq!(
            generator.generate(&graph, &entry)?,
            generator.generate(&graph, &entry)?
        );
        Ok(())
    }

    #[test]
    fn test_entry_outside_graph_is_generation_failure() {
        let graph = two_module_graph();
        let err = generate(&graph, &ModuleIdentity::new("src/other.js")).expect_err("no entry");
        assert_eq!(err.kind(), BundleErrorKind::GenerationFailure);
    }

    #[test]
    fn test_empty_graph_is_generation_failure() {
        let err = generate(&DependencyGraph::new(), &ModuleIdentity::new("src/index.js"))
            .expect_err("empty graph");
        assert_eq!(err.kind(), BundleErrorKind::GenerationFailure);
        assert_eq!(
            err.to_string(),
            "failed to generate bundle: the dependency graph is empty"
        );
    }

    #[test]
    fn test_dangling_reference_is_generation_failure() {
        let mut graph = DependencyGraph::new();
        graph.insert(record("src/index.js", &[("./gone.js", "src/gone.js")], ""));
        let err = generate(&graph, &ModuleIdentity::new("src/index.js")).expect_err("dangling");
        assert_eq!(err.kind(), BundleErrorKind::GenerationFailure);
        assert!(err.to_string().contains("src/gone.js"));
    }
}
