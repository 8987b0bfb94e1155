//! Text of the bootstrap loader that wraps the serialized module graph
//!
//! The loader is an immediately-invoked function taking the graph object.
//! `run` evaluates one module in a fresh `new Function` scope, giving it a
//! `require` bound to that module's import map and an empty `exports` object.

use super::RuntimeOptions;

const PRELUDE: &str = "(function (graph) {\n";

const CACHE_DECL: &str = "  var cache = {};\n";

const RUN_OPEN: &str = "  function run(moduleIdentity) {\n";

const CACHE_LOOKUP: &str = "    if (Object.prototype.hasOwnProperty.call(cache, moduleIdentity)) {
      return cache[moduleIdentity];
    }
    var exports = cache[moduleIdentity] = {};
";

const FRESH_EXPORTS: &str = "    var exports = {};\n";

const RUN_BODY: &str = "    function localRequire(specifier) {
      var importMap = graph[moduleIdentity].importMap;
      if (!Object.prototype.hasOwnProperty.call(importMap, specifier)) {
        throw new Error(\"Cannot find module '\" + specifier + \"' from '\" + moduleIdentity + \"'\");
      }
      return run(importMap[specifier]);
    }
    var factory = new Function(\"require\", \"exports\", graph[moduleIdentity].code);
    factory(localRequire, exports);
    return exports;
  }
";

/// Assemble the bundle around already-serialized JSON literals
pub fn render(graph_literal: &str, entry_literal: &str, options: RuntimeOptions) -> String {
    let mut out = String::with_capacity(graph_literal.len() + 1024);
    out.push_str(PRELUDE);
    if options.cache_modules {
        out.push_str(CACHE_DECL);
    }
    out.push_str(RUN_OPEN);
    out.push_str(if options.cache_modules {
        CACHE_LOOKUP
    } else {
        FRESH_EXPORTS
    });
    out.push_str(RUN_BODY);
    out.push_str("  return run(");
    out.push_str(entry_literal);
    out.push_str(");\n})(");
    out.push_str(graph_literal);
    out.push_str(");\n");
    out
}
