//! The dependency graph handed from the graph builder to the code generator
//!
//! Records are kept in discovery order so that serializing the graph is
//! deterministic. Each record carries its own import map: the same specifier
//! may name different files depending on the importing directory, so the
//! mapping cannot be global.

use indexmap::IndexMap;
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::types::{ImportSpecifier, ModuleIdentity};

/// One discovered module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    #[serde(skip)]
    pub identity: ModuleIdentity,
    /// Specifier as written in this module -> module it resolves to, in source order
    pub import_map: IndexMap<ImportSpecifier, ModuleIdentity>,
    /// Plain code using `require(specifier)` and `exports.name = ...`
    pub code: String,
}

/// A reference from an import map to a module that is not in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub importer: ModuleIdentity,
    pub specifier: ImportSpecifier,
    pub target: ModuleIdentity,
}

/// Mapping from module identity to its record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    modules: IndexMap<ModuleIdentity, ModuleRecord>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, replacing any previous record with the same identity
    pub fn insert(&mut self, record: ModuleRecord) {
        self.modules.insert(record.identity.clone(), record);
    }

    pub fn get(&self, identity: &str) -> Option<&ModuleRecord> {
        self.modules.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.modules.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &ModuleIdentity> {
        self.modules.keys()
    }

    /// Import-map entries whose target has no record; empty for a closed graph
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        self.modules
            .values()
            .flat_map(|record| {
                record
                    .import_map
                    .iter()
                    .filter(|(_, target)| !self.modules.contains_key(*target))
                    .map(|(specifier, target)| DanglingReference {
                        importer: record.identity.clone(),
                        specifier: specifier.clone(),
                        target: target.clone(),
                    })
            })
            .collect()
    }

    /// Groups of modules that import each other, directly or transitively
    ///
    /// A module importing itself forms a group of one. Groups and their members
    /// come out in a stable order for a given graph.
    pub fn find_cycles(&self) -> Vec<Vec<ModuleIdentity>> {
        let mut graph: DiGraph<&ModuleIdentity, ()> = DiGraph::new();
        let mut node_indices: FxHashMap<&ModuleIdentity, NodeIndex> = FxHashMap::default();

        for identity in self.modules.keys() {
            node_indices.insert(identity, graph.add_node(identity));
        }
        for record in self.modules.values() {
            let from = node_indices[&record.identity];
            for target in record.import_map.values() {
                if let Some(&to) = node_indices.get(target) {
                    graph.update_edge(from, to, ());
                }
            }
        }

        let mut cycles: Vec<Vec<ModuleIdentity>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1 || graph.contains_edge(component[0], component[0])
            })
            .map(|mut component| {
                component.sort_by_key(|idx| idx.index());
                component
                    .into_iter()
                    .map(|idx| (*graph[idx]).clone())
                    .collect()
            })
            .collect();
        cycles.sort_by_key(|cycle| self.modules.get_index_of(&cycle[0]));
        cycles
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(identity: &str, imports: &[(&str, &str)]) -> ModuleRecord {
        ModuleRecord {
            identity: ModuleIdentity::new(identity),
            import_map: imports
                .iter()
                .map(|(spec, target)| ((*spec).to_owned(), ModuleIdentity::new(*target)))
                .collect(),
            code: String::new(),
        }
    }

    #[test]
    fn test_closed_graph_has_no_dangling_references() {
        let mut graph = DependencyGraph::new();
        assert!(graph.is_empty());
        graph.insert(record("a.js", &[("./b", "b.js")]));
        graph.insert(record("b.js", &[]));
        assert!(graph.dangling_references().is_empty());
        assert!(!graph.is_empty());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_dangling_reference_reported() {
        let mut graph = DependencyGraph::new();
        graph.insert(record("a.js", &[("./b", "b.js"), ("./c", "c.js")]));
        graph.insert(record("b.js", &[]));
        assert_eq!(
            graph.dangling_references(),
            vec![DanglingReference {
                importer: ModuleIdentity::new("a.js"),
                specifier: "./c".to_owned(),
                target: ModuleIdentity::new("c.js"),
            }]
        );
    }

    #[test]
    fn test_find_cycles() {
        let mut graph = DependencyGraph::new();
        graph.insert(record("index.js", &[("./a", "a.js"), ("./self", "self.js")]));
        graph.insert(record("a.js", &[("./b", "b.js")]));
        graph.insert(record("b.js", &[("./a", "a.js")]));
        graph.insert(record("self.js", &[("./self", "self.js")]));

        assert_eq!(
            graph.find_cycles(),
            vec![
                vec![ModuleIdentity::new("a.js"), ModuleIdentity::new("b.js")],
                vec![ModuleIdentity::new("self.js")],
            ]
        );
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let mut graph = DependencyGraph::new();
        graph.insert(record("a.js", &[("./b", "b.js"), ("./c", "c.js")]));
        graph.insert(record("b.js", &[("./d", "d.js")]));
        graph.insert(record("c.js", &[("./d", "d.js")]));
        graph.insert(record("d.js", &[]));
        assert!(graph.find_cycles().is_empty());
    }

    #[test]
    fn test_serializes_in_discovery_order_without_identity() {
        let mut graph = DependencyGraph::new();
        graph.insert(ModuleRecord {
            code: "require(\"./b\");".to_owned(),
            ..record("src/a.js", &[("./b", "src/b.js")])
        });
        graph.insert(record("src/b.js", &[]));

        let json = serde_json::to_string(&graph).expect("serialize graph");
        assert_eq!(
            json,
            r#"{"src/a.js":{"importMap":{"./b":"src/b.js"},"code":"require(\"./b\");"},"src/b.js":{"importMap":{},"code":""}}"#
        );
    }
}
