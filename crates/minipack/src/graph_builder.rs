//! Graph builder that walks the import relation from the entry module
//! This module bridges the resolver and the module transformer and produces the
//! `DependencyGraph` consumed by code generation

use std::{collections::VecDeque, fmt};

use indexmap::IndexMap;
use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::{
    error::{BundleError, Result},
    module_graph::{DependencyGraph, ModuleRecord},
    module_transformer::ModuleTransformer,
    resolver::ModuleResolver,
    types::ModuleIdentity,
};

/// Builds a `DependencyGraph` starting from an entry module
///
/// Traversal uses an explicit FIFO worklist instead of recursion, and a visited
/// set so that every module is read and transformed exactly once, however many
/// importers it has and whether or not the imports form cycles.
pub struct GraphBuilder<'a, T: ModuleTransformer + ?Sized> {
    resolver: &'a ModuleResolver,
    transformer: &'a T,
}

impl<T: ModuleTransformer + ?Sized> fmt::Debug for GraphBuilder<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("resolver", self.resolver)
            .finish_non_exhaustive()
    }
}

impl<'a, T: ModuleTransformer + ?Sized> GraphBuilder<'a, T> {
    pub fn new(resolver: &'a ModuleResolver, transformer: &'a T) -> Self {
        Self {
            resolver,
            transformer,
        }
    }

    /// Build the graph of everything reachable from `entry`
    pub fn build(&self, entry: &ModuleIdentity) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        let mut visited: FxHashSet<ModuleIdentity> = FxHashSet::default();
        let mut pending: VecDeque<ModuleIdentity> = VecDeque::from([entry.clone()]);

        while let Some(module) = pending.pop_front() {
            if !visited.insert(module.clone()) {
                continue;
            }

            let record = self.process_module(&module, &visited, &mut pending)?;
            graph.insert(record);
        }

        debug!("Dependency graph complete with {} modules", graph.len());
        Ok(graph)
    }

    /// Read, transform and resolve one module, queueing its unvisited imports
    fn process_module(
        &self,
        module: &ModuleIdentity,
        visited: &FxHashSet<ModuleIdentity>,
        pending: &mut VecDeque<ModuleIdentity>,
    ) -> Result<ModuleRecord> {
        let path = self.resolver.path_for(module);
        debug!("Processing module {module} ({})", path.display());

        let source = std::fs::read_to_string(&path)
            .map_err(|source| BundleError::UnreadableFile { path, source })?;

        let transformed = self.transformer.transform(module, &source)?;

        let mut import_map = IndexMap::new();
        for site in &transformed.imports {
            if import_map.contains_key(&site.specifier) {
                continue;
            }
            let resolved = self.resolver.resolve(site, module)?;
            trace!("{module}: '{}' -> {resolved}", site.specifier);
            if !visited.contains(&resolved) {
                pending.push_back(resolved.clone());
            }
            import_map.insert(site.specifier.clone(), resolved);
        }

        Ok(ModuleRecord {
            identity: module.clone(),
            import_map,
            code: transformed.code,
        })
    }
}
