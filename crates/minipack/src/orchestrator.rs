//! Drives one bundling run from configuration to the written output file

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::{
    code_generator::{CodeGenerator, RuntimeOptions},
    config::Config,
    error::{BundleError, Result},
    graph_builder::GraphBuilder,
    module_graph::DependencyGraph,
    module_transformer::{ModuleTransformer, OxcTransformer},
    resolver::ModuleResolver,
    types::ModuleIdentity,
    util::normalize_path,
};

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOutput {
    pub entry: ModuleIdentity,
    pub module_count: usize,
    /// Absolute path of the written bundle
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct BundleOrchestrator<'a> {
    config: &'a Config,
    project_root: PathBuf,
    resolver: ModuleResolver,
}

impl<'a> BundleOrchestrator<'a> {
    pub fn new(config: &'a Config, project_root: impl Into<PathBuf>) -> Self {
        let resolver = ModuleResolver::new(project_root, &config.resolve);
        Self {
            config,
            project_root: resolver.root().to_path_buf(),
            resolver,
        }
    }

    /// Resolve the configured entry and collect everything it imports
    pub fn build_graph(&self) -> Result<(ModuleIdentity, DependencyGraph)> {
        self.build_graph_with(&OxcTransformer)
    }

    /// [`Self::build_graph`] with a caller-supplied transformer
    pub fn build_graph_with(
        &self,
        transformer: &dyn ModuleTransformer,
    ) -> Result<(ModuleIdentity, DependencyGraph)> {
        let entry = self.resolver.resolve_entry(&self.config.entry)?;
        debug!("Entry module: {entry}");
        let graph = GraphBuilder::new(&self.resolver, transformer).build(&entry)?;
        Ok((entry, graph))
    }

    /// Produce the bundle text without touching the output directory
    pub fn generate_bundle(&self) -> Result<(ModuleIdentity, DependencyGraph, String)> {
        let (entry, graph) = self.build_graph()?;
        let options = RuntimeOptions::from(&self.config.runtime);

        if !options.cache_modules {
            for cycle in graph.find_cycles() {
                let names: Vec<&str> = cycle.iter().map(ModuleIdentity::as_str).collect();
                warn!(
                    "Circular import between {}; the bundle will recurse without end when run \
                     unless runtime.cache_modules is enabled",
                    names.join(" -> ")
                );
            }
        }

        let code = CodeGenerator::new(options).generate(&graph, &entry)?;
        Ok((entry, graph, code))
    }

    /// Run the whole pipeline and write the bundle
    ///
    /// Nothing is written unless every earlier stage succeeded.
    pub fn bundle(&self) -> Result<BundleOutput> {
        let (entry, graph, code) = self.generate_bundle()?;
        let path = normalize_path(&self.config.output_file(&self.project_root));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| BundleError::OutputWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, code).map_err(|source| BundleError::OutputWrite {
            path: path.clone(),
            source,
        })?;

        info!(
            "Bundled {} modules from {entry} into {}",
            graph.len(),
            path.display()
        );
        Ok(BundleOutput {
            entry,
            module_count: graph.len(),
            path,
        })
    }
}
