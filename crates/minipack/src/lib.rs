//! minipack: bundle an ES module graph into one self-contained script
//!
//! The pipeline is resolve entry → [`graph_builder`] → [`code_generator`],
//! driven by [`orchestrator::BundleOrchestrator`].

pub mod ast_transformer;
pub mod code_generator;
pub mod config;
pub mod dirs;
pub mod error;
pub mod graph_builder;
pub mod module_graph;
pub mod module_transformer;
pub mod orchestrator;
pub mod resolver;
pub mod types;
pub mod util;
pub mod visitors;

pub use error::{BundleError, BundleErrorKind};
