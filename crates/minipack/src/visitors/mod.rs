//! Read-only passes over a parsed module

pub mod import_discovery;

pub use import_discovery::discover_imports;
