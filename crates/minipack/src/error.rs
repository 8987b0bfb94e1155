//! Error types for the bundling pipeline
//!
//! Every failure aborts the whole build. The variants mirror the stages that can
//! fail: reading a file, parsing it, resolving one of its imports, and emitting
//! the bundle.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::types::ModuleIdentity;

/// Main error type for bundling operations
#[derive(Debug, Error)]
pub enum BundleError {
    /// A module file is missing or could not be read
    #[error("cannot read {}: {source}", path.display())]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The parser rejected a module's syntax
    #[error("failed to parse {module} at {line}:{column}: {message}")]
    ParseFailure {
        module: ModuleIdentity,
        message: String,
        line: usize,
        column: usize,
    },

    /// An import specifier does not point at an existing file
    #[error("cannot resolve '{specifier}' imported from {importer}:{line}:{column}")]
    UnresolvedImport {
        specifier: String,
        importer: ModuleIdentity,
        line: usize,
        column: usize,
    },

    /// The graph could not be turned into output text
    #[error("failed to generate bundle: {message}")]
    GenerationFailure { message: String },

    /// The finished bundle could not be written
    #[error("cannot write bundle to {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Discriminant of [`BundleError`], for callers that only care about the kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleErrorKind {
    UnreadableFile,
    ParseFailure,
    UnresolvedImport,
    GenerationFailure,
    OutputWrite,
}

impl BundleError {
    pub fn kind(&self) -> BundleErrorKind {
        match self {
            Self::UnreadableFile { .. } => BundleErrorKind::UnreadableFile,
            Self::ParseFailure { .. } => BundleErrorKind::ParseFailure,
            Self::UnresolvedImport { .. } => BundleErrorKind::UnresolvedImport,
            Self::GenerationFailure { .. } => BundleErrorKind::GenerationFailure,
            Self::OutputWrite { .. } => BundleErrorKind::OutputWrite,
        }
    }

    /// Create a generation failure
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationFailure {
            message: message.into(),
        }
    }
}

impl fmt::Display for BundleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnreadableFile => "unreadable file",
            Self::ParseFailure => "parse failure",
            Self::UnresolvedImport => "unresolved import",
            Self::GenerationFailure => "generation failure",
            Self::OutputWrite => "output write failure",
        };
        f.write_str(name)
    }
}

/// Result type alias for bundling operations
pub type Result<T> = std::result::Result<T, BundleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_import_message_names_location() {
        let err = BundleError::UnresolvedImport {
            specifier: "./missing".to_owned(),
            importer: ModuleIdentity::new("src/index.js"),
            line: 3,
            column: 1,
        };
        assert_eq!(err.kind(), BundleErrorKind::UnresolvedImport);
        assert_eq!(
            err.to_string(),
            "cannot resolve './missing' imported from src/index.js:3:1"
        );
    }

    #[test]
    fn test_generation_helper() {
        let err = BundleError::generation("entry is not part of the graph");
        assert_eq!(err.kind(), BundleErrorKind::GenerationFailure);
        assert_eq!(err.kind().to_string(), "generation failure");
    }
}
