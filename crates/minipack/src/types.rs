//! Shared type definitions for the minipack crate
//!
//! These are the keys the rest of the bundler agrees on: a module is named by
//! its project-root-relative path, an import by the literal string written at
//! the import site.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// The literal string written in an import statement, e.g. `"./utils"`
///
/// Only meaningful relative to the directory of the module that contains it.
pub type ImportSpecifier = String;

/// Canonical name of a module: its path relative to the project root
///
/// Always uses `/` as separator and never contains `.` components; `..` only
/// appears as a leading run for files outside the root. Two imports that end up
/// at the same file produce equal identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleIdentity(String);

impl ModuleIdentity {
    /// Wrap an already-normalized relative path
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModuleIdentity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ModuleIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One import discovered in a module's source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    pub specifier: ImportSpecifier,
    /// 1-based line of the import statement
    pub line: usize,
    /// 1-based column of the import statement
    pub column: usize,
}
