use std::{
    io,
    path::{Path, PathBuf},
};

use log::trace;

use crate::{
    config::ResolveConfig,
    error::{BundleError, Result},
    types::{ImportSite, ModuleIdentity},
    util::{normalize_path, relative_path, to_slash_string},
};

/// Maps import specifiers to module identities and identities back to files
///
/// Resolution is purely path based: a specifier is joined to the importing
/// module's directory. There is no package lookup and no directory index
/// resolution; the only probing is appending the configured extensions.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// Absolute, normalized project root
    root: PathBuf,
    /// Extensions tried in order, without the leading dot
    extensions: Vec<String>,
}

impl ModuleResolver {
    pub fn new(root: impl Into<PathBuf>, config: &ResolveConfig) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self {
            root: normalize_path(&root),
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_owned())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Identity of a file given as an absolute path or a path relative to the root
    pub fn identity_for_path(&self, path: &Path) -> ModuleIdentity {
        let absolute = normalize_path(&self.root.join(path));
        ModuleIdentity::new(to_slash_string(&relative_path(&self.root, &absolute)))
    }

    /// Absolute path of the file a module identity names
    pub fn path_for(&self, identity: &ModuleIdentity) -> PathBuf {
        normalize_path(&self.root.join(identity.as_str()))
    }

    /// Identity of the entry module, failing if it is not a readable file
    pub fn resolve_entry(&self, entry: &Path) -> Result<ModuleIdentity> {
        let identity = self.identity_for_path(entry);
        let path = self.path_for(&identity);
        let metadata = std::fs::metadata(&path).map_err(|source| BundleError::UnreadableFile {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(BundleError::UnreadableFile {
                path,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
            });
        }
        Ok(identity)
    }

    /// Resolve an import found in `importer` to the identity of the imported file
    pub fn resolve(&self, site: &ImportSite, importer: &ModuleIdentity) -> Result<ModuleIdentity> {
        let importer_path = self.path_for(importer);
        let base_dir = importer_path.parent().unwrap_or(&self.root);
        let candidate = normalize_path(&base_dir.join(&site.specifier));

        let resolved = self
            .probe(&candidate)
            .ok_or_else(|| BundleError::UnresolvedImport {
                specifier: site.specifier.clone(),
                importer: importer.clone(),
                line: site.line,
                column: site.column,
            })?;

        let identity = ModuleIdentity::new(to_slash_string(&relative_path(&self.root, &resolved)));
        trace!("Resolved '{}' from {importer} to {identity}", site.specifier);
        Ok(identity)
    }

    /// The candidate itself if it is a file, else the first `candidate.ext` that is
    fn probe(&self, candidate: &Path) -> Option<PathBuf> {
        if candidate.is_file() {
            return Some(candidate.to_path_buf());
        }
        let file_name = candidate.file_name()?;
        self.extensions.iter().find_map(|ext| {
            let mut with_ext = file_name.to_os_string();
            with_ext.push(".");
            with_ext.push(ext);
            let path = candidate.with_file_name(with_ext);
            path.is_file().then_some(path)
        })
    }
}
