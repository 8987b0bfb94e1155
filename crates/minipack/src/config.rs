//! Bundler configuration
//!
//! A [`Config`] is built once at startup and handed to the orchestrator by
//! reference. Sources are layered, later ones overriding earlier ones:
//!
//! 1. built-in defaults
//! 2. the user config file (`~/.config/minipack/minipack.toml` on Linux)
//! 3. the project config file (`--config`, or `minipack.toml` in the project root)
//! 4. `MINIPACK_*` environment variables
//! 5. command-line flags (applied by the binary)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::dirs;

pub const ENV_ENTRY: &str = "MINIPACK_ENTRY";
pub const ENV_OUTPUT_PATH: &str = "MINIPACK_OUTPUT_PATH";
pub const ENV_OUTPUT_FILENAME: &str = "MINIPACK_OUTPUT_FILENAME";
pub const ENV_CACHE_MODULES: &str = "MINIPACK_CACHE_MODULES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Entry module, relative to the project root
    pub entry: PathBuf,
    pub output: OutputConfig,
    pub resolve: ResolveConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory, relative to the project root
    pub path: PathBuf,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Extensions (without the dot) tried when a specifier names no existing file
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Execute each module once and hand out the same `exports` to every importer
    pub cache_modules: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: PathBuf::from("./src/index.js"),
            output: OutputConfig::default(),
            resolve: ResolveConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./dist"),
            filename: "bundle.js".to_owned(),
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["js".to_owned()],
        }
    }
}

/// On-disk shape of a config file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    entry: Option<PathBuf>,
    output: Option<OutputFile>,
    resolve: Option<ResolveFile>,
    runtime: Option<RuntimeFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputFile {
    path: Option<PathBuf>,
    filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResolveFile {
    extensions: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuntimeFile {
    cache_modules: Option<bool>,
}

impl Config {
    /// Load configuration for the project rooted at `project_root`
    ///
    /// An explicit `config_path` must exist; the implicit user and project files
    /// are skipped when absent.
    pub fn load(config_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_file) = dirs::get_user_config_file().filter(|f| f.is_file()) {
            config.merge_file(&user_file)?;
        }

        match config_path {
            Some(path) => config.merge_file(path)?,
            None => {
                let project_file = project_root.join(dirs::CONFIG_FILE_NAME);
                if project_file.is_file() {
                    config.merge_file(&project_file)?;
                }
            }
        }

        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overlay the keys present in a TOML config file
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        self.merge_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(())
    }

    /// Overlay the keys present in a TOML document
    pub fn merge_toml(&mut self, content: &str) -> Result<()> {
        let file: ConfigFile = toml::from_str(content)?;

        if let Some(entry) = file.entry {
            self.entry = entry;
        }
        if let Some(output) = file.output {
            if let Some(path) = output.path {
                self.output.path = path;
            }
            if let Some(filename) = output.filename {
                self.output.filename = filename;
            }
        }
        if let Some(extensions) = file.resolve.and_then(|r| r.extensions) {
            self.resolve.extensions = extensions;
        }
        if let Some(cache_modules) = file.runtime.and_then(|r| r.cache_modules) {
            self.runtime.cache_modules = cache_modules;
        }
        Ok(())
    }

    /// Overlay `MINIPACK_*` variables looked up through `lookup`
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(entry) = lookup(ENV_ENTRY) {
            self.entry = PathBuf::from(entry);
        }
        if let Some(path) = lookup(ENV_OUTPUT_PATH) {
            self.output.path = PathBuf::from(path);
        }
        if let Some(filename) = lookup(ENV_OUTPUT_FILENAME) {
            self.output.filename = filename;
        }
        if let Some(value) = lookup(ENV_CACHE_MODULES) {
            self.runtime.cache_modules = parse_bool(&value)
                .ok_or_else(|| anyhow!("{ENV_CACHE_MODULES} must be a boolean, got '{value}'"))?;
        }
        Ok(())
    }

    /// Absolute path of the bundle file
    pub fn output_file(&self, project_root: &Path) -> PathBuf {
        project_root
            .join(&self.output.path)
            .join(&self.output.filename)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
