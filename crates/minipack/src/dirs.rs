use std::path::PathBuf;

use etcetera::{BaseStrategy, choose_base_strategy};

/// Name of the configuration file looked up in the user and project directories
pub const CONFIG_FILE_NAME: &str = "minipack.toml";

/// Directory holding the per-user configuration, e.g. `~/.config/minipack`
pub fn get_user_config_dir() -> Option<PathBuf> {
    choose_base_strategy()
        .ok()
        .map(|strategy| strategy.config_dir().join("minipack"))
}

/// Full path of the per-user configuration file
pub fn get_user_config_file() -> Option<PathBuf> {
    get_user_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
