use bevy::prelude::*;

use crate::catalog::ObjectCatalog;
use crate::solution::DEFAULT_HISTORY_SIZE;

pub const CONFIG_ENV: &str = "AFG_EDITOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "editor.json";

/// Editor settings. Every field may be left out of the config file.
#[derive(Resource, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo frames kept for the solution.
    pub history_size: usize,
    pub check_author: bool,
    pub catalog: ObjectCatalog,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            check_author: true,
            catalog: ObjectCatalog::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let mut cfg: EditorConfig =
            serde_json::from_str(contents).map_err(|e| format!("Invalid editor config: {}", e))?;
        if cfg.history_size == 0 {
            return Err("Invalid editor config: history_size must be at least 1".to_string());
        }
        cfg.catalog.explosive_groups.retain(|group| !group.is_empty());
        Ok(cfg)
    }
}

/// Path of the config file: `$AFG_EDITOR_CONFIG` if set, else `editor.json`.
pub fn config_path() -> String {
    std::env::var(CONFIG_ENV)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_editor_config() -> EditorConfig {
    load_editor_config_from(&config_path())
}

/// A missing file means defaults. A broken one is reported and ignored.
pub fn load_editor_config_from(path: &str) -> EditorConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match EditorConfig::from_json(&contents) {
            Ok(cfg) => {
                info!("[Config] Loaded editor config from {}", path);
                cfg
            }
            Err(e) => {
                warn!("[Config] Failed to parse {}: {}", path, e);
                EditorConfig::default()
            }
        },
        Err(_) => EditorConfig::default(),
    }
}
