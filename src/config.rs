//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rstree/rstree.toml`
//! 3. Local config: `<dir>/.rstree.toml` (usually the working directory)
//! 4. Environment variables: `RSTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{RelationKind, StartInfo, DEFAULT_CHILDREN_KEY, INDEX_RELATION_KEY};

/// Unified configuration for rstree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Field holding child nodes (default: "children")
    pub children_key: String,
    /// Field whose values form `relation` chains; "index" means positional index
    pub relation_key: String,
    /// Chain used by path reconstruction (default: indexRelation)
    pub relation_field: RelationKind,
    /// Keep node metadata on reconstructed paths
    pub keep_node_info: bool,
    /// Field used as node label when rendering trees
    pub label_key: String,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            children_key: DEFAULT_CHILDREN_KEY.into(),
            relation_key: INDEX_RELATION_KEY.into(),
            relation_field: RelationKind::IndexRelation,
            keep_node_info: false,
            label_key: "name".into(),
            pretty: true,
        }
    }
}

/// Raw settings for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub children_key: Option<String>,
    pub relation_key: Option<String>,
    pub relation_field: Option<RelationKind>,
    pub keep_node_info: Option<bool>,
    pub label_key: Option<String>,
    pub pretty: Option<bool>,
}

/// Get the XDG config directory for rstree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rstree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rstree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".rstree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Starting configuration for traversals driven by these settings.
    pub fn start_info(&self) -> StartInfo {
        StartInfo::new()
            .with_children_key(self.children_key.clone())
            .with_relation_key(self.relation_key.as_str())
    }

    /// Merge overlay config onto self (base): overlay wins if Some.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            children_key: overlay
                .children_key
                .clone()
                .unwrap_or_else(|| self.children_key.clone()),
            relation_key: overlay
                .relation_key
                .clone()
                .unwrap_or_else(|| self.relation_key.clone()),
            relation_field: overlay.relation_field.unwrap_or(self.relation_field),
            keep_node_info: overlay.keep_node_info.unwrap_or(self.keep_node_info),
            label_key: overlay
                .label_key
                .clone()
                .unwrap_or_else(|| self.label_key.clone()),
            pretty: overlay.pretty.unwrap_or(self.pretty),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.rstree.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/rstree/rstree.toml`
    /// 3. Local config: `<local_dir>/.rstree.toml`
    /// 4. Environment variables: `RSTREE_*` prefix
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), local_dir)
    }

    /// Like [`Settings::load`], with an explicit global config file.
    ///
    /// `None` skips the global layer.
    pub fn load_from(
        global_path: Option<&Path>,
        local_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        Self::load_with_env(global_path, local_dir, Self::env_source())
    }

    pub(crate) fn load_with_env(
        global_path: Option<&Path>,
        local_dir: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_path.filter(|p| p.exists()) {
            debug!("load: global config {}", global_path.display());
            let raw = load_raw_settings(global_path)?;
            current = current.merge_with(&raw);
        }

        // 3. Local config
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("load: local config {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current, env)?;

        current.validate()?;
        Ok(current)
    }

    fn env_source() -> Environment {
        Environment::with_prefix("RSTREE")
            .prefix_separator("_")
            .separator("__")
    }

    /// Apply RSTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("children_key") {
            settings.children_key = val;
        }
        if let Ok(val) = config.get_string("relation_key") {
            settings.relation_key = val;
        }
        if let Ok(val) = config.get_string("relation_field") {
            settings.relation_field = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }
        if let Ok(val) = config.get_bool("keep_node_info") {
            settings.keep_node_info = val;
        }
        if let Ok(val) = config.get_string("label_key") {
            settings.label_key = val;
        }
        if let Ok(val) = config.get_bool("pretty") {
            settings.pretty = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.children_key.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "children_key must not be empty".into(),
            });
        }
        if self.relation_key.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "relation_key must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Render the effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
