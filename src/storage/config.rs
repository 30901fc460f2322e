//! Configuration handling for fabrik
//!
//! Configuration is stored in `.fabrik/config.toml` (project) and
//! `~/.config/fabrik/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ActiveVersionPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// How the active nomenclature version is selected per parent product
    pub active_version_policy: ActiveVersionPolicy,

    /// Stock levels at or below this value are marked low in reports
    pub low_stock_threshold: Decimal,

    /// Default unit of measure for `fabrik product add`
    pub default_unit: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            active_version_policy: ActiveVersionPolicy::Latest,
            low_stock_threshold: Decimal::TEN,
            default_unit: "pcs".to_string(),
        }
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: DefaultFormat,
}

/// Default output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DefaultFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project_root = Self::find_project_root();
        let project = match &project_root {
            Some(root) => Self::load_project_config(root)?,
            None => ProjectConfig::default(),
        };

        Ok(Self {
            project,
            global,
            project_root,
        })
    }

    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "fabrik", "fabrik-cli").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(".fabrik").join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")
    }

    /// Finds the project root by looking for a `.fabrik/` directory
    pub fn find_project_root() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            if current.join(".fabrik").is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the project root, or an error if not in a project
    pub fn require_project_root(&self) -> Result<&Path> {
        self.project_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in a fabrik project. Run 'fabrik init' first."))
    }

    /// Saves the project configuration
    pub fn save_project(&self) -> Result<()> {
        let root = self.require_project_root()?;
        let config_path = root.join(".fabrik").join("config.toml");

        let content =
            toml::to_string_pretty(&self.project).context("Failed to serialize project config")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write project config: {}", config_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        };

        assert_eq!(
            config.project.active_version_policy,
            ActiveVersionPolicy::Latest
        );
        assert_eq!(config.project.low_stock_threshold, Decimal::TEN);
        assert_eq!(config.project.default_unit, "pcs");
        assert_eq!(config.global.default_format, DefaultFormat::Text);
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
active_version_policy = "flagged"
low_stock_threshold = "2.5"
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.active_version_policy, ActiveVersionPolicy::Flagged);
        assert_eq!(
            config.low_stock_threshold,
            "2.5".parse::<Decimal>().unwrap()
        );
        // Missing fields fall back to defaults
        assert_eq!(config.default_unit, "pcs");
    }

    #[test]
    fn missing_project_config_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_project_config(dir.path()).unwrap();

        assert_eq!(config.active_version_policy, ActiveVersionPolicy::Latest);
    }

    #[test]
    fn project_config_roundtrips_through_toml() {
        let mut project = ProjectConfig::default();
        project.active_version_policy = ActiveVersionPolicy::Flagged;
        project.low_stock_threshold = "7.25".parse().unwrap();

        let toml = toml::to_string_pretty(&project).unwrap();
        let parsed: ProjectConfig = toml::from_str(&toml).unwrap();

        assert_eq!(parsed.active_version_policy, project.active_version_policy);
        assert_eq!(parsed.low_stock_threshold, project.low_stock_threshold);
    }
}
