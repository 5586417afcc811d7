//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::Config;
use crate::resolver::MalformedSourcePolicy;
use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File holding each tier's settings.
pub const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Compiled-in defaults (lowest priority)
    Defaults = 0,
    /// Project-level config ($CWD/rdbms-config/)
    Project = 1,
    /// User-level config (~/.rdbms-config/)
    User = 2,
    /// Environment variables (highest priority)
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for each file tier.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration directories from the environment and defaults.
    pub fn discover() -> Self {
        let project_dir = std::env::var("RDBMS_CONFIG_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("rdbms-config")));

        let user_dir = std::env::var("RDBMS_CONFIG_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".rdbms-config")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Loads and merges configuration tiers.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Files that contributed, lowest tier first.
    sources: Vec<(ConfigTier, PathBuf)>,
}

impl ConfigLoader {
    /// Load configuration from all tiers using the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with_env(ConfigPaths::discover(), |key| std::env::var(key).ok())
    }

    /// Load configuration with explicit paths and the process environment.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        Self::load_with_env(paths, |key| std::env::var(key).ok())
    }

    /// Load configuration with explicit paths and an environment lookup.
    pub fn load_with_env<F>(paths: ConfigPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut sources = Vec::new();

        let mut config = if let Some(explicit) = env("RDBMS_CONFIG_PATH") {
            let path = PathBuf::from(explicit);
            let config = Config::load(&path)
                .with_context(|| format!("failed to load config file {}", path.display()))?;
            sources.push((ConfigTier::Environment, path));
            config
        } else {
            let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];

            for (tier, dir) in [
                (ConfigTier::Project, paths.project_dir.as_deref()),
                (ConfigTier::User, paths.user_dir.as_deref()),
            ] {
                if let Some(dir) = dir
                    && let Some((path, value)) = read_tier(dir)?
                {
                    debug!(tier = %tier, path = %path.display(), "Loaded config tier");
                    tiers.push(value);
                    sources.push((tier, path));
                }
            }

            serde_json::from_value(deep_merge_all(tiers))
                .context("merged configuration is invalid")?
        };

        apply_env_overrides(&mut config, &env)?;
        config.validate()?;

        Ok(Self {
            paths,
            config,
            sources,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Config files that were merged, lowest tier first.
    pub fn sources(&self) -> &[(ConfigTier, PathBuf)] {
        &self.sources
    }
}

/// Read `config.yaml` from a tier directory, if present.
fn read_tier(dir: &Path) -> Result<Option<(PathBuf, Value)>> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some((path, value)))
}

/// Apply `RDBMS_CONFIG_*` environment overrides.
fn apply_env_overrides<F>(config: &mut Config, env: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(db_path) = env("RDBMS_CONFIG_DB_PATH") {
        config.store.db_path = PathBuf::from(db_path);
    }

    if let Some(table) = env("RDBMS_CONFIG_TABLE") {
        config.store.table = table;
    }

    if let Some(timeout) = env("RDBMS_CONFIG_BUSY_TIMEOUT_MS") {
        config.store.busy_timeout_ms = timeout
            .trim()
            .parse()
            .map_err(|_| anyhow!("RDBMS_CONFIG_BUSY_TIMEOUT_MS: not a number: {:?}", timeout))?;
    }

    if let Some(policy) = env("RDBMS_CONFIG_MALFORMED_SOURCE") {
        config.resolver.malformed_source = policy
            .parse::<MalformedSourcePolicy>()
            .map_err(|e| anyhow!("RDBMS_CONFIG_MALFORMED_SOURCE: {}", e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn config_paths_discover() {
        let paths = ConfigPaths::discover();
        assert!(paths.project_dir.is_some());
    }

    #[test]
    fn load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_env(paths, no_env).unwrap();

        assert_eq!(loader.config().store.table, "config");
        assert_eq!(loader.config().store.busy_timeout_ms, 5000);
        assert!(loader.sources().is_empty());
    }

    #[test]
    fn env_overrides_win_over_files() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join(CONFIG_FILE), "store:\n  table: from_file\n").unwrap();

        let vars: HashMap<&str, &str> = [
            ("RDBMS_CONFIG_TABLE", "from_env"),
            ("RDBMS_CONFIG_MALFORMED_SOURCE", "abort"),
            ("RDBMS_CONFIG_BUSY_TIMEOUT_MS", "750"),
        ]
        .into_iter()
        .collect();

        let loader = ConfigLoader::load_with_env(
            ConfigPaths::with_dirs(Some(project), None),
            |key| vars.get(key).map(|v| v.to_string()),
        )
        .unwrap();

        let config = loader.config();
        assert_eq!(config.store.table, "from_env");
        assert_eq!(config.store.busy_timeout_ms, 750);
        assert_eq!(config.resolver.malformed_source, MalformedSourcePolicy::Abort);
    }

    #[test]
    fn invalid_env_policy_is_an_error() {
        let result = ConfigLoader::load_with_env(ConfigPaths::with_dirs(None, None), |key| {
            (key == "RDBMS_CONFIG_MALFORMED_SOURCE").then(|| "ignore".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn unparsable_tier_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "store: [unclosed\n").unwrap();

        let result = ConfigLoader::load_with_env(
            ConfigPaths::with_dirs(Some(temp.path().into()), None),
            no_env,
        );
        assert!(result.is_err());
    }
}
