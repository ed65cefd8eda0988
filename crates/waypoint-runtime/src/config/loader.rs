//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML configuration files (`waypoint.toml`, `config.toml`)
//! - `yaml-config`: enables YAML configuration files (`waypoint.yaml`, `waypoint.yml`)
//!
//! Both features can be enabled simultaneously; if so, both file formats are searched and loaded.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides ([`ConfigLoader::merge`])
//! 3. Profile-specific config file (`waypoint.{profile}.toml`)
//! 4. Main config file (`waypoint.toml`)
//! 5. Environment variables (`WAYPOINT_*`)
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `WAYPOINT_` prefix with `__` as the nesting separator:
//!
//! - `WAYPOINT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `WAYPOINT_ROUTING__SLOW_TURN_WARN_MS=250` → `routing.slow_turn_warn_ms = 250`
//!
//! `WAYPOINT_PROFILE` selects the profile and is not treated as a setting.
//!
//! # Example
//!
//! ```rust,ignore
//! use waypoint_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .file("./config/waypoint.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::WaypointConfig;

/// Environment variable prefix for settings.
const ENV_PREFIX: &str = "WAYPOINT_";

/// Environment variable selecting the profile.
const PROFILE_ENV: &str = "WAYPOINT_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name; unknown names become [`Profile::Custom`].
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads the profile from `WAYPOINT_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|name| Self::parse(&name))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides.
    figment: Figment,
    profile: Profile,
    /// Directories searched for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load `WAYPOINT_*` environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Adds the user config directory (e.g. `~/.config/waypoint`) to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(config_dir) => self.search_path(config_dir.join("waypoint")),
            None => self,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: WaypointConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<WaypointConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: WaypointConfig = figment.extract()?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(WaypointConfig::default()));
        figment = figment.merge(std::mem::take(&mut self.figment));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["profile"]).split("__"));
        }

        Ok(figment)
    }

    /// Merges a single config file, dispatching on its extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("waypoint"));
        }
        paths
    }

    /// Searches one file format across `search_paths × base_names`.
    ///
    /// A profile-specific variant is merged before its base file. Stops at the
    /// first base file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return (merge_fn(figment, &base_path), true);
                }
            }
        }
        (figment, false)
    }

    /// Searches for and loads configuration files from the search paths.
    #[cfg_attr(
        not(any(feature = "toml-config", feature = "yaml-config")),
        allow(unused_mut)
    )]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["waypoint.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["waypoint.yaml", "waypoint.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            debug!(paths = ?search_paths, "No configuration file found, using defaults");
        }
        figment
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<WaypointConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<WaypointConfig> {
    let path = path.as_ref();
    if path.extension().is_none() {
        warn!(path = %path.display(), "Configuration file has no extension");
    }
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogLevel, RoutingConfig};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("waypoint-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults_when_nothing_found() {
        let dir = scratch_dir("empty");
        let config = ConfigLoader::new()
            .without_env()
            .search_path(&dir)
            .load()
            .unwrap();

        assert_eq!(config, WaypointConfig::default());
        assert_eq!(config.logging.level.as_str(), "info");
        assert!(config.routing.trace_paths);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here/waypoint.toml")
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_programmatic_merge() {
        let mut overrides = WaypointConfig::default();
        overrides.routing = RoutingConfig {
            trace_paths: false,
            slow_turn_warn_ms: 0,
            cancel_on_error: true,
        };

        let config = ConfigLoader::new()
            .without_env()
            .search_path(scratch_dir("merge"))
            .merge(overrides.clone())
            .load()
            .unwrap();
        assert_eq!(config.routing, overrides.routing);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_then_base_file() {
        let dir = scratch_dir("toml");
        std::fs::write(
            dir.join("waypoint.staging.toml"),
            "[routing]\nslow_turn_warn_ms = 250\ncancel_on_error = true\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("waypoint.toml"),
            "[logging]\nlevel = \"debug\"\n\n[routing]\nslow_turn_warn_ms = 500\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .profile("staging")
            .search_path(&dir)
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        // The base file wins over the profile file.
        assert_eq!(config.routing.slow_turn_warn_ms, 500);
        assert!(config.routing.cancel_on_error);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = scratch_dir("ext");
        let path = dir.join("waypoint.ini");
        std::fs::write(&path, "level=debug").unwrap();

        let result = ConfigLoader::new().without_env().file(&path).load();
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("prod"), Profile::Production);
        assert_eq!(Profile::parse("DEV"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
