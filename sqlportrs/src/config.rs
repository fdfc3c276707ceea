//! Configuration system for sqlport.
//!
//! Supports TOML-based configuration with global defaults and per-datasource overrides.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{Result, SqlportError};
use crate::naming::NamingConvention;
use crate::timezone::parse_timezone;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SqlportConfig {
    /// Global defaults applied to all datasources unless overridden.
    pub defaults: GlobalDefaults,

    pub statistics: StatisticsConfig,

    pub naming: NamingConvention,

    /// Per-datasource configuration overrides (keyed by datasource name).
    #[serde(default)]
    pub datasources: HashMap<String, DatasourceConfig>,
}

/// Global default settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalDefaults {
    pub dialect: Dialect,
    /// IANA zone used when a caller has none configured.
    pub timezone: String,
}

/// Statistics query settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Feedback rating counted as satisfied (default: "like").
    pub feedback_rating: String,
    /// Currency reported alongside token costs (default: "USD").
    pub currency: String,
}

/// Per-datasource configuration (can override globals).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatasourceConfig {
    pub dialect: Option<Dialect>,
    pub timezone: Option<String>,
}

impl Default for GlobalDefaults {
    fn default() -> Self {
        Self {
            dialect: Dialect::PostgreSql,
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            feedback_rating: "like".to_string(),
            currency: "USD".to_string(),
        }
    }
}

impl SqlportConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SqlportError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(toml_str)
            .map_err(|e| SqlportError::Config(format!("failed to parse config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from default locations (env var, cwd, user config dir, or defaults).
    ///
    /// Search order:
    /// 1. `SQLPORT_CONFIG` environment variable
    /// 2. `./sqlport.toml` (current directory)
    /// 3. `~/.config/sqlport/config.toml` (user config dir)
    /// 4. Built-in defaults
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("SQLPORT_CONFIG") {
            match Self::from_file(&path) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "loaded config from SQLPORT_CONFIG");
                    return cfg;
                }
                Err(e) => tracing::warn!(path = %path, error = %e, "ignoring SQLPORT_CONFIG"),
            }
        }

        if let Ok(cfg) = Self::from_file("sqlport.toml") {
            tracing::info!("loaded config from ./sqlport.toml");
            return cfg;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sqlport").join("config.toml");
            if let Ok(cfg) = Self::from_file(&user_config) {
                tracing::info!(path = %user_config.display(), "loaded config from user config dir");
                return cfg;
            }
        }

        tracing::debug!("no config file found, using defaults");
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        parse_timezone(&self.defaults.timezone)
            .map_err(|e| SqlportError::Config(format!("defaults.timezone: {e}")))?;
        for (name, ds) in &self.datasources {
            if let Some(tz) = &ds.timezone {
                parse_timezone(tz)
                    .map_err(|e| SqlportError::Config(format!("datasources.{name}.timezone: {e}")))?;
            }
        }
        Ok(())
    }

    /// Get resolved config for a specific datasource (merges global defaults).
    pub fn for_datasource(&self, name: &str) -> ResolvedDatasourceConfig {
        let ds_config = self.datasources.get(name);
        ResolvedDatasourceConfig::merge(&self.defaults, ds_config)
    }
}

/// Fully resolved configuration for a datasource (no Option fields).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDatasourceConfig {
    pub dialect: Dialect,
    pub timezone: String,
}

impl ResolvedDatasourceConfig {
    fn merge(defaults: &GlobalDefaults, override_cfg: Option<&DatasourceConfig>) -> Self {
        match override_cfg {
            Some(ds) => Self {
                dialect: ds.dialect.unwrap_or(defaults.dialect),
                timezone: ds
                    .timezone
                    .clone()
                    .unwrap_or_else(|| defaults.timezone.clone()),
            },
            None => Self {
                dialect: defaults.dialect,
                timezone: defaults.timezone.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SqlportConfig::default();
        assert_eq!(cfg.defaults.dialect, Dialect::PostgreSql);
        assert_eq!(cfg.defaults.timezone, "UTC");
        assert_eq!(cfg.statistics.feedback_rating, "like");
        assert_eq!(cfg.statistics.currency, "USD");
        assert_eq!(cfg.naming.index, "{table}_{column}_idx");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[defaults]
dialect = "mysql"
timezone = "Europe/Berlin"

[statistics]
currency = "EUR"

[naming]
index = "ix_{table}_{column}"

[datasources.legacy]
dialect = "oracle"
"#;
        let cfg = SqlportConfig::from_toml(toml).unwrap();
        assert_eq!(cfg.defaults.dialect, Dialect::MySql);
        assert_eq!(cfg.statistics.currency, "EUR");
        assert_eq!(cfg.statistics.feedback_rating, "like");
        assert_eq!(cfg.naming.index_name("a", "b"), "ix_a_b");

        let resolved = cfg.for_datasource("legacy");
        assert_eq!(resolved.dialect, Dialect::Oracle);
        assert_eq!(resolved.timezone, "Europe/Berlin");
    }

    #[test]
    fn test_datasource_override() {
        let toml = r#"
[datasources.apac]
timezone = "Asia/Tokyo"
"#;
        let cfg = SqlportConfig::from_toml(toml).unwrap();

        let default_resolved = cfg.for_datasource("unknown");
        assert_eq!(default_resolved.dialect, Dialect::PostgreSql);
        assert_eq!(default_resolved.timezone, "UTC");

        let apac = cfg.for_datasource("apac");
        assert_eq!(apac.timezone, "Asia/Tokyo");
    }

    #[test]
    fn test_unknown_dialect_rejected() {
        let err = SqlportConfig::from_toml("[defaults]\ndialect = \"sqlite\"\n").unwrap_err();
        assert!(matches!(err, SqlportError::Config(msg) if msg.contains("unsupported dialect")));
    }

    #[test]
    fn test_bad_timezone_rejected() {
        let err = SqlportConfig::from_toml("[datasources.x]\ntimezone = \"Nowhere/Land\"\n")
            .unwrap_err();
        assert!(matches!(err, SqlportError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sqlport.toml");
        std::fs::write(&path, "[statistics]\nfeedback_rating = \"thumbs_up\"\n").unwrap();
        let cfg = SqlportConfig::from_file(&path).unwrap();
        assert_eq!(cfg.statistics.feedback_rating, "thumbs_up");
    }
}
