//! Runtime configuration for the planner and its caches.
//!
//! Every field has a default, so a JSON file only needs the settings it
//! changes:
//!
//! ```json
//! { "cache": { "enabled": false } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShapeError};

/// Top-level configuration for a [`QueryPlanner`](crate::planner::QueryPlanner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Applied to both the query and the subquery cache.
    pub cache: CacheConfig,
    /// Fetch each distinct leaf fingerprint once per statement.
    pub dedup_subqueries: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            dedup_subqueries: true,
        }
    }
}

impl PlannerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ShapeError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }
}

/// Plan cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// When false every lookup misses and every plan is regenerated.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PlannerConfig::default();
        assert!(config.cache.enabled);
        assert!(config.dedup_subqueries);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PlannerConfig::from_json_str(r#"{ "cache": { "enabled": false } }"#).unwrap();
        assert!(!config.cache.enabled);
        assert!(config.dedup_subqueries);

        let config = PlannerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PlannerConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = PlannerConfig::from_json_str(r#"{ "cache_size": 10 }"#).unwrap_err();
        assert!(matches!(err, ShapeError::Json(_)));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = PlannerConfig::from_json_file("/nonexistent/sqlshape.json").unwrap_err();
        assert!(matches!(err, ShapeError::Config(_)));
    }
}
