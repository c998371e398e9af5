//! Application defaults, loadable from a JSON file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE_NAME: &str = "space.json";

/// What the import does when one file fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParsePolicy {
    /// Abort the whole batch on the first malformed file.
    #[default]
    AbortBatch,
    /// Log the malformed file, record it as skipped and continue.
    SkipFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavingOptions {
    pub save: bool,
    pub by_type: bool,
    pub by_class: bool,
    pub by_subclass: bool,
}

impl Default for SavingOptions {
    fn default() -> Self {
        Self {
            save: true,
            by_type: true,
            by_class: true,
            by_subclass: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpaceConfig {
    pub app_name: String,
    pub app_version: String,
    pub pca_by_default: bool,
    pub default_pca_dimensions: usize,
    pub normalize_by_default: bool,
    pub default_kmeans_k: usize,
    pub default_dbscan_eps: f64,
    pub default_dbscan_min_pts: usize,
    pub parse_policy: ParsePolicy,
    pub kmeans_saving: SavingOptions,
    pub dbscan_saving: SavingOptions,
    pub metadata_category: Option<String>,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            app_name: "SpACE".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            pca_by_default: true,
            default_pca_dimensions: 8,
            normalize_by_default: false,
            default_kmeans_k: 8,
            default_dbscan_eps: 1.0,
            default_dbscan_min_pts: 3,
            parse_policy: ParsePolicy::AbortBatch,
            kmeans_saving: SavingOptions::default(),
            dbscan_saving: SavingOptions::default(),
            metadata_category: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn load_config(config_path: impl AsRef<Path>) -> Result<SpaceConfig, ConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ParsePolicy, SpaceConfig, load_config};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_application_presets() {
        let config = SpaceConfig::default();
        assert_eq!(config.app_name, "SpACE");
        assert!(config.pca_by_default);
        assert_eq!(config.default_pca_dimensions, 8);
        assert_eq!(config.default_kmeans_k, 8);
        assert_eq!(config.default_dbscan_eps, 1.0);
        assert_eq!(config.default_dbscan_min_pts, 3);
        assert_eq!(config.parse_policy, ParsePolicy::AbortBatch);
        assert!(config.kmeans_saving.by_subclass);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_keys() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("space.json");
        fs::write(
            &path,
            r#"{
                "defaultKmeansK": 4,
                "parsePolicy": "skipFile",
                "dbscanSaving": { "byClass": false },
                "metadataCategory": "Type"
            }"#,
        )
        .expect("config should be written");

        let config = load_config(&path).expect("config should load");
        assert_eq!(config.default_kmeans_k, 4);
        assert_eq!(config.parse_policy, ParsePolicy::SkipFile);
        assert!(config.dbscan_saving.save);
        assert!(!config.dbscan_saving.by_class);
        assert_eq!(config.metadata_category.as_deref(), Some("Type"));
        assert_eq!(config.default_pca_dimensions, 8);
    }

    #[test]
    fn load_reports_read_and_parse_failures() {
        let temp = TempDir::new().expect("tempdir should be created");
        let missing = temp.path().join("missing.json");
        match load_config(&missing).expect_err("missing file should fail") {
            ConfigError::Read { path, .. } => assert_eq!(path, missing),
            other => panic!("expected Read error, got {other:?}"),
        }

        let broken = temp.path().join("broken.json");
        fs::write(&broken, "{ not json").expect("config should be written");
        assert!(matches!(
            load_config(&broken).expect_err("broken json should fail"),
            ConfigError::Parse { .. }
        ));
    }
}
