use super::CliError;
use anyhow::Context;
use serde::Serialize;
use space_core::common::config::{
    ConfigError, DEFAULT_CONFIG_FILE_NAME, SavingOptions, SpaceConfig, load_config,
};
use space_core::domain::SpaceError;
use space_core::modules::composition::{CategoryRule, CompositionTable, TaxonomyDepth};
use space_core::modules::pipeline::ImportedBatch;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub(super) fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (in-process tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// An explicit `--config` must load; otherwise `space.json` in the working
/// directory is used when present.
pub(super) fn load_effective_config(explicit: Option<&Path>) -> Result<SpaceConfig, CliError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidate = PathBuf::from(DEFAULT_CONFIG_FILE_NAME);
            if !candidate.is_file() {
                return Ok(SpaceConfig::default());
            }
            candidate
        }
    };

    let config = load_config(&path).map_err(|error| match error {
        ConfigError::Read { .. } => {
            CliError::Pipeline(SpaceError::io_system("IO.CONFIG_READ", error.to_string()))
        }
        ConfigError::Parse { .. } => {
            CliError::Pipeline(SpaceError::invalid_input("INPUT.CONFIG_PARSE", error.to_string()))
        }
    })?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

pub(super) fn ensure_output_dir(dir: &Path) -> Result<(), CliError> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;
    Ok(())
}

/// Composition rules enabled by the saving options plus an optional descriptor.
pub(super) fn category_rules(
    saving: &SavingOptions,
    descriptor: Option<&str>,
) -> Vec<CategoryRule> {
    let mut rules: Vec<CategoryRule> = TaxonomyDepth::ALL
        .into_iter()
        .filter(|depth| match depth {
            TaxonomyDepth::Type => saving.by_type,
            TaxonomyDepth::Class => saving.by_class,
            TaxonomyDepth::Subclass => saving.by_subclass,
        })
        .map(CategoryRule::FilenameTaxonomy)
        .collect();
    if let Some(descriptor) = descriptor.map(str::trim).filter(|name| !name.is_empty()) {
        rules.push(CategoryRule::Metadata(descriptor.to_string()));
    }
    rules
}

pub(super) fn rule_label(rule: &CategoryRule) -> String {
    match rule {
        CategoryRule::FilenameTaxonomy(depth) => depth.as_str().to_string(),
        CategoryRule::Metadata(descriptor) => format!("metadata '{}'", descriptor),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ImportSummary {
    pub(super) records: usize,
    pub(super) skipped: Vec<SkippedSummary>,
    pub(super) common_range: [f64; 2],
    pub(super) reference_source: String,
    pub(super) reference_points: usize,
    pub(super) normalized: bool,
    pub(super) matrix_rows: usize,
    pub(super) matrix_columns: usize,
    pub(super) column_kind: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SkippedSummary {
    pub(super) path: String,
    pub(super) placeholder: &'static str,
    pub(super) message: String,
}

impl ImportSummary {
    pub(super) fn new(
        imported: &ImportedBatch,
        matrix_rows: usize,
        matrix_columns: usize,
        column_kind: &'static str,
    ) -> Self {
        let reference_source = imported
            .batch
            .records()
            .get(imported.reference_axis.record_index)
            .map(|record| record.file_name())
            .unwrap_or_default();
        Self {
            records: imported.batch.len(),
            skipped: imported
                .skipped
                .iter()
                .map(|skipped| SkippedSummary {
                    path: skipped.path.display().to_string(),
                    placeholder: skipped.error.placeholder(),
                    message: skipped.error.message().to_string(),
                })
                .collect(),
            common_range: [imported.common_range.min, imported.common_range.max],
            reference_source,
            reference_points: imported.reference_axis.len(),
            normalized: imported.normalized,
            matrix_rows,
            matrix_columns,
            column_kind,
        }
    }

    pub(super) fn render_human(&self) -> String {
        let mut lines = vec![
            format!("Imported {} records.", self.records),
            format!(
                "Common wavelength range: {} to {}",
                self.common_range[0], self.common_range[1]
            ),
            format!(
                "Reference axis: {} points from '{}'",
                self.reference_points, self.reference_source
            ),
            format!(
                "Data block: {} x {} ({})",
                self.matrix_rows, self.matrix_columns, self.column_kind
            ),
        ];
        if self.normalized {
            lines.push("Linear normalization applied.".to_string());
        }
        for skipped in &self.skipped {
            lines.push(format!(
                "Skipped '{}': [{}] {}",
                skipped.path, skipped.placeholder, skipped.message
            ));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ClusterSummary {
    pub(super) algorithm: &'static str,
    pub(super) import: ImportSummary,
    pub(super) clusters: usize,
    pub(super) noise: usize,
    pub(super) labels: Vec<LabelSummary>,
    pub(super) compositions: Vec<CompositionSummary>,
    pub(super) artifacts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LabelSummary {
    pub(super) source: String,
    pub(super) label: isize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CompositionSummary {
    pub(super) rule: String,
    pub(super) categories: Vec<String>,
    pub(super) counts: Vec<Vec<usize>>,
    pub(super) noise: Vec<usize>,
}

impl CompositionSummary {
    pub(super) fn new(rule: &CategoryRule, table: &CompositionTable) -> Self {
        Self {
            rule: rule_label(rule),
            categories: table.categories.clone(),
            counts: table.counts.clone(),
            noise: table.noise.clone(),
        }
    }
}

impl ClusterSummary {
    pub(super) fn render_human(&self) -> String {
        let mut lines = vec![
            self.import.render_human(),
            format!(
                "{}: {} clusters, {} noise records",
                self.algorithm, self.clusters, self.noise
            ),
        ];
        for composition in &self.compositions {
            lines.push(format!("Composition by {}:", composition.rule));
            lines.push(format!(
                "  Cluster No. | {}",
                composition.categories.join(" | ")
            ));
            for (cluster, counts) in composition.counts.iter().enumerate() {
                lines.push(format!("  {} | {}", cluster, join_counts(counts)));
            }
            if composition.noise.iter().any(|count| *count > 0) {
                lines.push(format!("  noise | {}", join_counts(&composition.noise)));
            }
        }
        for artifact in &self.artifacts {
            lines.push(format!("Wrote {}", artifact));
        }
        lines.join("\n")
    }
}

fn join_counts(counts: &[usize]) -> String {
    counts
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(" | ")
}

pub(super) fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).context("failed to serialize command summary")?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{category_rules, load_effective_config, rule_label};
    use space_core::common::config::SavingOptions;
    use space_core::modules::composition::{CategoryRule, TaxonomyDepth};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn rules_follow_saving_options() {
        let saving = SavingOptions {
            save: true,
            by_type: true,
            by_class: false,
            by_subclass: true,
        };
        assert_eq!(
            category_rules(&saving, Some("Type")),
            vec![
                CategoryRule::FilenameTaxonomy(TaxonomyDepth::Type),
                CategoryRule::FilenameTaxonomy(TaxonomyDepth::Subclass),
                CategoryRule::Metadata("Type".to_string()),
            ]
        );
        assert_eq!(category_rules(&saving, Some("  ")).len(), 2);
        assert_eq!(rule_label(&CategoryRule::Metadata("Type".to_string())), "metadata 'Type'");
    }

    #[test]
    fn explicit_config_errors_are_reported_by_kind() {
        let temp = TempDir::new().expect("tempdir should be created");
        let broken = temp.path().join("space.json");
        fs::write(&broken, "{ not json").expect("config should be written");

        let error = load_effective_config(Some(&broken)).expect_err("invalid json");
        assert_eq!(error.as_space_error().placeholder(), "INPUT.CONFIG_PARSE");

        let error = load_effective_config(Some(&temp.path().join("missing.json")))
            .expect_err("missing file");
        assert_eq!(error.as_space_error().exit_code(), 3);
    }
}
