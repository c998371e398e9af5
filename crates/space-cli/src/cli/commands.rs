use super::CliError;
use super::helpers::*;
use space_core::clustering::{ClusterModel, Dbscan, KMeans};
use space_core::common::config::{ParsePolicy, SavingOptions, SpaceConfig};
use space_core::modules::composition::compose;
use space_core::modules::export::{
    DATA_BLOCK_FILE_NAME, composition_artifact_name, projection_artifact_name,
    render_composition_csv, render_data_block_csv, render_projection_csv,
    write_record_artifacts, write_text_artifact,
};
use space_core::modules::matrix::{ColumnAxis, SpectralMatrix};
use space_core::modules::normalization::project;
use space_core::modules::pipeline::{ImportOptions, ImportedBatch, build_matrix, import_batch};
use space_core::modules::record::parse_record_file;
use std::path::{Path, PathBuf};

#[derive(clap::Args)]
pub(super) struct ImportFlags {
    /// Folder searched recursively for spectrum files
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// JSON configuration file (defaults to ./space.json when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory receiving CSV artifacts
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Min-max normalize every record after alignment
    #[arg(long)]
    normalize: bool,

    /// Keep the wavelength columns instead of reducing with PCA
    #[arg(long, conflicts_with = "pca_dimensions")]
    no_pca: bool,

    /// Number of principal components kept in the data block
    #[arg(long)]
    pca_dimensions: Option<usize>,

    /// Skip files that fail to parse instead of aborting the import
    #[arg(long)]
    skip_bad_files: bool,

    /// Print a JSON summary instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct ImportArgs {
    #[command(flatten)]
    import: ImportFlags,
}

#[derive(clap::Args)]
pub(super) struct InspectArgs {
    /// Spectrum file to parse
    file: PathBuf,

    /// Print a JSON summary instead of text
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct ClusterFlags {
    /// Metadata descriptor used for an extra composition table
    #[arg(long)]
    descriptor: Option<String>,

    /// Dimensions of the projection written for plotting
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(2..=3))]
    projection_dims: u8,
}

#[derive(clap::Args)]
pub(super) struct KmeansArgs {
    #[command(flatten)]
    import: ImportFlags,

    #[command(flatten)]
    cluster: ClusterFlags,

    /// Number of clusters
    #[arg(long, short = 'k')]
    k: Option<usize>,

    /// Iteration cap for each k-means run
    #[arg(long)]
    max_iterations: Option<usize>,
}

#[derive(clap::Args)]
pub(super) struct DbscanArgs {
    #[command(flatten)]
    import: ImportFlags,

    #[command(flatten)]
    cluster: ClusterFlags,

    /// Neighborhood radius
    #[arg(long)]
    eps: Option<f64>,

    /// Rows within eps (self included) that make a core row
    #[arg(long)]
    min_pts: Option<usize>,
}

struct PreparedRun {
    config: SpaceConfig,
    imported: ImportedBatch,
    matrix: SpectralMatrix,
    output: Option<PathBuf>,
    json: bool,
}

impl ImportFlags {
    fn options(&self, config: &SpaceConfig) -> ImportOptions {
        let mut options = ImportOptions::from_config(config);
        if self.normalize {
            options.normalize = true;
        }
        if self.skip_bad_files {
            options.parse_policy = ParsePolicy::SkipFile;
        }
        if self.no_pca {
            options.pca_components = None;
        } else if let Some(dimensions) = self.pca_dimensions {
            options.pca_components = Some(dimensions);
        }
        options
    }

    fn prepare(self) -> Result<PreparedRun, CliError> {
        let config = load_effective_config(self.config.as_deref())?;
        let options = self.options(&config);
        tracing::info!(
            input = %self.input.display(),
            normalize = options.normalize,
            pca = ?options.pca_components,
            "starting import"
        );

        let imported = import_batch(&self.input, &options)?;
        let matrix = build_matrix(&imported, options.pca_components)?;
        Ok(PreparedRun {
            config,
            imported,
            matrix,
            output: self.output,
            json: self.json,
        })
    }
}

fn column_kind(matrix: &SpectralMatrix) -> &'static str {
    match matrix.columns() {
        ColumnAxis::Wavelengths(_) => "wavelengths",
        ColumnAxis::Components(_) => "principal components",
    }
}

fn import_summary(run: &PreparedRun) -> ImportSummary {
    ImportSummary::new(
        &run.imported,
        run.matrix.nrows(),
        run.matrix.ncols(),
        column_kind(&run.matrix),
    )
}

pub(super) fn run_import_command(args: ImportArgs) -> Result<i32, CliError> {
    let run = args.import.prepare()?;

    if let Some(output) = &run.output {
        ensure_output_dir(output)?;
        let written = write_record_artifacts(output, &run.imported.batch)?;
        write_text_artifact(
            &output.join(DATA_BLOCK_FILE_NAME),
            &render_data_block_csv(&run.matrix)?,
        )?;
        tracing::info!(
            records = written.len(),
            output = %output.display(),
            "wrote import artifacts"
        );
    }

    let summary = import_summary(&run);
    if run.json {
        print_json(&summary)?;
    } else {
        println!("{}", summary.render_human());
    }
    Ok(0)
}

pub(super) fn run_inspect_command(args: InspectArgs) -> Result<i32, CliError> {
    let record = parse_record_file(&args.file)?;

    if args.json {
        let metadata = record
            .metadata
            .entries()
            .iter()
            .map(|entry| (entry.descriptor.clone(), serde_json::Value::from(entry.value.clone())))
            .collect::<serde_json::Map<_, _>>();
        let extent = record.wavelength_extent();
        let summary = serde_json::json!({
            "source": record.source_identity.display().to_string(),
            "metadata": metadata,
            "wavelengthLabel": record.axis_labels.wavelength,
            "valueLabel": record.axis_labels.value,
            "samples": record.sample_count(),
            "wavelengthRange": extent.map(|range| [range.min, range.max]),
        });
        print_json(&summary)?;
        return Ok(0);
    }

    println!("Source: {}", record.source_identity.display());
    for entry in record.metadata.entries() {
        println!("{}: {}", entry.descriptor, entry.value);
    }
    println!(
        "Columns: {} / {}",
        record.axis_labels.wavelength, record.axis_labels.value
    );
    match record.wavelength_extent() {
        Some(range) => println!("Samples: {} ({})", record.sample_count(), range),
        None => println!("Samples: 0"),
    }
    Ok(0)
}

pub(super) fn run_kmeans_command(args: KmeansArgs) -> Result<i32, CliError> {
    let run = args.import.prepare()?;
    let mut model = KMeans::new(args.k.unwrap_or(run.config.default_kmeans_k));
    if let Some(max_iterations) = args.max_iterations {
        model.max_iterations = max_iterations;
    }
    let saving = run.config.kmeans_saving;
    run_cluster_command(run, &model, &args.cluster, saving)
}

pub(super) fn run_dbscan_command(args: DbscanArgs) -> Result<i32, CliError> {
    let run = args.import.prepare()?;
    let model = Dbscan::new(
        args.eps.unwrap_or(run.config.default_dbscan_eps),
        args.min_pts.unwrap_or(run.config.default_dbscan_min_pts),
    );
    let saving = run.config.dbscan_saving;
    run_cluster_command(run, &model, &args.cluster, saving)
}

fn run_cluster_command(
    run: PreparedRun,
    model: &dyn ClusterModel,
    flags: &ClusterFlags,
    saving: SavingOptions,
) -> Result<i32, CliError> {
    let output = run.output.as_deref().filter(|_| saving.save);
    let projection = match output {
        Some(_) => Some(project(&run.matrix, usize::from(flags.projection_dims))?),
        None => None,
    };

    let fit = model.fit(&run.matrix)?;
    tracing::info!(
        algorithm = model.name(),
        clusters = fit.cluster_count(),
        noise = fit.noise_count(),
        "clustering finished"
    );

    let descriptor = flags
        .descriptor
        .as_deref()
        .or(run.config.metadata_category.as_deref());
    let min_clusters = fit.centers.as_ref().map_or(0, Vec::len);
    let mut compositions = Vec::new();
    for rule in category_rules(&saving, descriptor) {
        let table = compose(&run.imported.batch, &fit.labels, &rule, min_clusters)?;
        compositions.push((rule, table));
    }

    let mut artifacts = Vec::new();
    if let Some(output) = output {
        ensure_output_dir(output)?;
        for (rule, table) in &compositions {
            let path = output.join(composition_artifact_name(model.name(), rule));
            write_text_artifact(&path, &render_composition_csv(table)?)?;
            artifacts.push(path);
        }

        if let Some(projection) = &projection {
            let path = output.join(projection_artifact_name(model.name()));
            write_text_artifact(&path, &render_projection_csv(projection, &fit.labels)?)?;
            artifacts.push(path);
        }
    }

    let summary = ClusterSummary {
        algorithm: model.name(),
        import: import_summary(&run),
        clusters: fit.cluster_count(),
        noise: fit.noise_count(),
        labels: run
            .imported
            .batch
            .iter()
            .zip(&fit.labels)
            .map(|(record, label)| LabelSummary {
                source: record.file_name(),
                label: *label,
            })
            .collect(),
        compositions: compositions
            .iter()
            .map(|(rule, table)| CompositionSummary::new(rule, table))
            .collect(),
        artifacts: artifacts.iter().map(|path| display_path(path)).collect(),
    };

    if run.json {
        print_json(&summary)?;
    } else {
        println!("{}", summary.render_human());
    }
    Ok(0)
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
