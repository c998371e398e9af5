//! The import run: discover, parse, reconcile, align, normalize, assemble.
//!
//! Every stage consumes the previous stage's output in full. A failing stage
//! returns its error and nothing downstream runs.

use crate::common::config::{ParsePolicy, SpaceConfig};
use crate::domain::{Batch, PipelineResult, SpaceError, SpaceErrorKind, WavelengthRange};
use crate::modules::alignment::{ReferenceAxis, align_batch};
use crate::modules::files::discover_input_files;
use crate::modules::matrix::{SpectralMatrix, assemble_matrix};
use crate::modules::normalization::NormalizationKind;
use crate::modules::range::reconcile_ranges;
use crate::modules::record::parse_record_file;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub parse_policy: ParsePolicy,
    /// Linear min-max scaling of every record after alignment.
    pub normalize: bool,
    /// Reduce the data block to this many principal components.
    pub pca_components: Option<usize>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from_config(&SpaceConfig::default())
    }
}

impl ImportOptions {
    pub fn from_config(config: &SpaceConfig) -> Self {
        Self {
            parse_policy: config.parse_policy,
            normalize: config.normalize_by_default,
            pca_components: config
                .pca_by_default
                .then_some(config.default_pca_dimensions),
        }
    }
}

/// A file the import left out under [`ParsePolicy::SkipFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: SpaceError,
}

/// The aligned batch of one import run and how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedBatch {
    pub batch: Batch,
    pub common_range: WavelengthRange,
    pub reference_axis: ReferenceAxis,
    pub skipped: Vec<SkippedFile>,
    pub normalized: bool,
}

/// Parses `paths` in order.
///
/// Under `AbortBatch` the first failure ends the run. Under `SkipFile` parse
/// and read failures are logged and collected; an empty result is still an error.
pub fn parse_files(
    paths: &[PathBuf],
    policy: ParsePolicy,
) -> PipelineResult<(Batch, Vec<SkippedFile>)> {
    let mut records = Vec::with_capacity(paths.len());
    let mut skipped = Vec::new();

    for path in paths {
        match parse_record_file(path) {
            Ok(record) => records.push(record),
            Err(error) if policy == ParsePolicy::SkipFile && is_per_file(&error) => {
                tracing::warn!(
                    path = %path.display(),
                    placeholder = error.placeholder(),
                    "skipping file: {}",
                    error.message()
                );
                skipped.push(SkippedFile {
                    path: path.clone(),
                    error,
                });
            }
            Err(error) => return Err(error),
        }
    }

    if records.is_empty() {
        return Err(SpaceError::empty_input(
            "INPUT.EMPTY_BATCH",
            format!(
                "none of the {} input files could be parsed",
                paths.len()
            ),
        ));
    }

    tracing::info!(
        parsed = records.len(),
        skipped = skipped.len(),
        "parsed input files"
    );
    Ok((Batch::new(records), skipped))
}

fn is_per_file(error: &SpaceError) -> bool {
    matches!(error.kind(), SpaceErrorKind::Parse | SpaceErrorKind::Io)
}

/// Reconciliation, alignment and optional linear normalization of a parsed batch.
pub fn prepare_batch(
    batch: &Batch,
    normalize: bool,
) -> PipelineResult<(Batch, WavelengthRange, ReferenceAxis)> {
    let (truncated, common_range) = reconcile_ranges(batch)?;
    let (aligned, reference_axis) = align_batch(&truncated)?;
    let prepared = if normalize {
        NormalizationKind::Linear
            .strategy()
            .apply_to_batch(&aligned)?
    } else {
        aligned
    };
    Ok((prepared, common_range, reference_axis))
}

pub fn import_batch(
    folder: impl AsRef<Path>,
    options: &ImportOptions,
) -> PipelineResult<ImportedBatch> {
    let files = discover_input_files(folder)?;
    let (parsed, skipped) = parse_files(&files, options.parse_policy)?;
    let (batch, common_range, reference_axis) = prepare_batch(&parsed, options.normalize)?;

    Ok(ImportedBatch {
        batch,
        common_range,
        reference_axis,
        skipped,
        normalized: options.normalize,
    })
}

/// The data block handed to clustering.
///
/// A PCA request larger than the matrix allows is lowered to `min(rows, cols)`.
pub fn build_matrix(
    imported: &ImportedBatch,
    pca_components: Option<usize>,
) -> PipelineResult<SpectralMatrix> {
    let matrix = assemble_matrix(&imported.batch)?;
    let Some(requested) = pca_components else {
        return Ok(matrix);
    };

    let limit = matrix.nrows().min(matrix.ncols());
    let components = if requested > limit {
        tracing::warn!(
            requested,
            limit,
            "PCA dimensions exceed the data block; using {}",
            limit
        );
        limit
    } else {
        requested
    };
    NormalizationKind::Pca
        .strategy()
        .apply_to_matrix(&matrix, components)
}

#[cfg(test)]
mod tests {
    use super::{ImportOptions, build_matrix, import_batch, parse_files};
    use crate::common::config::{ParsePolicy, SpaceConfig};
    use crate::domain::SpaceErrorKind;
    use crate::modules::matrix::ColumnAxis;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn spectrum(name: &str, pairs: &[(f64, f64)]) -> String {
        let mut text = format!(
            "Name: {name}\nType: Vegetation\n\
             X Units: Wavelength (micrometers)\nY Units: Reflectance (percent)\n\n"
        );
        for (wavelength, value) in pairs {
            text.push_str(&format!("{wavelength}\t{value}\n"));
        }
        text
    }

    fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent directory should be created");
        }
        fs::write(&path, content).expect("fixture should be written");
        path
    }

    fn library(root: &Path) {
        write_file(
            root,
            "veg/vegetation.tree.oak.tir.nicolet.spectrum.txt",
            &spectrum("oak", &[(1.0, 1.0), (4.0, 4.0), (8.0, 8.0), (10.0, 10.0)]),
        );
        write_file(
            root,
            "veg/vegetation.grass.rye.tir.nicolet.spectrum.txt",
            &spectrum(
                "rye",
                &[
                    (3.0, 2.0),
                    (5.0, 2.0),
                    (6.0, 3.0),
                    (7.0, 4.0),
                    (9.0, 5.0),
                    (12.0, 6.0),
                ],
            ),
        );
        write_file(
            root,
            "rock/rock.igneous.basalt.tir.nicolet.spectrum.txt",
            &spectrum("basalt", &[(2.0, 7.0), (5.0, 3.0), (9.0, 0.0)]),
        );
    }

    fn options(policy: ParsePolicy) -> ImportOptions {
        ImportOptions {
            parse_policy: policy,
            normalize: false,
            pca_components: None,
        }
    }

    #[test]
    fn import_reconciles_and_aligns_every_record() {
        let temp = TempDir::new().expect("tempdir should be created");
        library(temp.path());

        let imported =
            import_batch(temp.path(), &options(ParsePolicy::AbortBatch)).expect("import");
        assert_eq!(imported.batch.len(), 3);
        assert_eq!(imported.common_range.min, 3.0);
        assert_eq!(imported.common_range.max, 9.0);
        assert_eq!(imported.reference_axis.wavelengths, vec![3.0, 5.0, 6.0, 7.0, 9.0]);
        assert!(imported.skipped.is_empty());

        let matrix = build_matrix(&imported, None).expect("matrix");
        assert_eq!(matrix.nrows(), 3);
        assert_eq!(matrix.ncols(), 5);
        assert_eq!(
            matrix.row_sources(),
            &[
                temp.path().join("rock/rock.igneous.basalt.tir.nicolet.spectrum.txt"),
                temp.path().join("veg/vegetation.grass.rye.tir.nicolet.spectrum.txt"),
                temp.path().join("veg/vegetation.tree.oak.tir.nicolet.spectrum.txt"),
            ]
        );
    }

    #[test]
    fn malformed_file_aborts_the_batch_by_default() {
        let temp = TempDir::new().expect("tempdir should be created");
        library(temp.path());
        write_file(
            temp.path(),
            "veg/vegetation.tree.ash.tir.nicolet.spectrum.txt",
            "Name: ash\nX Units: W\nY Units: R\n1.0 2.0\n",
        );

        let error = import_batch(temp.path(), &options(ParsePolicy::AbortBatch))
            .expect_err("file without tab pairs");
        assert_eq!(error.kind(), SpaceErrorKind::Parse);
        assert_eq!(error.placeholder(), "INPUT.PARSE_NO_PAIRS");
        assert!(error.message().contains("vegetation.tree.ash"));
    }

    #[test]
    fn skip_policy_records_bad_files_and_continues() {
        let temp = TempDir::new().expect("tempdir should be created");
        library(temp.path());
        let bad = write_file(
            temp.path(),
            "veg/vegetation.tree.ash.tir.nicolet.spectrum.txt",
            "Name: ash\n",
        );

        let imported = import_batch(temp.path(), &options(ParsePolicy::SkipFile)).expect("import");
        assert_eq!(imported.batch.len(), 3);
        assert_eq!(imported.skipped.len(), 1);
        assert_eq!(imported.skipped[0].path, bad);
        assert_eq!(imported.skipped[0].error.kind(), SpaceErrorKind::Parse);

        let error = parse_files(&[bad], ParsePolicy::SkipFile).expect_err("nothing parsed");
        assert_eq!(error.kind(), SpaceErrorKind::EmptyInput);
    }

    #[test]
    fn disjoint_library_has_no_common_range() {
        let temp = TempDir::new().expect("tempdir should be created");
        write_file(
            temp.path(),
            "a.tir.nicolet.spectrum.txt",
            &spectrum("a", &[(1.0, 1.0), (2.0, 1.0)]),
        );
        write_file(
            temp.path(),
            "b.tir.nicolet.spectrum.txt",
            &spectrum("b", &[(3.0, 1.0), (4.0, 1.0)]),
        );

        let error = import_batch(temp.path(), &options(ParsePolicy::AbortBatch))
            .expect_err("ranges are disjoint");
        assert_eq!(error.kind(), SpaceErrorKind::NoCommonRange);
    }

    #[test]
    fn normalization_and_pca_follow_the_options() {
        let temp = TempDir::new().expect("tempdir should be created");
        library(temp.path());

        let imported = import_batch(
            temp.path(),
            &ImportOptions {
                parse_policy: ParsePolicy::AbortBatch,
                normalize: true,
                pca_components: None,
            },
        )
        .expect("import");
        assert!(imported.normalized);
        for record in &imported.batch {
            let max = record.values().fold(f64::NEG_INFINITY, f64::max);
            let min = record.values().fold(f64::INFINITY, f64::min);
            assert_eq!(min, 0.0);
            assert_eq!(max, 1.0);
        }

        let reduced = build_matrix(&imported, Some(8)).expect("pca clamps to the block");
        assert_eq!(reduced.columns(), &ColumnAxis::Components(3));
        assert_eq!(reduced.nrows(), 3);
    }

    #[test]
    fn options_default_to_the_configuration() {
        let options = ImportOptions::default();
        assert_eq!(options.parse_policy, ParsePolicy::AbortBatch);
        assert!(!options.normalize);
        assert_eq!(options.pca_components, Some(8));

        let config = SpaceConfig {
            pca_by_default: false,
            ..SpaceConfig::default()
        };
        assert_eq!(ImportOptions::from_config(&config).pca_components, None);
    }
}
