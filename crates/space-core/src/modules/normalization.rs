//! Normalization strategies and the read-only table that names them.
//!
//! Linear scaling works per record on the batch before assembly. PCA works on
//! the assembled matrix and replaces the wavelength columns with components.

use crate::domain::{Batch, PipelineResult, Sample, SpaceError, SpaceResult, SpectralRecord};
use crate::modules::matrix::{ColumnAxis, SpectralMatrix};
use crate::numerics::DenseMatrix;

pub const PROJECTION_DIMENSIONS: [usize; 2] = [2, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizationKind {
    Linear,
    Pca,
}

/// Where in the pipeline a strategy runs.
#[derive(Clone, Copy)]
pub enum NormalizationStage {
    Batch(fn(&Batch) -> SpaceResult<Batch>),
    /// Second argument is the requested number of output columns.
    Matrix(fn(&SpectralMatrix, usize) -> SpaceResult<SpectralMatrix>),
}

impl std::fmt::Debug for NormalizationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Batch(_) => f.write_str("Batch"),
            Self::Matrix(_) => f.write_str("Matrix"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NormalizationStrategy {
    pub kind: NormalizationKind,
    pub label: &'static str,
    pub stage: NormalizationStage,
}

pub static NORMALIZATION_STRATEGIES: &[NormalizationStrategy] = &[
    NormalizationStrategy {
        kind: NormalizationKind::Linear,
        label: "Linear",
        stage: NormalizationStage::Batch(linear_normalize),
    },
    NormalizationStrategy {
        kind: NormalizationKind::Pca,
        label: "PCA",
        stage: NormalizationStage::Matrix(pca_reduce),
    },
];

impl NormalizationStrategy {
    pub fn apply_to_batch(&self, batch: &Batch) -> PipelineResult<Batch> {
        match self.stage {
            NormalizationStage::Batch(stage) => stage(batch),
            NormalizationStage::Matrix(_) => Err(self.wrong_stage("batch")),
        }
    }

    pub fn apply_to_matrix(
        &self,
        matrix: &SpectralMatrix,
        components: usize,
    ) -> PipelineResult<SpectralMatrix> {
        match self.stage {
            NormalizationStage::Matrix(stage) => stage(matrix, components),
            NormalizationStage::Batch(_) => Err(self.wrong_stage("matrix")),
        }
    }

    fn wrong_stage(&self, target: &str) -> SpaceError {
        SpaceError::invalid_input(
            "INPUT.NORMALIZATION_STAGE",
            format!("{} normalization cannot be applied to a {}", self.label, target),
        )
    }
}

impl NormalizationKind {
    pub fn strategy(self) -> &'static NormalizationStrategy {
        match self {
            Self::Linear => &NORMALIZATION_STRATEGIES[0],
            Self::Pca => &NORMALIZATION_STRATEGIES[1],
        }
    }

    pub fn label(self) -> &'static str {
        self.strategy().label
    }
}

/// Case-insensitive lookup by display label.
pub fn lookup_normalization(label: &str) -> Option<&'static NormalizationStrategy> {
    NORMALIZATION_STRATEGIES
        .iter()
        .find(|strategy| strategy.label.eq_ignore_ascii_case(label.trim()))
}

/// Min-max scaling of each record's values to `[0, 1]`.
///
/// A record whose values are all equal maps to zeros. Wavelengths are untouched.
pub fn linear_normalize(batch: &Batch) -> PipelineResult<Batch> {
    batch.ensure_processable()?;
    let normalized: Batch = batch.iter().map(normalize_record).collect();
    tracing::info!(records = normalized.len(), "applied linear normalization");
    Ok(normalized)
}

fn normalize_record(record: &SpectralRecord) -> SpectralRecord {
    let (min, max) = record
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
            (min.min(value), max.max(value))
        });
    let span = max - min;

    let samples = record
        .samples
        .iter()
        .map(|sample| {
            let value = if span > 0.0 {
                (sample.value - min) / span
            } else {
                0.0
            };
            Sample::new(sample.wavelength, value)
        })
        .collect();

    SpectralRecord {
        samples,
        ..record.clone()
    }
}

/// Principal component scores of the column-centered matrix.
///
/// Returns `rows x components` with columns `PC1..PCn`, leading component first.
/// Each score column is sign-normalized so its largest-magnitude entry is positive.
pub fn pca_reduce(matrix: &SpectralMatrix, components: usize) -> PipelineResult<SpectralMatrix> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    let limit = rows.min(cols);
    if components == 0 || components > limit {
        return Err(SpaceError::invalid_input(
            "INPUT.PCA_COMPONENTS",
            format!(
                "PCA needs between 1 and {} components for a {}x{} matrix, got {}",
                limit, rows, cols, components
            ),
        ));
    }

    let centered = center_columns(matrix.data());
    let svd = centered.thin_svd().map_err(|error| {
        SpaceError::computation(
            "COMPUTE.PCA_SVD",
            format!("PCA singular value decomposition failed: {:?}", error),
        )
    })?;
    let singular: Vec<f64> = svd.S().column_vector().iter().copied().collect();
    let left = svd.U();

    let mut scores = DenseMatrix::zeros(rows, components);
    for (component, scale) in singular.iter().take(components).enumerate() {
        for row in 0..rows {
            scores[(row, component)] = left[(row, component)] * scale;
        }
    }

    normalize_signs(&mut scores);
    tracing::info!(
        rows,
        from = cols,
        to = components,
        "reduced data block with PCA"
    );
    SpectralMatrix::new(
        scores,
        matrix.row_sources().to_vec(),
        ColumnAxis::Components(components),
    )
}

/// Two or three columns for plotting.
///
/// Matrices that already hold enough principal components are cut to their
/// leading columns instead of being decomposed again. A matrix too small for
/// the requested dimensions is projected onto as many as its shape allows.
pub fn project(matrix: &SpectralMatrix, dims: usize) -> PipelineResult<SpectralMatrix> {
    if !PROJECTION_DIMENSIONS.contains(&dims) {
        return Err(SpaceError::invalid_input(
            "INPUT.PROJECTION_DIMENSIONS",
            format!("projection must have 2 or 3 dimensions, got {}", dims),
        ));
    }

    let limit = matrix.nrows().min(matrix.ncols());
    let dims = if limit > 0 && dims > limit {
        tracing::warn!(
            requested = dims,
            rows = matrix.nrows(),
            cols = matrix.ncols(),
            "projection lowered to {} dimensions",
            limit
        );
        limit
    } else {
        dims
    };

    let reusable = matches!(
        matrix.columns(),
        ColumnAxis::Components(available) if *available >= dims
    );
    if reusable {
        let rows: Vec<Vec<f64>> = (0..matrix.nrows())
            .map(|row| (0..dims).map(|col| matrix.get(row, col)).collect())
            .collect();
        return SpectralMatrix::from_rows(
            &rows,
            matrix.row_sources().to_vec(),
            ColumnAxis::Components(dims),
        );
    }

    pca_reduce(matrix, dims)
}

fn center_columns(data: &DenseMatrix) -> DenseMatrix {
    let rows = data.nrows();
    let cols = data.ncols();
    let mut centered = data.clone();
    for col in 0..cols {
        let mean = (0..rows).map(|row| data[(row, col)]).sum::<f64>() / rows as f64;
        for row in 0..rows {
            centered[(row, col)] -= mean;
        }
    }
    centered
}

fn normalize_signs(scores: &mut DenseMatrix) {
    for col in 0..scores.ncols() {
        let mut pivot = 0.0_f64;
        for row in 0..scores.nrows() {
            if scores[(row, col)].abs() > pivot.abs() {
                pivot = scores[(row, col)];
            }
        }
        if pivot < 0.0 {
            for row in 0..scores.nrows() {
                scores[(row, col)] = -scores[(row, col)];
            }
        }
    }
}
