//! Stacking aligned records into one rectangular matrix.

use crate::domain::{Batch, PipelineResult, SpaceError};
use crate::numerics::DenseMatrix;
use std::path::PathBuf;

/// What the matrix columns stand for.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnAxis {
    Wavelengths(Vec<f64>),
    /// Principal components, leading component first.
    Components(usize),
}

impl ColumnAxis {
    pub fn len(&self) -> usize {
        match self {
            Self::Wavelengths(wavelengths) => wavelengths.len(),
            Self::Components(count) => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::Wavelengths(wavelengths) => {
                wavelengths.iter().map(|value| value.to_string()).collect()
            }
            Self::Components(count) => (1..=*count).map(|index| format!("PC{index}")).collect(),
        }
    }
}

/// Rows follow batch order and carry the source path of their record.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralMatrix {
    data: DenseMatrix,
    row_sources: Vec<PathBuf>,
    columns: ColumnAxis,
}

impl SpectralMatrix {
    pub fn new(
        data: DenseMatrix,
        row_sources: Vec<PathBuf>,
        columns: ColumnAxis,
    ) -> PipelineResult<Self> {
        if data.nrows() != row_sources.len() || data.ncols() != columns.len() {
            return Err(SpaceError::alignment_invariant(
                "SYS.MATRIX_SHAPE",
                format!(
                    "matrix is {}x{} but has {} row sources and {} columns",
                    data.nrows(),
                    data.ncols(),
                    row_sources.len(),
                    columns.len()
                ),
            ));
        }

        Ok(Self {
            data,
            row_sources,
            columns,
        })
    }

    pub fn from_rows(
        rows: &[Vec<f64>],
        row_sources: Vec<PathBuf>,
        columns: ColumnAxis,
    ) -> PipelineResult<Self> {
        let width = columns.len();
        let mut data = DenseMatrix::zeros(rows.len(), width);
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(SpaceError::alignment_invariant(
                    "SYS.MATRIX_SHAPE",
                    format!(
                        "row {} has {} values, expected {}",
                        row_index,
                        row.len(),
                        width
                    ),
                ));
            }
            for (col, value) in row.iter().copied().enumerate() {
                data[(row_index, col)] = value;
            }
        }
        Self::new(data, row_sources, columns)
    }

    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    pub fn data(&self) -> &DenseMatrix {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    pub fn row(&self, row: usize) -> Vec<f64> {
        (0..self.ncols()).map(|col| self.data[(row, col)]).collect()
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.nrows()).map(|row| self.row(row)).collect()
    }

    pub fn row_sources(&self) -> &[PathBuf] {
        &self.row_sources
    }

    pub fn columns(&self) -> &ColumnAxis {
        &self.columns
    }
}

/// Row `i` is the value column of record `i`.
///
/// Every record must carry the same wavelengths in the same order; anything
/// else means alignment was skipped or broken.
pub fn assemble_matrix(batch: &Batch) -> PipelineResult<SpectralMatrix> {
    batch.ensure_processable()?;

    let first = &batch.records()[0];
    let wavelengths: Vec<f64> = first.wavelengths().collect();
    for record in batch.iter().skip(1) {
        if record.sample_count() != wavelengths.len() {
            return Err(SpaceError::alignment_invariant(
                "SYS.ALIGNMENT_SAMPLE_COUNT",
                format!(
                    "record '{}' has {} samples, '{}' has {}",
                    record,
                    record.sample_count(),
                    first,
                    wavelengths.len()
                ),
            ));
        }
        if !record.wavelengths().eq(wavelengths.iter().copied()) {
            return Err(SpaceError::alignment_invariant(
                "SYS.ALIGNMENT_AXIS_MISMATCH",
                format!("record '{}' is not on the shared wavelength axis", record),
            ));
        }
    }

    let mut data = DenseMatrix::zeros(batch.len(), wavelengths.len());
    for (row, record) in batch.iter().enumerate() {
        for (col, value) in record.values().enumerate() {
            data[(row, col)] = value;
        }
    }

    let row_sources = batch
        .iter()
        .map(|record| record.source_identity.clone())
        .collect();
    tracing::debug!(
        rows = batch.len(),
        cols = wavelengths.len(),
        "assembled data block"
    );
    SpectralMatrix::new(data, row_sources, ColumnAxis::Wavelengths(wavelengths))
}
