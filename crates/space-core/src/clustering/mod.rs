//! The boundary to the clustering algorithms.
//!
//! The pipeline only needs a label per matrix row and, for centroid methods,
//! the centers. The models here adapt `linfa-clustering`; anything
//! implementing [`ClusterModel`] can be plugged in.

pub mod dbscan;
pub mod kmeans;

pub use dbscan::Dbscan;
pub use kmeans::KMeans;

use crate::domain::{SpaceError, SpaceResult};
use crate::modules::matrix::SpectralMatrix;
use ndarray::Array2;

/// Label of a row that belongs to no cluster.
pub const NOISE_LABEL: isize = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterFit {
    /// One label per matrix row, in row order.
    pub labels: Vec<isize>,
    pub centers: Option<Vec<Vec<f64>>>,
}

impl ClusterFit {
    /// Number of distinct non-noise clusters.
    pub fn cluster_count(&self) -> usize {
        let from_labels = self
            .labels
            .iter()
            .copied()
            .filter(|label| *label >= 0)
            .max()
            .map_or(0, |max| max as usize + 1);
        let from_centers = self.centers.as_ref().map_or(0, Vec::len);
        from_labels.max(from_centers)
    }

    pub fn noise_count(&self) -> usize {
        self.labels
            .iter()
            .filter(|label| **label == NOISE_LABEL)
            .count()
    }
}

pub trait ClusterModel {
    /// Short name used in logs and artifact file names.
    fn name(&self) -> &'static str;

    fn fit(&self, matrix: &SpectralMatrix) -> SpaceResult<ClusterFit>;
}

fn ensure_rows(matrix: &SpectralMatrix, algorithm: &str) -> SpaceResult<()> {
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return Err(SpaceError::empty_input(
            "INPUT.EMPTY_MATRIX",
            format!(
                "{} needs a non-empty data block, got {}x{}",
                algorithm,
                matrix.nrows(),
                matrix.ncols()
            ),
        ));
    }
    Ok(())
}

fn to_records(matrix: &SpectralMatrix) -> Array2<f64> {
    Array2::from_shape_fn((matrix.nrows(), matrix.ncols()), |(row, col)| {
        matrix.get(row, col)
    })
}

/// Renumbers clusters in the order of the first row carrying them.
///
/// Returns the labels and, for each new label, the cluster id it replaced.
/// Ids below `cluster_count` that no row carries are appended to the order.
fn relabel_by_first_row(raw: &[Option<usize>], cluster_count: usize) -> (Vec<isize>, Vec<usize>) {
    let mut order: Vec<usize> = Vec::new();
    let labels = raw
        .iter()
        .map(|label| match label {
            Some(id) => {
                let position = match order.iter().position(|seen| seen == id) {
                    Some(position) => position,
                    None => {
                        order.push(*id);
                        order.len() - 1
                    }
                };
                position as isize
            }
            None => NOISE_LABEL,
        })
        .collect();
    for id in 0..cluster_count {
        if !order.contains(&id) {
            order.push(id);
        }
    }
    (labels, order)
}
