use super::{ClusterFit, ClusterModel, ensure_rows, relabel_by_first_row, to_records};
use crate::domain::{SpaceError, SpaceResult};
use crate::modules::matrix::SpectralMatrix;
use linfa::DatasetBase;
use linfa::traits::{Fit, Predict};

pub const DEFAULT_MAX_ITERATIONS: usize = 300;
pub const DEFAULT_TOLERANCE: f64 = 1.0e-4;

/// k-means through `linfa-clustering`.
///
/// linfa seeds its k-means++ initialisation from a fixed generator, so the
/// same matrix always yields the same labels. Clusters are numbered by the
/// first row that belongs to them and the centers follow that numbering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    pub k: usize,
    pub max_iterations: usize,
    /// Convergence threshold on the change in inertia between iterations.
    pub tolerance: f64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    fn validate(&self, rows: usize) -> SpaceResult<()> {
        if self.k == 0 || self.k > rows {
            return Err(SpaceError::invalid_input(
                "INPUT.KMEANS_K",
                format!("k-means needs 1 <= k <= {} rows, got k = {}", rows, self.k),
            ));
        }
        if self.max_iterations == 0 {
            return Err(SpaceError::invalid_input(
                "INPUT.KMEANS_ITERATIONS",
                "k-means needs at least one iteration",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(SpaceError::invalid_input(
                "INPUT.KMEANS_TOLERANCE",
                format!("k-means tolerance must be finite and > 0, got {}", self.tolerance),
            ));
        }
        Ok(())
    }
}

impl ClusterModel for KMeans {
    fn name(&self) -> &'static str {
        "kmeans"
    }

    fn fit(&self, matrix: &SpectralMatrix) -> SpaceResult<ClusterFit> {
        ensure_rows(matrix, "k-means")?;
        self.validate(matrix.nrows())?;

        let records = to_records(matrix);
        let dataset = DatasetBase::from(records.clone());
        let model = linfa_clustering::KMeans::params(self.k)
            .max_n_iterations(self.max_iterations as u64)
            .tolerance(self.tolerance)
            .fit(&dataset)
            .map_err(|error| {
                SpaceError::computation("COMPUTE.KMEANS", format!("k-means failed: {}", error))
            })?;

        let assigned: Vec<Option<usize>> = model
            .predict(&records)
            .iter()
            .map(|cluster| Some(*cluster))
            .collect();
        let (labels, order) = relabel_by_first_row(&assigned, self.k);
        let centroids = model.centroids();
        let centers = order
            .iter()
            .map(|cluster| centroids.row(*cluster).to_vec())
            .collect();

        tracing::debug!(k = self.k, rows = matrix.nrows(), "k-means converged");
        Ok(ClusterFit {
            labels,
            centers: Some(centers),
        })
    }
}
