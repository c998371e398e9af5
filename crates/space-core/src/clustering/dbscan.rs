use super::{ClusterFit, ClusterModel, ensure_rows, relabel_by_first_row, to_records};
use crate::domain::{SpaceError, SpaceResult};
use crate::modules::matrix::SpectralMatrix;
use linfa::traits::Transformer;

/// Density-based clustering through `linfa-clustering`.
///
/// A row is a core point when at least `min_points` rows (itself included)
/// lie within `eps` Euclidean distance. Rows reached by no core point are
/// noise. Clusters are numbered by the first row that belongs to them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    pub eps: f64,
    pub min_points: usize,
}

impl Dbscan {
    pub fn new(eps: f64, min_points: usize) -> Self {
        Self { eps, min_points }
    }

    fn validate(&self) -> SpaceResult<()> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(SpaceError::invalid_input(
                "INPUT.DBSCAN_EPS",
                format!("DBSCAN eps must be finite and > 0, got {}", self.eps),
            ));
        }
        if self.min_points < 2 {
            return Err(SpaceError::invalid_input(
                "INPUT.DBSCAN_MIN_POINTS",
                format!("DBSCAN min points must be at least 2, got {}", self.min_points),
            ));
        }
        Ok(())
    }
}

impl ClusterModel for Dbscan {
    fn name(&self) -> &'static str {
        "dbscan"
    }

    fn fit(&self, matrix: &SpectralMatrix) -> SpaceResult<ClusterFit> {
        ensure_rows(matrix, "DBSCAN")?;
        self.validate()?;

        let records = to_records(matrix);
        let memberships = linfa_clustering::Dbscan::params(self.min_points)
            .tolerance(self.eps)
            .transform(&records)
            .map_err(|error| {
                SpaceError::invalid_input("INPUT.DBSCAN_PARAMS", format!("DBSCAN: {}", error))
            })?;

        let assigned: Vec<Option<usize>> = memberships.iter().copied().collect();
        let (labels, _) = relabel_by_first_row(&assigned, 0);
        let fit = ClusterFit {
            labels,
            centers: None,
        };
        tracing::debug!(
            clusters = fit.cluster_count(),
            noise = fit.noise_count(),
            "DBSCAN finished"
        );
        Ok(fit)
    }
}
