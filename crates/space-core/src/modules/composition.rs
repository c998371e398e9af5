//! Per-cluster category counts.
//!
//! Noise rows (label `-1`) never land in a numbered cluster; they are counted
//! per category in a separate noise row.

use crate::clustering::NOISE_LABEL;
use crate::common::constants::{NONE_SPECIFIED, TAXONOMY_SEPARATOR};
use crate::domain::{Batch, SpaceError, SpaceResult, SpectralRecord};

/// How many leading file name tokens form the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyDepth {
    Type,
    Class,
    Subclass,
}

impl TaxonomyDepth {
    pub const ALL: [Self; 3] = [Self::Type, Self::Class, Self::Subclass];

    pub const fn tokens(self) -> usize {
        match self {
            Self::Type => 1,
            Self::Class => 2,
            Self::Subclass => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Class => "class",
            Self::Subclass => "subclass",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRule {
    /// Leading `.`-separated tokens of the source file name.
    FilenameTaxonomy(TaxonomyDepth),
    /// Upper-cased value of the named metadata descriptor.
    Metadata(String),
}

impl CategoryRule {
    pub fn category_of(&self, record: &SpectralRecord) -> String {
        match self {
            Self::FilenameTaxonomy(depth) => {
                let file_name = record.file_name();
                file_name
                    .split(TAXONOMY_SEPARATOR)
                    .take(depth.tokens())
                    .collect::<Vec<_>>()
                    .join(".")
            }
            Self::Metadata(descriptor) => record
                .metadata
                .get(descriptor)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_uppercase)
                .unwrap_or_else(|| NONE_SPECIFIED.to_string()),
        }
    }

    /// Suffix used in artifact names.
    pub fn file_tag(&self) -> &'static str {
        match self {
            Self::FilenameTaxonomy(depth) => depth.as_str(),
            Self::Metadata(_) => "metadata",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionTable {
    /// Column order is the order categories were first seen in the batch.
    pub categories: Vec<String>,
    /// `counts[cluster][category]`
    pub counts: Vec<Vec<usize>>,
    pub noise: Vec<usize>,
}

impl CompositionTable {
    pub fn cluster_count(&self) -> usize {
        self.counts.len()
    }

    /// Records assigned to numbered clusters.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn noise_total(&self) -> usize {
        self.noise.iter().sum()
    }

    pub fn has_noise(&self) -> bool {
        self.noise_total() > 0
    }

    pub fn count(&self, cluster: usize, category: &str) -> usize {
        self.categories
            .iter()
            .position(|name| name == category)
            .and_then(|col| self.counts.get(cluster).map(|row| row[col]))
            .unwrap_or(0)
    }
}

/// Tabulates categories per cluster.
///
/// `labels` follow batch order. `min_clusters` keeps rows for clusters that got
/// no members, e.g. a k-means center nobody was assigned to.
pub fn compose(
    batch: &Batch,
    labels: &[isize],
    rule: &CategoryRule,
    min_clusters: usize,
) -> SpaceResult<CompositionTable> {
    if labels.len() != batch.len() {
        return Err(SpaceError::invalid_input(
            "INPUT.COMPOSITION_LABELS",
            format!(
                "{} cluster labels for {} records",
                labels.len(),
                batch.len()
            ),
        ));
    }
    if let Some(label) = labels.iter().find(|label| **label < NOISE_LABEL) {
        return Err(SpaceError::invalid_input(
            "INPUT.COMPOSITION_LABELS",
            format!("cluster label {} is neither a cluster nor noise", label),
        ));
    }

    let cluster_rows = labels
        .iter()
        .copied()
        .filter(|label| *label >= 0)
        .max()
        .map_or(0, |max| max as usize + 1)
        .max(min_clusters);

    let mut table = CompositionTable {
        categories: Vec::new(),
        counts: vec![Vec::new(); cluster_rows],
        noise: Vec::new(),
    };

    for (record, label) in batch.iter().zip(labels) {
        let category = rule.category_of(record);
        let col = match table.categories.iter().position(|name| *name == category) {
            Some(col) => col,
            None => {
                table.categories.push(category);
                for row in &mut table.counts {
                    row.push(0);
                }
                table.noise.push(0);
                table.categories.len() - 1
            }
        };

        if *label == NOISE_LABEL {
            table.noise[col] += 1;
        } else {
            table.counts[*label as usize][col] += 1;
        }
    }

    tracing::debug!(
        clusters = table.cluster_count(),
        categories = table.categories.len(),
        noise = table.noise_total(),
        rule = rule.file_tag(),
        "computed cluster composition"
    );
    Ok(table)
}
