//! Common wavelength range of a batch and truncation to it.

use crate::domain::{Batch, PipelineResult, Sample, SpaceError, SpectralRecord, WavelengthRange};

/// Intersection of every record's wavelength extent.
///
/// Fails with `NoCommonRange` when the highest minimum is not below the lowest
/// maximum.
pub fn find_common_range(batch: &Batch) -> PipelineResult<WavelengthRange> {
    batch.ensure_processable()?;

    let mut extents = batch.iter().filter_map(SpectralRecord::wavelength_extent);
    let Some(first) = extents.next() else {
        return Err(SpaceError::empty_input(
            "INPUT.EMPTY_BATCH",
            "batch contains no samples",
        ));
    };
    let common = extents.fold(first, |acc, extent| WavelengthRange {
        min: acc.min.max(extent.min),
        max: acc.max.min(extent.max),
    });

    if common.min >= common.max {
        return Err(SpaceError::no_common_range(format!(
            "records share no wavelength range: highest minimum {} is not below lowest maximum {}",
            common.min, common.max
        )));
    }

    Ok(common)
}

/// Keeps the samples inside `range`, sorted ascending, one per wavelength.
pub fn truncate_record(record: &SpectralRecord, range: WavelengthRange) -> SpectralRecord {
    let mut samples: Vec<Sample> = record
        .samples
        .iter()
        .copied()
        .filter(|sample| range.contains(sample.wavelength))
        .collect();
    samples.sort_by(|lhs, rhs| lhs.wavelength.total_cmp(&rhs.wavelength));
    samples.dedup_by(|later, earlier| later.wavelength == earlier.wavelength);

    SpectralRecord {
        samples,
        ..record.clone()
    }
}

/// Range reconciliation: the truncated batch and the range it was cut to.
///
/// A record whose extent spans the range but has no sample inside it fails the
/// batch with `NoCommonRange`. The input batch is left untouched, including on
/// failure.
pub fn reconcile_ranges(batch: &Batch) -> PipelineResult<(Batch, WavelengthRange)> {
    let range = find_common_range(batch)?;
    tracing::info!(min = range.min, max = range.max, "all files share wavelength range {range}");

    let truncated: Batch = batch
        .iter()
        .map(|record| truncate_record(record, range))
        .collect();
    if let Some(empty) = truncated.iter().find(|record| record.samples.is_empty()) {
        return Err(SpaceError::no_common_range(format!(
            "'{}' has no samples inside the common wavelength range {}",
            empty.source_identity.display(),
            range
        )));
    }
    Ok((truncated, range))
}
