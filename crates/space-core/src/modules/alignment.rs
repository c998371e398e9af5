//! Resampling every record onto the wavelength axis of the densest record.

use crate::domain::{Batch, PipelineResult, Sample, SpaceError, SpectralRecord};
use crate::numerics::LinearInterpolator;

/// The shared wavelength axis records are aligned to.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceAxis {
    /// Position of the record the axis was taken from.
    pub record_index: usize,
    pub wavelengths: Vec<f64>,
}

impl ReferenceAxis {
    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }
}

/// The record with the most samples; the first one wins a tie.
pub fn select_reference_axis(batch: &Batch) -> PipelineResult<ReferenceAxis> {
    batch.ensure_processable()?;

    let mut best_index = 0;
    for (index, record) in batch.iter().enumerate().skip(1) {
        if record.sample_count() > batch.records()[best_index].sample_count() {
            best_index = index;
        }
    }

    let reference = &batch.records()[best_index];
    let mut wavelengths: Vec<f64> = reference.wavelengths().collect();
    wavelengths.sort_by(f64::total_cmp);
    wavelengths.dedup();

    Ok(ReferenceAxis {
        record_index: best_index,
        wavelengths,
    })
}

/// Resamples one record onto `axis`.
///
/// Values at wavelengths the record already has are kept bit-for-bit; missing
/// ones are linearly interpolated from the record's own bracketing samples.
/// Wavelengths outside the record's extent take the nearest edge value.
pub fn align_record(
    record: &SpectralRecord,
    axis: &ReferenceAxis,
) -> PipelineResult<SpectralRecord> {
    let mut own = record.samples.clone();
    own.sort_by(|lhs, rhs| lhs.wavelength.total_cmp(&rhs.wavelength));
    own.dedup_by(|later, earlier| later.wavelength == earlier.wavelength);
    let grid: Vec<f64> = own.iter().map(|sample| sample.wavelength).collect();
    let values: Vec<f64> = own.iter().map(|sample| sample.value).collect();

    let interpolator = LinearInterpolator::new(&grid, &values).map_err(|source| {
        SpaceError::invalid_input(
            "INPUT.ALIGNMENT_SAMPLES",
            format!("record '{}' cannot be resampled: {}", record, source),
        )
    })?;

    let mut clamped_points = 0_usize;
    let mut samples = Vec::with_capacity(axis.len());
    for wavelength in axis.wavelengths.iter().copied() {
        let interpolated = interpolator.evaluate(wavelength).map_err(|source| {
            SpaceError::invalid_input(
                "INPUT.ALIGNMENT_AXIS",
                format!("reference wavelength {} is unusable: {}", wavelength, source),
            )
        })?;
        if interpolated.clamped {
            clamped_points += 1;
        }
        samples.push(Sample::new(wavelength, interpolated.value));
    }

    if clamped_points > 0 {
        tracing::debug!(
            source = %record,
            clamped_points,
            "reference wavelengths outside record extent took edge values"
        );
    }

    Ok(SpectralRecord {
        samples,
        ..record.clone()
    })
}

/// Aligns the whole batch; every output record has exactly the axis wavelengths.
pub fn align_batch(batch: &Batch) -> PipelineResult<(Batch, ReferenceAxis)> {
    let axis = select_reference_axis(batch)?;
    tracing::info!(
        reference = %batch.records()[axis.record_index],
        points = axis.len(),
        "aligning {} records to reference axis",
        batch.len()
    );

    let aligned = batch
        .iter()
        .map(|record| align_record(record, &axis))
        .collect::<PipelineResult<Batch>>()?;
    verify_alignment(&aligned, &axis)?;
    Ok((aligned, axis))
}

/// Postcondition of alignment: every record's keys equal the axis, in order.
pub fn verify_alignment(batch: &Batch, axis: &ReferenceAxis) -> PipelineResult<()> {
    for record in batch {
        if record.sample_count() != axis.len() {
            return Err(SpaceError::alignment_invariant(
                "SYS.ALIGNMENT_SAMPLE_COUNT",
                format!(
                    "record '{}' has {} samples after alignment, reference axis has {}",
                    record,
                    record.sample_count(),
                    axis.len()
                ),
            ));
        }
        if !record.wavelengths().eq(axis.wavelengths.iter().copied()) {
            return Err(SpaceError::alignment_invariant(
                "SYS.ALIGNMENT_AXIS_MISMATCH",
                format!("record '{}' wavelengths differ from the reference axis", record),
            ));
        }
    }
    Ok(())
}
