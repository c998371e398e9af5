pub mod errors;

pub use errors::{
    ParserResult, PipelineResult, SpaceError, SpaceErrorCategory, SpaceErrorKind, SpaceResult,
};

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub wavelength: f64,
    pub value: f64,
}

impl Sample {
    pub const fn new(wavelength: f64, value: f64) -> Self {
        Self { wavelength, value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub descriptor: String,
    pub value: String,
}

/// Header descriptors in file order, one entry per distinct descriptor name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordMetadata {
    entries: Vec<MetadataEntry>,
}

impl RecordMetadata {
    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, descriptor: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.descriptor == descriptor)
            .map(|entry| entry.value.as_str())
    }

    /// Inserts a descriptor, merging into an existing entry of the same name.
    pub fn insert(&mut self, descriptor: impl Into<String>, value: impl Into<String>) {
        let descriptor = descriptor.into();
        let value = value.into();

        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|entry| entry.descriptor == descriptor)
        {
            if value.is_empty() {
                return;
            }
            if existing.value.is_empty() {
                existing.value = value;
            } else {
                existing.value.push_str("; ");
                existing.value.push_str(&value);
            }
            return;
        }

        self.entries.push(MetadataEntry { descriptor, value });
    }
}

/// Header labels of the two numeric columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisLabels {
    pub wavelength: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpectralRecord {
    pub metadata: RecordMetadata,
    pub axis_labels: AxisLabels,
    pub samples: Vec<Sample>,
    pub source_identity: PathBuf,
}

impl SpectralRecord {
    pub fn new(
        metadata: RecordMetadata,
        axis_labels: AxisLabels,
        samples: Vec<Sample>,
        source_identity: impl Into<PathBuf>,
    ) -> Self {
        Self {
            metadata,
            axis_labels,
            samples,
            source_identity: source_identity.into(),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn wavelengths(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|sample| sample.wavelength)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|sample| sample.value)
    }

    /// Smallest and largest wavelength, independent of sample order.
    pub fn wavelength_extent(&self) -> Option<WavelengthRange> {
        let mut samples = self.samples.iter();
        let first = samples.next()?;
        let (min, max) = samples.fold((first.wavelength, first.wavelength), |(min, max), sample| {
            (min.min(sample.wavelength), max.max(sample.wavelength))
        });
        Some(WavelengthRange { min, max })
    }

    /// File name component of the source path, falling back to the full path.
    pub fn file_name(&self) -> String {
        self.source_identity
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_identity.to_string_lossy().into_owned())
    }
}

impl Display for SpectralRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source_identity.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthRange {
    pub min: f64,
    pub max: f64,
}

impl WavelengthRange {
    pub fn contains(&self, wavelength: f64) -> bool {
        self.min <= wavelength && wavelength <= self.max
    }
}

impl Display for WavelengthRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.min, self.max)
    }
}

/// The records of one import run, in import order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    records: Vec<SpectralRecord>,
}

impl Batch {
    pub fn new(records: Vec<SpectralRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SpectralRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<SpectralRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpectralRecord> {
        self.records.iter()
    }

    /// Batch-level stages need at least one record and one sample per record.
    pub fn ensure_processable(&self) -> SpaceResult<()> {
        if self.records.is_empty() {
            return Err(SpaceError::empty_input(
                "INPUT.EMPTY_BATCH",
                "batch contains no records",
            ));
        }

        if let Some(record) = self.records.iter().find(|record| record.samples.is_empty()) {
            return Err(SpaceError::invalid_input(
                "INPUT.EMPTY_RECORD",
                format!("record '{}' has no samples", record),
            ));
        }

        Ok(())
    }
}

impl FromIterator<SpectralRecord> for Batch {
    fn from_iter<T: IntoIterator<Item = SpectralRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a SpectralRecord;
    type IntoIter = std::slice::Iter<'a, SpectralRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
pub(crate) fn test_record(name: &str, samples: &[(f64, f64)]) -> SpectralRecord {
    let mut metadata = RecordMetadata::default();
    metadata.insert("Name", name);
    SpectralRecord::new(
        metadata,
        AxisLabels {
            wavelength: "Wavelength (micrometers)".to_string(),
            value: "Reflectance (percent)".to_string(),
        },
        samples
            .iter()
            .map(|(wavelength, value)| Sample::new(*wavelength, *value))
            .collect(),
        name,
    )
}
