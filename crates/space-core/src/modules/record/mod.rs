//! Spectral library text file to [`SpectralRecord`].
//!
//! Files carry a `descriptor: value` header block followed by
//! `wavelength<TAB>value` lines. The first line holding a tab starts the
//! numeric section.

mod header;

use crate::common::constants::{
    DESCRIPTION_DESCRIPTOR, PAIR_SEPARATOR, X_UNITS_DESCRIPTOR, Y_UNITS_DESCRIPTOR,
};
use crate::domain::{
    AxisLabels, ParserResult, RecordMetadata, Sample, SpaceError, SpectralRecord,
};
use header::HeaderLine;
use std::fs;
use std::path::{Path, PathBuf};

pub fn parse_record_file(path: impl AsRef<Path>) -> ParserResult<SpectralRecord> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        SpaceError::io_system(
            "IO.RECORD_READ",
            format!("failed to read spectrum file '{}': {}", path.display(), source),
        )
    })?;
    parse_record(&String::from_utf8_lossy(&bytes), path)
}

pub fn parse_record(
    source: &str,
    source_identity: impl Into<PathBuf>,
) -> ParserResult<SpectralRecord> {
    let source_identity = source_identity.into();
    let lines: Vec<(usize, &str)> = source
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let pair_index = lines
        .iter()
        .position(|(_, line)| line.contains(PAIR_SEPARATOR))
        .ok_or_else(|| {
            SpaceError::parse(
                "INPUT.PARSE_NO_PAIRS",
                format!(
                    "numerical coordinate pairs could not be found for '{}'",
                    source_identity.display()
                ),
            )
        })?;

    let header_lines: Vec<HeaderLine> = lines[..pair_index]
        .iter()
        .map(|(source_line, raw)| HeaderLine::parse(*source_line, raw))
        .collect();
    let metadata = build_metadata(&header_lines, &source_identity);
    let axis_labels = axis_labels(&metadata, &source_identity)?;
    let samples = lines[pair_index..]
        .iter()
        .map(|(source_line, raw)| parse_pair(*source_line, raw, &source_identity))
        .collect::<ParserResult<Vec<_>>>()?;

    tracing::debug!(
        source = %source_identity.display(),
        descriptors = metadata.len(),
        samples = samples.len(),
        "parsed spectrum file"
    );

    Ok(SpectralRecord::new(
        metadata,
        axis_labels,
        samples,
        source_identity,
    ))
}

fn build_metadata(header_lines: &[HeaderLine], source_identity: &Path) -> RecordMetadata {
    let description_line = header_lines
        .iter()
        .position(|line| line.descriptor == DESCRIPTION_DESCRIPTOR);

    let mut metadata = RecordMetadata::default();
    for (index, line) in header_lines.iter().enumerate() {
        if line.descriptor.is_empty() && line.value.is_empty() && !line.has_overflow() {
            continue;
        }

        if Some(index) == description_line {
            metadata.insert(line.descriptor.clone(), line.merged_value());
            continue;
        }

        if line.has_overflow() {
            tracing::debug!(
                source = %source_identity.display(),
                line = line.source_line,
                descriptor = %line.descriptor,
                "dropping overflow fragments outside the description field"
            );
        }
        metadata.insert(line.descriptor.clone(), line.value.clone());
    }

    metadata
}

fn axis_labels(metadata: &RecordMetadata, source_identity: &Path) -> ParserResult<AxisLabels> {
    let lookup = |descriptor: &str| {
        metadata
            .get(descriptor)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                SpaceError::parse(
                    "INPUT.PARSE_MISSING_AXIS_UNITS",
                    format!(
                        "header of '{}' has no '{}' descriptor naming a numeric column",
                        source_identity.display(),
                        descriptor
                    ),
                )
            })
    };

    Ok(AxisLabels {
        wavelength: lookup(X_UNITS_DESCRIPTOR)?,
        value: lookup(Y_UNITS_DESCRIPTOR)?,
    })
}

fn parse_pair(source_line: usize, raw: &str, source_identity: &Path) -> ParserResult<Sample> {
    let tokens: Vec<&str> = raw
        .split(PAIR_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    let [wavelength, value] = tokens.as_slice() else {
        return Err(SpaceError::parse(
            "INPUT.PARSE_MALFORMED_PAIR",
            format!(
                "expected 'wavelength<TAB>value' at line {} of '{}', got '{}'",
                source_line,
                source_identity.display(),
                raw.trim()
            ),
        ));
    };

    Ok(Sample::new(
        parse_number(wavelength, source_line, source_identity)?,
        parse_number(value, source_line, source_identity)?,
    ))
}

fn parse_number(token: &str, source_line: usize, source_identity: &Path) -> ParserResult<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            SpaceError::parse(
                "INPUT.PARSE_NON_NUMERIC",
                format!(
                    "non-numeric value '{}' at line {} of '{}'",
                    token,
                    source_line,
                    source_identity.display()
                ),
            )
        })
}

#[cfg(test)]
pub(crate) const SAMPLE_SPECTRUM: &str = "Name: Quercus robur\n\
Type: Vegetation\n\
Class: Tree\n\
Genus: Quercus\n\
Species: robur\n\
Sample No.: VH001\n\
Owner: JPL\n\
Wavelength Range: TIR\n\
Origin: Field\n\
Collection Date: 2014\n\
Description: Green leaf: adaxial surface: wet\n\
Measurement: Directional hemispherical reflectance\n\
First Column: X\n\
Second Column: Y\n\
X Units: Wavelength (micrometers)\n\
Y Units: Reflectance (percent)\n\
First X Value: 2.5\n\
Last X Value: 15.0\n\
Number of X Values: 4\n\
Additional Information: none\n\
\n\
2.5\t4.10\n\
5.0\t4.20\n\
10.0\t4.80\n\
15.0\t5.00\n";

#[cfg(test)]
mod tests {
    use super::{SAMPLE_SPECTRUM, parse_record, parse_record_file};
    use crate::domain::{Sample, SpaceErrorKind};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_metadata_axis_labels_and_pairs() {
        let record = parse_record(
            SAMPLE_SPECTRUM,
            "vegetation.tree.quercus.robur.tir.vh001.spectrum.txt",
        )
        .expect("record should parse");

        assert_eq!(record.metadata.get("Name"), Some("Quercus robur"));
        assert_eq!(record.metadata.get("Type"), Some("Vegetation"));
        assert_eq!(record.metadata.len(), 20);
        assert_eq!(record.axis_labels.wavelength, "Wavelength (micrometers)");
        assert_eq!(record.axis_labels.value, "Reflectance (percent)");
        assert_eq!(
            record.samples,
            vec![
                Sample::new(2.5, 4.10),
                Sample::new(5.0, 4.20),
                Sample::new(10.0, 4.80),
                Sample::new(15.0, 5.00),
            ]
        );
        assert_eq!(
            record.file_name(),
            "vegetation.tree.quercus.robur.tir.vh001.spectrum.txt"
        );
    }

    #[test]
    fn description_overflow_is_merged_into_one_value() {
        let record = parse_record(SAMPLE_SPECTRUM, "a.txt").expect("record should parse");
        assert_eq!(
            record.metadata.get("Description"),
            Some("Green leaf: adaxial surface: wet")
        );
    }

    #[test]
    fn overflow_outside_description_is_dropped() {
        let source =
            "Collection Date: 12: 30\nX Units: Wavelength\nY Units: Reflectance\n1.0\t2.0\n";
        let record = parse_record(source, "a.txt").expect("record should parse");
        assert_eq!(record.metadata.get("Collection Date"), Some("12"));
    }

    #[test]
    fn pairs_keep_file_order() {
        let source = "X Units: W\nY Units: R\n3.0\t1.0\n1.0\t2.0\r\n2.0\t3.0\n";
        let record = parse_record(source, "a.txt").expect("record should parse");
        let wavelengths: Vec<f64> = record.wavelengths().collect();
        assert_eq!(wavelengths, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn missing_numeric_section_is_a_parse_error() {
        let source = "Name: Empty\nX Units: W\nY Units: R\n";
        let error = parse_record(source, "empty.spectrum.txt").expect_err("no pairs");
        assert_eq!(error.kind(), SpaceErrorKind::Parse);
        assert_eq!(error.placeholder(), "INPUT.PARSE_NO_PAIRS");
        assert!(error.message().contains("empty.spectrum.txt"));
    }

    #[test]
    fn non_numeric_pair_is_a_parse_error() {
        let source = "X Units: W\nY Units: R\n1.0\t2.0\n2.0\tn/a\n";
        let error = parse_record(source, "a.txt").expect_err("non-numeric value");
        assert_eq!(error.kind(), SpaceErrorKind::Parse);
        assert_eq!(error.placeholder(), "INPUT.PARSE_NON_NUMERIC");
        assert!(error.message().contains("line 4"));

        let source = "X Units: W\nY Units: R\n1.0\t2.0\ntrailing text\n";
        let error = parse_record(source, "a.txt").expect_err("line without tab");
        assert_eq!(error.placeholder(), "INPUT.PARSE_MALFORMED_PAIR");
    }

    #[test]
    fn missing_axis_units_is_reported_by_name() {
        let source = "Name: Oak\nX Units: W\n1.0\t2.0\n";
        let error = parse_record(source, "a.txt").expect_err("missing Y Units");
        assert_eq!(error.placeholder(), "INPUT.PARSE_MISSING_AXIS_UNITS");
        assert!(error.message().contains("Y Units"));
    }

    #[test]
    fn file_reader_keeps_path_as_source_identity() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("rock.igneous.basalt.tir.nicolet.spectrum.txt");
        fs::write(&path, SAMPLE_SPECTRUM).expect("fixture should be written");

        let record = parse_record_file(&path).expect("record should parse");
        assert_eq!(record.source_identity, path);

        let error = parse_record_file(temp.path().join("missing.txt")).expect_err("missing file");
        assert_eq!(error.kind(), SpaceErrorKind::Io);
    }
}
