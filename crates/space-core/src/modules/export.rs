//! CSV artifacts derived from a batch, its data block and cluster results.

use crate::domain::{Batch, SpaceError, SpaceResult, SpectralRecord};
use crate::modules::composition::{CategoryRule, CompositionTable};
use crate::modules::matrix::SpectralMatrix;
use csv::{Terminator, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};

pub const DATA_BLOCK_FILE_NAME: &str = "data_block.csv";
pub const COMPOSITION_INDEX_HEADER: &str = "Cluster No.";
pub const NOISE_ROW_LABEL: &str = "noise";

pub fn record_artifact_name(index: usize) -> String {
    format!("record_{index}.csv")
}

pub fn composition_artifact_name(algorithm: &str, rule: &CategoryRule) -> String {
    format!("{}_composition_{}.csv", algorithm, rule.file_tag())
}

pub fn projection_artifact_name(algorithm: &str) -> String {
    format!("{algorithm}_projection.csv")
}

fn csv_failure(source: impl std::fmt::Display) -> SpaceError {
    SpaceError::io_system(
        "IO.CSV_RENDER",
        format!("failed to render CSV table: {}", source),
    )
}

/// Renders rows through a `csv` writer; fields are quoted only when needed.
fn render_table<I>(rows: I) -> SpaceResult<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer.write_record(&row).map_err(csv_failure)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|error| csv_failure(error.error()))?;
    String::from_utf8(bytes).map_err(csv_failure)
}

fn source_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// One record's samples under its own axis labels.
pub fn render_record_csv(record: &SpectralRecord) -> SpaceResult<String> {
    let header = vec![
        record.axis_labels.wavelength.clone(),
        record.axis_labels.value.clone(),
    ];
    let samples = record
        .samples
        .iter()
        .map(|sample| vec![sample.wavelength.to_string(), sample.value.to_string()]);
    render_table(std::iter::once(header).chain(samples))
}

/// The data block with one row per record, keyed by source file name.
pub fn render_data_block_csv(matrix: &SpectralMatrix) -> SpaceResult<String> {
    let header: Vec<String> = std::iter::once("source".to_string())
        .chain(matrix.columns().labels())
        .collect();
    let rows = matrix.row_sources().iter().enumerate().map(|(row, source)| {
        std::iter::once(source_label(source))
            .chain(matrix.row(row).into_iter().map(|value| value.to_string()))
            .collect::<Vec<_>>()
    });
    render_table(std::iter::once(header).chain(rows))
}

pub fn render_composition_csv(table: &CompositionTable) -> SpaceResult<String> {
    let header: Vec<String> = std::iter::once(COMPOSITION_INDEX_HEADER.to_string())
        .chain(table.categories.iter().cloned())
        .collect();
    let clusters = table.counts.iter().enumerate().map(|(cluster, counts)| {
        std::iter::once(cluster.to_string())
            .chain(counts.iter().map(usize::to_string))
            .collect::<Vec<_>>()
    });
    let noise = table.has_noise().then(|| {
        std::iter::once(NOISE_ROW_LABEL.to_string())
            .chain(table.noise.iter().map(usize::to_string))
            .collect::<Vec<_>>()
    });
    render_table(std::iter::once(header).chain(clusters).chain(noise))
}

/// Projected coordinates with the cluster label of each row.
pub fn render_projection_csv(projection: &SpectralMatrix, labels: &[isize]) -> SpaceResult<String> {
    if labels.len() != projection.nrows() {
        return Err(SpaceError::invalid_input(
            "INPUT.PROJECTION_LABELS",
            format!(
                "{} cluster labels for {} projected rows",
                labels.len(),
                projection.nrows()
            ),
        ));
    }

    let header: Vec<String> = ["source", "label", "x", "y", "z"]
        .into_iter()
        .take(2 + projection.ncols())
        .map(str::to_string)
        .collect();
    let rows = projection
        .row_sources()
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(row, (source, label))| {
            [source_label(source), label.to_string()]
                .into_iter()
                .chain(projection.row(row).into_iter().map(|value| value.to_string()))
                .collect::<Vec<_>>()
        });
    render_table(std::iter::once(header).chain(rows))
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

/// Writes `content` with `\n` line endings, creating missing parent directories.
pub fn write_text_artifact(path: &Path, content: &str) -> SpaceResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            SpaceError::io_system(
                "IO.ARTIFACT_DIRECTORY",
                format!(
                    "failed to create artifact directory '{}': {}",
                    parent.display(),
                    source
                ),
            )
        })?;
    }

    fs::write(path, normalize_text_artifact(content)).map_err(|source| {
        SpaceError::io_system(
            "IO.ARTIFACT_WRITE",
            format!("failed to write artifact '{}': {}", path.display(), source),
        )
    })?;
    tracing::debug!(path = %path.display(), "wrote artifact");
    Ok(())
}

/// One `record_<i>.csv` per record, in batch order.
pub fn write_record_artifacts(directory: &Path, batch: &Batch) -> SpaceResult<Vec<PathBuf>> {
    batch
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let path = directory.join(record_artifact_name(index));
            write_text_artifact(&path, &render_record_csv(record)?)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        composition_artifact_name, normalize_text_artifact, projection_artifact_name,
        render_composition_csv, render_data_block_csv, render_projection_csv, render_record_csv,
        write_record_artifacts, write_text_artifact,
    };
    use crate::domain::{Batch, test_record};
    use crate::modules::composition::{CategoryRule, CompositionTable, TaxonomyDepth};
    use crate::modules::matrix::{ColumnAxis, SpectralMatrix};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn record_csv_uses_axis_labels_as_header() {
        let record = test_record("a", &[(2.5, 4.1), (5.0, 4.2)]);
        assert_eq!(
            render_record_csv(&record).expect("csv"),
            "Wavelength (micrometers),Reflectance (percent)\n2.5,4.1\n5,4.2\n"
        );
    }

    #[test]
    fn data_block_rows_are_keyed_by_file_name() {
        let matrix = SpectralMatrix::from_rows(
            &[vec![1.0, 0.5], vec![2.0, 0.25]],
            vec![
                PathBuf::from("lib/rock.tir.spectrum.txt"),
                PathBuf::from("lib/veg.tir.spectrum.txt"),
            ],
            ColumnAxis::Wavelengths(vec![3.0, 4.5]),
        )
        .expect("matrix");
        assert_eq!(
            render_data_block_csv(&matrix).expect("csv"),
            "source,3,4.5\nrock.tir.spectrum.txt,1,0.5\nveg.tir.spectrum.txt,2,0.25\n"
        );
    }

    #[test]
    fn composition_csv_appends_noise_row_only_when_present() {
        let mut table = CompositionTable {
            categories: vec!["rock".to_string(), "vegetation.tree".to_string()],
            counts: vec![vec![2, 0], vec![0, 3]],
            noise: vec![0, 0],
        };
        assert_eq!(
            render_composition_csv(&table).expect("csv"),
            "Cluster No.,rock,vegetation.tree\n0,2,0\n1,0,3\n"
        );

        table.noise = vec![1, 0];
        let with_noise = render_composition_csv(&table).expect("csv");
        assert!(with_noise.ends_with("noise,1,0\n"), "{with_noise}");
    }

    #[test]
    fn projection_csv_carries_labels_and_coordinates() {
        let projection = SpectralMatrix::from_rows(
            &[vec![0.5, -1.0], vec![2.0, 0.0]],
            vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")],
            ColumnAxis::Components(2),
        )
        .expect("projection");
        let csv = render_projection_csv(&projection, &[0, -1]).expect("labels match");
        assert_eq!(csv, "source,label,x,y\na.txt,0,0.5,-1\nb.txt,-1,2,0\n");

        let error = render_projection_csv(&projection, &[0]).expect_err("label count");
        assert_eq!(error.placeholder(), "INPUT.PROJECTION_LABELS");
    }

    #[test]
    fn artifact_names_follow_algorithm_and_rule() {
        assert_eq!(
            composition_artifact_name(
                "kmeans",
                &CategoryRule::FilenameTaxonomy(TaxonomyDepth::Subclass)
            ),
            "kmeans_composition_subclass.csv"
        );
        assert_eq!(
            composition_artifact_name("dbscan", &CategoryRule::Metadata("Type".to_string())),
            "dbscan_composition_metadata.csv"
        );
        assert_eq!(projection_artifact_name("dbscan"), "dbscan_projection.csv");
    }

    #[test]
    fn categories_with_separators_are_quoted() {
        let table = CompositionTable {
            categories: vec!["ROCK, IGNEOUS".to_string(), "say \"hi\"".to_string()],
            counts: vec![vec![1, 2]],
            noise: vec![0, 0],
        };
        assert_eq!(
            render_composition_csv(&table).expect("csv"),
            "Cluster No.,\"ROCK, IGNEOUS\",\"say \"\"hi\"\"\"\n0,1,2\n"
        );
    }

    #[test]
    fn text_artifacts_use_canonical_line_endings() {
        assert_eq!(normalize_text_artifact("alpha\r\nbeta\rgamma"), "alpha\nbeta\ngamma\n");

        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("nested/out.csv");
        write_text_artifact(&path, "a,b\r\n1,2").expect("write should succeed");
        assert_eq!(fs::read(&path).expect("artifact should be readable"), b"a,b\n1,2\n");
    }

    #[test]
    fn record_artifacts_are_numbered_in_batch_order() {
        let temp = TempDir::new().expect("tempdir should be created");
        let batch = Batch::new(vec![
            test_record("a", &[(1.0, 1.0)]),
            test_record("b", &[(1.0, 2.0)]),
        ]);
        let written = write_record_artifacts(temp.path(), &batch).expect("write should succeed");
        assert_eq!(
            written,
            vec![
                temp.path().join("record_0.csv"),
                temp.path().join("record_1.csv")
            ]
        );
        let second = fs::read_to_string(&written[1]).expect("artifact should be readable");
        assert!(second.ends_with("1,2\n"));
    }
}
